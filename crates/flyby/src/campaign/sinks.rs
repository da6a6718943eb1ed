//! Consumers of campaign frames: metadata files, render requests and
//! per-series summaries

use super::{CampaignError, CampaignResult, FrameResult, plots};
use crate::config::CampaignConfig;
use crate::epoch::ReferenceEpoch;
use crate::geometry::{CameraIntrinsics, FieldOfView};
use crate::physics::math::{Scalar, format_vector};
use bevy::log::{debug, info};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Digits after the decimal point for vectors in metadata files
const VECTOR_PRECISION: usize = 17;

/// Receives each frame as the campaign produces it
pub trait FrameSink {
    fn name(&self) -> &str;

    fn write_frame(&mut self, frame: &FrameResult) -> Result<(), CampaignError>;

    /// Called once after the last frame with the complete result
    fn finish(&mut self, _result: &CampaignResult) -> Result<(), CampaignError> {
        Ok(())
    }
}

/// Creates the series directory and the sinks enabled in `config.output`.
pub fn standard_sinks(config: &CampaignConfig) -> Result<Vec<Box<dyn FrameSink>>, CampaignError> {
    let directory = config.series_directory();
    fs::create_dir_all(&directory)?;
    info!("Writing series output to {}", directory.display());

    let series = config.series_name();
    let epoch = config
        .reference_epoch()
        .map_err(|e| CampaignError::Config(e.to_string()))?;

    let mut sinks: Vec<Box<dyn FrameSink>> = Vec::new();

    if config.output.metadata {
        sinks.push(Box::new(MetadataWriter::new(
            &directory,
            &series,
            epoch,
            &config.asteroid.name,
            &config.asteroid.spacecraft_name,
        )));
    }
    if config.output.render_requests {
        sinks.push(Box::new(RenderHandoff::new(
            &directory,
            &series,
            epoch,
            config.intrinsics(),
        )));
    }
    if config.output.long_orbit {
        sinks.push(Box::new(LongOrbitWriter::new(&directory, &series)));
    }
    if config.output.plots {
        sinks.push(Box::new(PlotWriter::new(&directory, &series)));
    }

    Ok(sinks)
}

/// Writes `{series}{index}.txt` and `{series}{index}.json` for every frame
pub struct MetadataWriter {
    directory: PathBuf,
    series: String,
    epoch: ReferenceEpoch,
    asteroid_name: String,
    spacecraft_name: String,
}

impl MetadataWriter {
    pub fn new(
        directory: &Path,
        series: &str,
        epoch: ReferenceEpoch,
        asteroid_name: &str,
        spacecraft_name: &str,
    ) -> Self {
        Self {
            directory: directory.to_path_buf(),
            series: series.to_string(),
            epoch,
            asteroid_name: asteroid_name.to_string(),
            spacecraft_name: spacecraft_name.to_string(),
        }
    }

    pub fn text_path(&self, index: usize) -> PathBuf {
        self.directory.join(format!("{}{}.txt", self.series, index))
    }

    pub fn json_path(&self, index: usize) -> PathBuf {
        self.directory.join(format!("{}{}.json", self.series, index))
    }

    /// Text metadata: time, distance, then the three position vectors
    pub fn render_text(&self, frame: &FrameResult) -> String {
        format!(
            "{} time\n{} distance (m)\n{} {} (m)\n{} {} (m)\n{} {} relative\n",
            self.epoch.format(frame.instant),
            frame.separation_distance,
            format_vector(frame.body_a_position, VECTOR_PRECISION),
            self.asteroid_name,
            format_vector(frame.body_b_position, VECTOR_PRECISION),
            self.spacecraft_name,
            format_vector(frame.camera_position, VECTOR_PRECISION),
            self.spacecraft_name,
        )
    }

    pub fn render_json(&self, frame: &FrameResult) -> Value {
        let mut map = Map::new();
        map.insert("time".into(), json!(self.epoch.format(frame.instant)));
        map.insert("time_t".into(), json!(frame.time_from_start));
        map.insert("distance (m)".into(), json!(frame.separation_distance));
        map.insert(
            format!("{} (m)", self.asteroid_name),
            json!(frame.body_a_position.to_array()),
        );
        map.insert(
            format!("{} (m)", self.spacecraft_name),
            json!(frame.body_b_position.to_array()),
        );
        map.insert(
            format!("{} relative", self.spacecraft_name),
            json!(frame.camera_position.to_array()),
        );
        Value::Object(map)
    }
}

impl FrameSink for MetadataWriter {
    fn name(&self) -> &str {
        "metadata"
    }

    fn write_frame(&mut self, frame: &FrameResult) -> Result<(), CampaignError> {
        fs::write(self.text_path(frame.index), self.render_text(frame))?;

        let json = serde_json::to_string_pretty(&self.render_json(frame))?;
        fs::write(self.json_path(frame.index), json)?;

        debug!("Wrote metadata for frame {}", frame.index);
        Ok(())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CameraPose {
    /// Scene units, asteroid at the origin
    pub position: [Scalar; 3],
    /// Quaternion as `[x, y, z, w]`
    pub orientation: [Scalar; 4],
    pub lens: Scalar,
    pub sensor_width: Scalar,
    pub resolution: [u32; 2],
}

/// What the external renderer needs to produce one frame
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub series: String,
    pub frame: usize,
    pub time: String,
    pub camera: CameraPose,
    pub field_of_view: FieldOfView,
    pub output: PathBuf,
}

/// Writes `{series}_render_{index}.json` requests for the renderer
pub struct RenderHandoff {
    directory: PathBuf,
    series: String,
    epoch: ReferenceEpoch,
    intrinsics: CameraIntrinsics,
}

impl RenderHandoff {
    pub fn new(
        directory: &Path,
        series: &str,
        epoch: ReferenceEpoch,
        intrinsics: CameraIntrinsics,
    ) -> Self {
        Self {
            directory: directory.to_path_buf(),
            series: series.to_string(),
            epoch,
            intrinsics,
        }
    }

    pub fn request_path(&self, index: usize) -> PathBuf {
        self.directory
            .join(format!("{}_render_{}.json", self.series, index))
    }

    /// Image the renderer is asked to write for frame `index`
    pub fn image_path(&self, index: usize) -> PathBuf {
        self.directory
            .join(format!("{}_asteroid_{}.exr", self.series, index))
    }

    pub fn request(&self, frame: &FrameResult) -> RenderRequest {
        RenderRequest {
            series: self.series.clone(),
            frame: frame.index,
            time: self.epoch.format(frame.instant),
            camera: CameraPose {
                position: frame.camera_position.to_array(),
                orientation: frame.camera_orientation.to_array(),
                lens: self.intrinsics.lens,
                sensor_width: self.intrinsics.sensor_width,
                resolution: [self.intrinsics.res_x, self.intrinsics.res_y],
            },
            field_of_view: frame.field_of_view,
            output: self.image_path(frame.index),
        }
    }
}

impl FrameSink for RenderHandoff {
    fn name(&self) -> &str {
        "render hand-off"
    }

    fn write_frame(&mut self, frame: &FrameResult) -> Result<(), CampaignError> {
        let request = self.request(frame);
        fs::write(
            self.request_path(frame.index),
            serde_json::to_string_pretty(&request)?,
        )?;
        Ok(())
    }
}

/// Writes the baseline trajectories to `{series}_long_orbit.txt`
///
/// One line per baseline instant: the date, the asteroid position, a comma,
/// then the spacecraft position.
pub struct LongOrbitWriter {
    path: PathBuf,
}

impl LongOrbitWriter {
    pub fn new(directory: &Path, series: &str) -> Self {
        Self {
            path: directory.join(format!("{series}_long_orbit.txt")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSink for LongOrbitWriter {
    fn name(&self) -> &str {
        "long orbit"
    }

    fn write_frame(&mut self, _frame: &FrameResult) -> Result<(), CampaignError> {
        Ok(())
    }

    fn finish(&mut self, result: &CampaignResult) -> Result<(), CampaignError> {
        let mut out = BufWriter::new(fs::File::create(&self.path)?);

        for pair in &result.baseline {
            let a = pair.asteroid.position;
            let b = pair.spacecraft.position;
            writeln!(
                out,
                "{} {} {} {},{} {} {}",
                result.epoch.format(pair.instant()),
                a.x,
                a.y,
                a.z,
                b.x,
                b.y,
                b.z
            )?;
        }

        out.flush()?;
        info!(
            "Wrote {} baseline samples to {}",
            result.baseline.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Draws the trajectory and distance plots once the campaign finishes
pub struct PlotWriter {
    trajectories: PathBuf,
    encounter: PathBuf,
    distance: PathBuf,
}

impl PlotWriter {
    pub fn new(directory: &Path, series: &str) -> Self {
        Self {
            trajectories: directory.join(format!("{series}_trajectories.svg")),
            encounter: directory.join(format!("{series}_encounter.svg")),
            distance: directory.join(format!("{series}_distance.svg")),
        }
    }
}

impl FrameSink for PlotWriter {
    fn name(&self) -> &str {
        "plots"
    }

    fn write_frame(&mut self, _frame: &FrameResult) -> Result<(), CampaignError> {
        Ok(())
    }

    fn finish(&mut self, result: &CampaignResult) -> Result<(), CampaignError> {
        plots::draw_trajectories(&self.trajectories, &result.baseline)?;
        plots::draw_encounter(&self.encounter, &result.frames)?;
        plots::draw_distance_history(&self.distance, &result.distance_history)?;
        info!(
            "Plots saved to {}, {} and {}",
            self.trajectories.display(),
            self.encounter.display(),
            self.distance.display()
        );
        Ok(())
    }
}
