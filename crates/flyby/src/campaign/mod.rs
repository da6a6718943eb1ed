//! Encounter campaign: schedules, propagation, pairing and frame hand-off
//!
//! A campaign propagates the asteroid and the spacecraft twice. The baseline
//! pass samples a long linear window for context, the encounter pass samples
//! the short window around closest approach that frames are rendered from.
//! Both bodies are always recorded over the same schedule and paired index by
//! index.

mod frames;
pub mod plots;
pub mod sinks;

pub use frames::{FrameResult, FrameSlice, RecordPair, pair_records};
pub use sinks::{FrameSink, LongOrbitWriter, MetadataWriter, PlotWriter, RenderHandoff};

use crate::config::{CampaignConfig, PropagatorKind};
use crate::encounter::spacecraft_state;
use crate::epoch::ReferenceEpoch;
use crate::geometry::{CameraIntrinsics, GeometryError};
use crate::physics::integrators::registry::IntegratorRegistry;
use crate::physics::math::Scalar;
use crate::physics::orbit::OrbitState;
use crate::propagation::{
    DateDetector, KeplerianPropagator, NumericalPropagator, PropagationError, Propagator,
};
use crate::recorder::{EncounterRecorder, StateRecord};
use crate::sampling::{
    SamplePolicy, SampleSchedule, ScheduleError, TimeWindow, build_schedule_for,
};
use bevy::log::{debug, info};
use std::fmt;

#[derive(Debug)]
pub enum CampaignError {
    Schedule(ScheduleError),
    Propagation(PropagationError),
    Geometry(GeometryError),
    /// The two bodies' records cannot be paired
    RecordMismatch(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Plot(String),
    Config(String),
}

impl fmt::Display for CampaignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampaignError::Schedule(e) => write!(f, "{e}"),
            CampaignError::Propagation(e) => write!(f, "{e}"),
            CampaignError::Geometry(e) => write!(f, "{e}"),
            CampaignError::RecordMismatch(msg) => write!(f, "Record mismatch: {msg}"),
            CampaignError::Io(e) => write!(f, "I/O error: {e}"),
            CampaignError::Json(e) => write!(f, "JSON error: {e}"),
            CampaignError::Plot(msg) => write!(f, "Failed to draw plot: {msg}"),
            CampaignError::Config(msg) => write!(f, "Invalid campaign configuration: {msg}"),
        }
    }
}

impl std::error::Error for CampaignError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CampaignError::Schedule(e) => Some(e),
            CampaignError::Propagation(e) => Some(e),
            CampaignError::Geometry(e) => Some(e),
            CampaignError::Io(e) => Some(e),
            CampaignError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ScheduleError> for CampaignError {
    fn from(e: ScheduleError) -> Self {
        CampaignError::Schedule(e)
    }
}

impl From<PropagationError> for CampaignError {
    fn from(e: PropagationError) -> Self {
        CampaignError::Propagation(e)
    }
}

impl From<GeometryError> for CampaignError {
    fn from(e: GeometryError) -> Self {
        CampaignError::Geometry(e)
    }
}

impl From<std::io::Error> for CampaignError {
    fn from(e: std::io::Error) -> Self {
        CampaignError::Io(e)
    }
}

impl From<serde_json::Error> for CampaignError {
    fn from(e: serde_json::Error) -> Self {
        CampaignError::Json(e)
    }
}

impl From<config::ConfigError> for CampaignError {
    fn from(e: config::ConfigError) -> Self {
        CampaignError::Config(e.to_string())
    }
}

/// Everything a finished campaign produced
#[derive(Debug, Clone)]
pub struct CampaignResult {
    pub series_name: String,
    pub epoch: ReferenceEpoch,
    pub baseline: Vec<RecordPair>,
    pub encounter: Vec<RecordPair>,
    /// Frames selected by the frame slice, in index order
    pub frames: Vec<FrameResult>,
    /// `(seconds from the encounter window start, separation in metres)` per frame
    pub distance_history: Vec<(Scalar, Scalar)>,
}

impl CampaignResult {
    pub fn closest_frame(&self) -> Option<&FrameResult> {
        self.frames
            .iter()
            .min_by(|a, b| a.separation_distance.total_cmp(&b.separation_distance))
    }
}

pub struct CampaignDriver {
    series_name: String,
    epoch: ReferenceEpoch,
    baseline_window: TimeWindow,
    baseline_steps: usize,
    encounter_window: TimeWindow,
    encounter_steps: usize,
    policy: SamplePolicy,
    frames: FrameSlice,
    intrinsics: CameraIntrinsics,
    scene_scale: Scalar,
    asteroid: Box<dyn Propagator>,
    spacecraft: Box<dyn Propagator>,
}

impl CampaignDriver {
    /// Builds both bodies' propagators from the configuration.
    ///
    /// The asteroid follows its configured elements. The spacecraft is placed
    /// relative to the asteroid at closest approach, which is instant zero.
    pub fn from_config(config: &CampaignConfig) -> Result<Self, CampaignError> {
        let mu = config.asteroid.central_body_mu;
        let asteroid_reference = config.asteroid.elements.to_state(mu, 0.0).ok_or_else(|| {
            CampaignError::Propagation(PropagationError::InvalidElements(format!(
                "elements of {} do not describe an elliptic orbit",
                config.asteroid.name
            )))
        })?;

        let spacecraft_reference = spacecraft_state(
            &asteroid_reference,
            config.encounter.side,
            config.encounter.minimum_distance,
            config.encounter.relative_speed,
        )?;

        info!(
            "Spacecraft passes {} m from {} on the {} side, {} m/s slower",
            config.encounter.minimum_distance,
            config.asteroid.name,
            config.encounter.side,
            config.encounter.relative_speed
        );

        let asteroid = build_propagator(config, asteroid_reference)?;
        let spacecraft = build_propagator(config, spacecraft_reference)?;

        Self::with_propagators(config, asteroid, spacecraft)
    }

    /// Uses the given propagators in place of the configured orbits.
    pub fn with_propagators(
        config: &CampaignConfig,
        asteroid: Box<dyn Propagator>,
        spacecraft: Box<dyn Propagator>,
    ) -> Result<Self, CampaignError> {
        let epoch = config.reference_epoch().map_err(|e| {
            CampaignError::Config(format!(
                "closest approach '{}' is not a date: {e}",
                config.encounter.closest_approach
            ))
        })?;

        let intrinsics = config.intrinsics();
        intrinsics.validate()?;

        let scene_scale = config.camera.scene_scale;
        if !scene_scale.is_finite() || scene_scale <= 0.0 {
            return Err(CampaignError::Config(format!(
                "scene scale must be positive, got {scene_scale}"
            )));
        }

        let half_span = config.baseline_half_span();

        Ok(Self {
            series_name: config.series_name(),
            epoch,
            baseline_window: TimeWindow::new(-half_span, half_span)?,
            baseline_steps: config.baseline.steps,
            encounter_window: TimeWindow::centered(0.0, config.encounter.duration)?,
            encounter_steps: config.encounter.steps,
            policy: config.sample_policy(),
            frames: config.output.frames,
            intrinsics,
            scene_scale,
            asteroid,
            spacecraft,
        })
    }

    pub fn series_name(&self) -> &str {
        &self.series_name
    }

    pub fn epoch(&self) -> ReferenceEpoch {
        self.epoch
    }

    /// Long, linearly sampled window around closest approach
    pub fn baseline_schedule(&self) -> Result<SampleSchedule, ScheduleError> {
        build_schedule_for(self.baseline_window, self.baseline_steps, SamplePolicy::Linear)
    }

    /// Short window around closest approach sampled with the configured policy
    pub fn encounter_schedule(&self) -> Result<SampleSchedule, ScheduleError> {
        build_schedule_for(self.encounter_window, self.encounter_steps, self.policy)
    }

    /// Runs the whole campaign, handing every selected frame to each sink.
    ///
    /// Any failure aborts the campaign. Sinks may already have written the
    /// frames before the failing one.
    pub fn run(&mut self, sinks: &mut [Box<dyn FrameSink>]) -> Result<CampaignResult, CampaignError> {
        info!("Starting campaign {}", self.series_name);

        let baseline_schedule = self.baseline_schedule()?;
        let baseline = self.record_both(&baseline_schedule)?;
        info!("Recorded {} baseline pairs", baseline.len());

        let encounter_schedule = self.encounter_schedule()?;
        let encounter = self.record_both(&encounter_schedule)?;
        info!(
            "Recorded {} encounter pairs with {} sampling",
            encounter.len(),
            encounter_schedule.policy()
        );

        let window = encounter_schedule.window();
        let mut frames = Vec::new();

        for index in self.frames.indices(encounter.len()) {
            let pair = &encounter[index];
            let frame = FrameResult::from_pair(pair, window, self.scene_scale, &self.intrinsics)?;
            info!(
                "Frame {} at t = {:.6} s, distance {:.3} m",
                frame.index, frame.time_from_midpoint, frame.separation_distance
            );

            for sink in sinks.iter_mut() {
                sink.write_frame(&frame)?;
            }
            frames.push(frame);
        }

        let distance_history = frames
            .iter()
            .map(|frame| (frame.time_from_start, frame.separation_distance))
            .collect();

        let result = CampaignResult {
            series_name: self.series_name.clone(),
            epoch: self.epoch,
            baseline,
            encounter,
            frames,
            distance_history,
        };

        for sink in sinks.iter_mut() {
            debug!("Finishing {}", sink.name());
            sink.finish(&result)?;
        }

        info!(
            "Campaign {} complete: {} frames",
            self.series_name,
            result.frames.len()
        );

        Ok(result)
    }

    fn record_both(&mut self, schedule: &SampleSchedule) -> Result<Vec<RecordPair>, CampaignError> {
        let asteroid = record(self.asteroid.as_mut(), schedule, "asteroid")?;
        let spacecraft = record(self.spacecraft.as_mut(), schedule, "spacecraft")?;
        pair_records(&asteroid, &spacecraft, schedule.tolerance())
    }
}

/// Propagates over the whole schedule window and returns one record per instant.
pub fn record(
    propagator: &mut dyn Propagator,
    schedule: &SampleSchedule,
    label: &str,
) -> Result<Vec<StateRecord>, CampaignError> {
    let window = schedule.window();
    debug!(
        "Propagating {} with {} over {} instants",
        label,
        propagator.name(),
        schedule.len()
    );

    let recorder = EncounterRecorder::with_capacity(label, schedule.len());
    let mut detector = DateDetector::new(schedule.clone(), recorder);
    propagator.propagate(window.start, window.end, &mut detector)?;

    if !detector.is_exhausted() {
        return Err(CampaignError::RecordMismatch(format!(
            "{label} fired {} of {} scheduled instants",
            detector.fired(),
            schedule.len()
        )));
    }

    Ok(detector.into_handler().into_records())
}

fn build_propagator(
    config: &CampaignConfig,
    reference: OrbitState,
) -> Result<Box<dyn Propagator>, CampaignError> {
    let mu = config.asteroid.central_body_mu;

    match config.propagator.kind {
        PropagatorKind::Keplerian => Ok(Box::new(KeplerianPropagator::new(reference, mu)?)),
        PropagatorKind::Numerical => {
            let registry = IntegratorRegistry::new().with_standard_integrators();
            let integrator = registry
                .create(&config.propagator.integrator)
                .map_err(CampaignError::Config)?;
            Ok(Box::new(NumericalPropagator::new(
                reference,
                mu,
                integrator,
                config.propagator.max_step,
            )?))
        }
    }
}
