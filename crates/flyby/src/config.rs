//! Campaign configuration
//!
//! Values are layered, later layers winning: built-in defaults, a TOML file,
//! then `FLYBY__SECTION__KEY` environment variables. Command-line overrides
//! are applied on top by [`crate::cli::load_and_apply_config`].

use crate::campaign::FrameSlice;
use crate::encounter::EncounterSide;
use crate::epoch::ReferenceEpoch;
use crate::geometry::CameraIntrinsics;
use crate::physics::math::{ASTRONOMICAL_UNIT, MU_SUN, Scalar, SECONDS_PER_DAY};
use crate::physics::orbit::KeplerianElements;
use crate::sampling::SamplePolicy;
use bevy::prelude::*;
use clap::ValueEnum;
use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use flyby_macros::ConfigDefaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "FLYBY";
const ENV_SEPARATOR: &str = "__";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Resource, ConfigDefaults, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CampaignConfig {
    pub encounter: EncounterConfig,
    pub baseline: BaselineConfig,
    pub camera: CameraConfig,
    pub asteroid: AsteroidConfig,
    pub propagator: PropagatorConfig,
    pub output: OutputConfig,
}

/// Sampling density policy as written in configuration files
#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplePolicyKind {
    #[default]
    Linear,
    #[value(name = "sinh")]
    SinhWarp,
}

#[derive(ConfigDefaults, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EncounterConfig {
    /// Closest approach, TDB, `YYYY-MM-DDTHH:MM:SS`
    #[default("2017-08-15T12:00:00")]
    pub closest_approach: String,

    /// Length of the densely sampled window, seconds
    #[default(2.0 * 60.0)]
    pub duration: Scalar,

    #[default(10)]
    pub steps: usize,

    pub policy: SamplePolicyKind,

    /// Sinh warp concentration; ignored by the linear policy
    #[default(10.0)]
    pub factor: Scalar,

    pub side: EncounterSide,

    /// Spacecraft distance from the asteroid at closest approach, metres
    #[default(3.0e5)]
    pub minimum_distance: Scalar,

    /// How much slower than the asteroid the spacecraft moves, m/s
    #[default(10_000.0)]
    pub relative_speed: Scalar,
}

#[derive(ConfigDefaults, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BaselineConfig {
    /// Half-width of the baseline window around closest approach, days
    #[default(2.0 * 365.0)]
    pub half_span_days: Scalar,

    #[default(2000)]
    pub steps: usize,
}

#[derive(ConfigDefaults, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Focal length, mm
    #[default(230.0)]
    pub lens: Scalar,

    /// Sensor extent along the longer image axis, mm
    #[default(3.45e-3 * 2464.0)]
    pub sensor_width: Scalar,

    #[default(2464)]
    pub resolution_x: u32,

    #[default(2056)]
    pub resolution_y: u32,

    /// Metres per scene unit
    #[default(1000.0)]
    pub scene_scale: Scalar,
}

#[derive(ConfigDefaults, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AsteroidConfig {
    #[default("Didymos")]
    pub name: String,

    #[default("Satellite")]
    pub spacecraft_name: String,

    /// Heliocentric elements at closest approach
    #[default(KeplerianElements {
        semi_major_axis: 1.6444 * ASTRONOMICAL_UNIT,
        eccentricity: 0.3840,
        inclination: 3.408,
        right_ascension_of_ascending_node: 73.20,
        argument_of_periapsis: 319.32,
        mean_anomaly: 21.0,
    })]
    pub elements: KeplerianElements,

    /// Gravitational parameter of the central body, m³/s²
    #[default(MU_SUN)]
    pub central_body_mu: Scalar,
}

#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropagatorKind {
    #[default]
    Keplerian,
    Numerical,
}

#[derive(ConfigDefaults, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PropagatorConfig {
    pub kind: PropagatorKind,

    /// Integrator used by the numerical propagator
    #[default("runge_kutta_fourth_order")]
    pub integrator: String,

    /// Longest integration step, seconds
    #[default(600.0)]
    pub max_step: Scalar,
}

#[derive(ConfigDefaults, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    #[default("data/temp/didymos")]
    pub directory: PathBuf,

    /// Series name before the side and step count are appended
    #[default("didymos_flyby")]
    pub series_base: String,

    pub frames: FrameSlice,

    #[default(true)]
    pub metadata: bool,

    #[default(true)]
    pub render_requests: bool,

    #[default(true)]
    pub long_orbit: bool,

    #[default(true)]
    pub plots: bool,
}

impl CampaignConfig {
    /// Layers a TOML file, when given, and the environment over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a file, falling back to defaults if it cannot be read
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(Some(path)) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config file {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::load_defaults()
            }
        }
    }

    /// Loads the per-user config file if there is one, otherwise the defaults
    pub fn load_from_user_config() -> Self {
        match Self::user_config_path() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load_or_default(&path)
            }
            _ => Self::load_defaults(),
        }
    }

    /// `config.toml` inside the platform config directory for flyby
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "flyby").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    fn load_defaults() -> Self {
        Self::load(None).unwrap_or_else(|e| {
            warn!("Ignoring environment overrides: {}", e);
            Self::default()
        })
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `{base}_{side}{steps}_`, the prefix of every output file
    pub fn series_name(&self) -> String {
        format!(
            "{}_{}{}_",
            self.output.series_base,
            self.encounter.side.series_suffix(),
            self.encounter.steps
        )
    }

    pub fn reference_epoch(&self) -> Result<ReferenceEpoch, chrono::ParseError> {
        self.encounter.closest_approach.parse()
    }

    pub fn sample_policy(&self) -> SamplePolicy {
        match self.encounter.policy {
            SamplePolicyKind::Linear => SamplePolicy::Linear,
            SamplePolicyKind::SinhWarp => SamplePolicy::SinhWarp {
                factor: self.encounter.factor,
            },
        }
    }

    pub fn intrinsics(&self) -> CameraIntrinsics {
        CameraIntrinsics {
            lens: self.camera.lens,
            sensor_width: self.camera.sensor_width,
            res_x: self.camera.resolution_x,
            res_y: self.camera.resolution_y,
        }
    }

    pub fn baseline_half_span(&self) -> Scalar {
        self.baseline.half_span_days * SECONDS_PER_DAY
    }

    /// Directory holding every file of this series
    pub fn series_directory(&self) -> PathBuf {
        self.output.directory.join(self.series_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CampaignConfig::default();
        assert_eq!(config.encounter.steps, 10);
        assert_eq!(config.encounter.duration, 120.0);
        assert_eq!(config.encounter.side, EncounterSide::Terminator);
        assert_eq!(config.baseline.steps, 2000);
        assert!((config.camera.sensor_width - 8.5008).abs() < 1e-12);
        assert_eq!(config.propagator.kind, PropagatorKind::Keplerian);
        assert_eq!(config.output.frames, FrameSlice::default());
    }

    #[test]
    fn test_series_name() {
        let mut config = CampaignConfig::default();
        assert_eq!(config.series_name(), "didymos_flyby_terminator10_");

        config.encounter.side = EncounterSide::DarkSide;
        config.encounter.steps = 50;
        assert_eq!(config.series_name(), "didymos_flyby_darkside50_");
    }

    #[test]
    fn test_sample_policy_mapping() {
        let mut config = CampaignConfig::default();
        assert_eq!(config.sample_policy(), SamplePolicy::Linear);

        config.encounter.policy = SamplePolicyKind::SinhWarp;
        config.encounter.factor = 4.0;
        assert_eq!(config.sample_policy(), SamplePolicy::SinhWarp { factor: 4.0 });
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: CampaignConfig = toml::from_str(
            r#"
            [encounter]
            steps = 25
            policy = "sinh_warp"
            side = "sunny_side"

            [output.frames]
            step = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.encounter.steps, 25);
        assert_eq!(config.encounter.policy, SamplePolicyKind::SinhWarp);
        assert_eq!(config.encounter.side, EncounterSide::SunnySide);
        assert_eq!(config.encounter.factor, 10.0);
        assert_eq!(config.output.frames.step, 5);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_save_and_load_through_layers() {
        let dir = std::env::temp_dir().join(format!("flyby-config-{}", std::process::id()));
        let path = dir.join("campaign.toml");

        let mut config = CampaignConfig::default();
        config.encounter.steps = 42;
        config.camera.lens = 150.0;
        config.output.frames.end = Some(7);
        config.save(&path).unwrap();

        let loaded = CampaignConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.encounter.steps, 42);
        assert_eq!(loaded.camera.lens, 150.0);
        assert_eq!(loaded.output.frames.end, Some(7));
        assert_eq!(loaded.asteroid, config.asteroid);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("flyby-definitely-missing.toml");
        let config = CampaignConfig::load_or_default(&path);
        assert_eq!(config.encounter.steps, CampaignConfig::default().encounter.steps);
    }

    #[test]
    fn test_reference_epoch_parses_default() {
        let epoch = CampaignConfig::default().reference_epoch().unwrap();
        assert_eq!(epoch.to_string(), "2017-08-15T12:00:00.000");
    }
}
