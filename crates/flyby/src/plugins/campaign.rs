//! Campaign plugin
//!
//! Runs one flyby campaign at startup with the configured sinks, publishes a
//! short summary as a resource and asks the app to exit.

use crate::campaign::{CampaignDriver, CampaignError, CampaignResult, sinks::standard_sinks};
use crate::config::CampaignConfig;
use crate::physics::math::Scalar;
use bevy::prelude::*;

/// What a finished campaign produced
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct CampaignSummary {
    pub series_name: String,
    pub frames: usize,
    pub closest_time: Option<Scalar>,
    pub closest_distance: Option<Scalar>,
}

impl From<&CampaignResult> for CampaignSummary {
    fn from(result: &CampaignResult) -> Self {
        let closest = result.closest_frame();
        Self {
            series_name: result.series_name.clone(),
            frames: result.frames.len(),
            closest_time: closest.map(|frame| frame.time_from_midpoint),
            closest_distance: closest.map(|frame| frame.separation_distance),
        }
    }
}

pub struct CampaignPlugin {
    config: Option<CampaignConfig>,
}

impl CampaignPlugin {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn with_config(config: CampaignConfig) -> Self {
        Self {
            config: Some(config),
        }
    }
}

impl Default for CampaignPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for CampaignPlugin {
    fn build(&self, app: &mut App) {
        let config = self
            .config
            .clone()
            .unwrap_or_else(CampaignConfig::load_from_user_config);

        match toml::to_string_pretty(&config) {
            Ok(toml_string) => {
                debug!("=== Current Configuration (TOML) ===\n{}", toml_string);
                debug!("=== End Configuration ===");
            }
            Err(e) => {
                error!("Failed to serialize configuration to TOML: {}", e);
            }
        }

        app.insert_resource(config);
        app.add_systems(Startup, run_campaign);
    }
}

fn execute(config: &CampaignConfig) -> Result<CampaignResult, CampaignError> {
    let mut sinks = standard_sinks(config)?;
    let mut driver = CampaignDriver::from_config(config)?;
    driver.run(&mut sinks)
}

fn run_campaign(
    mut commands: Commands,
    config: Res<CampaignConfig>,
    mut exit: EventWriter<AppExit>,
) {
    match execute(&config) {
        Ok(result) => {
            let summary = CampaignSummary::from(&result);
            if let (Some(time), Some(distance)) = (summary.closest_time, summary.closest_distance) {
                info!("Closest frame at t = {time:.3} s, {distance:.1} m");
            }
            commands.insert_resource(summary);
            exit.write(AppExit::Success);
        }
        Err(e) => {
            error!("Campaign failed: {}", e);
            exit.write(AppExit::error());
        }
    }
}
