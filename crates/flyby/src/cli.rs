//! Command line interface for flyby

use clap::Parser;
use std::fmt;
use std::path::PathBuf;

use crate::campaign::FrameSlice;
use crate::config::{CampaignConfig, PropagatorKind, SamplePolicyKind};
use crate::encounter::EncounterSide;
use crate::physics::integrators::registry::IntegratorRegistry;

/// CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// Configuration file could not be loaded
    ConfigLoad(String),
    /// Invalid integrator name provided
    InvalidIntegrator(String),
    /// Frame selection is not START:END:STEP
    InvalidFrameSlice(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::ConfigLoad(msg) => write!(f, "Failed to load configuration: {msg}"),
            CliError::InvalidIntegrator(msg) => write!(f, "Invalid integrator: {msg}"),
            CliError::InvalidFrameSlice(msg) => write!(f, "Invalid frame selection: {msg}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Flyby - encounter planner for simulated binary-asteroid flybys
#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory; the series directory is created inside it
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Number of encounter samples (overrides config file)
    #[arg(short = 'n', long, value_name = "N")]
    pub steps: Option<usize>,

    /// Sinh warp factor; higher values slow down the closest approach phase
    #[arg(short, long, value_name = "F")]
    pub factor: Option<f64>,

    /// Encounter sampling policy
    #[arg(short, long, value_enum)]
    pub policy: Option<SamplePolicyKind>,

    /// Side of the asteroid the spacecraft passes on
    #[arg(short, long, value_enum)]
    pub side: Option<EncounterSide>,

    /// Integrate numerically with this integrator (e.g., rk4, velocity_verlet)
    #[arg(short = 'i', long, value_name = "NAME")]
    pub integrator: Option<String>,

    /// Frames to emit as START:END:STEP
    #[arg(long, value_name = "START:END:STEP")]
    pub frames: Option<String>,

    /// Skip the trajectory and distance plots
    #[arg(long)]
    pub no_plots: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// List available integrators and exit
    #[arg(long)]
    pub list_integrators: bool,

    /// Write the resolved configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub write_default_config: Option<PathBuf>,
}

/// Handles the --list-integrators flag by printing available integrators and exiting
pub fn handle_list_integrators() {
    let registry = IntegratorRegistry::new().with_standard_integrators();
    println!("Available integrators:");
    for name in registry.list_available() {
        println!("  - {name}");
    }

    let aliases = registry.list_aliases();
    if !aliases.is_empty() {
        println!("\nAliases:");
        for (alias, target) in aliases {
            println!("  - {alias} -> {target}");
        }
    }
}

/// Loads configuration from file or defaults, then applies command-line overrides
pub fn load_and_apply_config(args: &Args) -> Result<CampaignConfig, CliError> {
    let mut config = if let Some(config_path) = &args.config {
        println!("Loading configuration from: {}", config_path.display());
        CampaignConfig::load(Some(config_path.as_path()))
            .map_err(|e| CliError::ConfigLoad(e.to_string()))?
    } else {
        CampaignConfig::load_from_user_config()
    };

    if let Some(output) = &args.output {
        println!("Writing output under: {}", output.display());
        config.output.directory = output.clone();
    }

    if let Some(steps) = args.steps {
        println!("Overriding encounter steps to: {steps}");
        config.encounter.steps = steps;
    }

    if let Some(factor) = args.factor {
        println!("Overriding sinh warp factor to: {factor}");
        config.encounter.factor = factor;
    }

    if let Some(policy) = args.policy {
        println!("Using sampling policy: {policy:?}");
        config.encounter.policy = policy;
    }

    if let Some(side) = args.side {
        println!("Passing on the {side} side");
        config.encounter.side = side;
    }

    if let Some(integrator_type) = &args.integrator {
        // Validate integrator name against registry
        let registry = IntegratorRegistry::new().with_standard_integrators();
        registry
            .create(integrator_type)
            .map_err(CliError::InvalidIntegrator)?;

        println!("Using integrator: {integrator_type}");
        config.propagator.kind = PropagatorKind::Numerical;
        config.propagator.integrator = integrator_type.clone();
    }

    if let Some(frames) = &args.frames {
        let slice: FrameSlice = frames.parse().map_err(CliError::InvalidFrameSlice)?;
        println!("Emitting frames: {slice}");
        config.output.frames = slice;
    }

    if args.no_plots {
        config.output.plots = false;
    }

    Ok(config)
}
