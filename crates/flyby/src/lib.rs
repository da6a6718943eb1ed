//! Flyby library
//!
//! Plans simulated spacecraft flybys of an asteroid: propagates both bodies,
//! samples the encounter, points the camera and hands every frame to the
//! configured sinks. The library is split out from the binary to enable
//! integration testing and benchmarks.

pub mod campaign;
pub mod cli;
pub mod config;
pub mod encounter;
pub mod epoch;
pub mod geometry;
pub mod physics;
pub mod plugins;
pub mod prelude;
pub mod propagation;
pub mod recorder;
pub mod sampling;

// Re-export commonly used items
pub use campaign::{CampaignDriver, CampaignError, CampaignResult, FrameResult};
pub use config::CampaignConfig;
pub use physics::{
    integrators,
    math::{Instant, Scalar, Vector},
};
pub use plugins::campaign::{CampaignPlugin, CampaignSummary};
