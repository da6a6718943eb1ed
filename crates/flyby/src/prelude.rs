//! Flyby prelude module
//!
//! Re-exports the types most callers need to configure and run a campaign.

// External crate re-exports
pub use bevy::prelude::*;

// Internal re-exports - Config
pub use crate::config::{CampaignConfig, PropagatorKind, SamplePolicyKind};

// Internal re-exports - Math
pub use crate::physics::math::{Instant, Quaternion, Scalar, Vector};
pub use crate::physics::orbit::{KeplerianElements, OrbitState};

// Internal re-exports - Sampling and propagation
pub use crate::propagation::{DateDetector, Propagator};
pub use crate::sampling::{SamplePolicy, SampleSchedule, build_schedule};

// Internal re-exports - Campaign
pub use crate::campaign::{CampaignDriver, FrameResult, FrameSink, FrameSlice};
pub use crate::encounter::EncounterSide;
pub use crate::geometry::{CameraIntrinsics, FieldOfView};
