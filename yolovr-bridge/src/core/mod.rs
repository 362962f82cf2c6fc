//! Core data types: math primitives, poses, frames and identities.

pub mod frame;
pub mod identity;
pub mod math;
pub mod types;

pub use frame::{MAX_OBJECTS_PER_FRAME, TelemetryFrame, TrackedPose};
pub use identity::{ObjectIdentity, TrackerRole, body_trackers};
pub use math::{Quaternion, Vector3};
pub use types::{Pose, TrackingResult};
