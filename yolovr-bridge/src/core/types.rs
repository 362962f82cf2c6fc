//! Pose types shared by the receiver, resolver and host layers.

use super::math::{Quaternion, Vector3};

/// Tracking result classification reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingResult {
    /// Object is tracked and within the tracked volume.
    #[default]
    RunningOk,
    /// Object is known but not currently tracked.
    OutOfRange,
}

/// 6-DOF pose of a tracked object.
///
/// Produced fresh for every resolve; never mutated after it is handed out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// World position in meters.
    pub position: Vector3,
    /// World orientation (unit quaternion).
    pub rotation: Quaternion,
    /// Linear velocity in m/s, when the source reports one.
    pub velocity: Option<Vector3>,
    /// Angular velocity in rad/s, when the source reports one.
    pub angular_velocity: Option<Vector3>,
    /// Sender confidence in [0, 1].
    pub confidence: f32,
    /// Whether the pose may be used by the host.
    pub valid: bool,
    pub result: TrackingResult,
    pub device_connected: bool,
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vector3::ZERO, Quaternion::identity())
    }
}

impl Pose {
    /// Valid, connected, `RunningOk` pose with no velocity.
    pub fn new(position: Vector3, rotation: Quaternion) -> Self {
        Self {
            position,
            rotation,
            velocity: None,
            angular_velocity: None,
            confidence: 1.0,
            valid: true,
            result: TrackingResult::RunningOk,
            device_connected: true,
        }
    }

    /// Same pose with a linear velocity attached.
    pub fn with_velocity(mut self, velocity: Vector3) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// Pose reported by a sender that currently has no track on the object.
    pub fn not_tracking(position: Vector3, rotation: Quaternion) -> Self {
        Self {
            valid: false,
            result: TrackingResult::OutOfRange,
            ..Self::new(position, rotation)
        }
    }

    /// True if the pose is valid and classified `RunningOk`.
    #[inline]
    pub fn is_tracking(&self) -> bool {
        self.valid && self.result == TrackingResult::RunningOk
    }
}
