//! Decoded telemetry frame.

use super::types::Pose;

/// Upper bound on entries in a single frame.
pub const MAX_OBJECTS_PER_FRAME: usize = 32;

/// Pose of one object as reported in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPose {
    pub id: u32,
    pub pose: Pose,
}

/// One decoded snapshot of zero or more object poses.
///
/// Sender metadata is kept for diagnostics only. Staleness is always judged
/// against the local arrival time recorded by the frame cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    pub frame_id: u64,
    /// Sender clock, opaque to this side.
    pub sender_timestamp: u64,
    pub source_id: u32,
    pub system_name: String,
    pub objects: Vec<TrackedPose>,
}

impl TelemetryFrame {
    /// Frame carrying only the given objects.
    pub fn with_objects(objects: Vec<TrackedPose>) -> Self {
        Self {
            objects,
            ..Default::default()
        }
    }

    /// First entry with a matching id.
    ///
    /// Frames may list an id more than once; the earliest entry wins.
    pub fn find(&self, id: u32) -> Option<&TrackedPose> {
        self.objects.iter().find(|o| o.id == id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::{Quaternion, Vector3};

    fn entry(id: u32, x: f32) -> TrackedPose {
        TrackedPose {
            id,
            pose: Pose::new(Vector3::new(x, 0.0, 0.0), Quaternion::identity()),
        }
    }

    #[test]
    fn test_find_first_match_wins() {
        let frame = TelemetryFrame::with_objects(vec![entry(1, 1.0), entry(4, 2.0), entry(4, 3.0)]);
        let found = frame.find(4).map(|o| o.pose.position.x);
        assert_eq!(found, Some(2.0));
        assert!(frame.find(7).is_none());
        assert_eq!(frame.len(), 3);
    }

    #[test]
    fn test_empty_frame() {
        let frame = TelemetryFrame::default();
        assert!(frame.is_empty());
        assert!(frame.find(0).is_none());
    }
}
