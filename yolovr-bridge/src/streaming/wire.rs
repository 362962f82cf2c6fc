//! Telemetry frame codec.
//!
//! One protobuf `TrackerFrame` per datagram, no length prefix. Decoding is
//! all-or-nothing: a frame is either fully converted or rejected.

use prost::Message as ProstMessage;
use thiserror::Error;

use super::proto;
use crate::core::{
    MAX_OBJECTS_PER_FRAME, Pose, Quaternion, TelemetryFrame, TrackedPose, TrackingResult, Vector3,
};

/// Per-datagram decode failures. Counted and dropped by the receiver.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Frame of {len} bytes exceeds maximum of {max}")]
    Oversized { len: usize, max: usize },

    #[error("Frame carries {0} trackers (max {max})", max = MAX_OBJECTS_PER_FRAME)]
    TooManyObjects(usize),
}

impl From<prost::DecodeError> for DecodeError {
    fn from(e: prost::DecodeError) -> Self {
        DecodeError::Malformed(e.to_string())
    }
}

/// Decode one datagram into a frame.
pub fn decode(bytes: &[u8], max_frame_size: usize) -> Result<TelemetryFrame, DecodeError> {
    if bytes.len() > max_frame_size {
        return Err(DecodeError::Oversized {
            len: bytes.len(),
            max: max_frame_size,
        });
    }

    let msg = proto::TrackerFrame::decode(bytes)?;

    if msg.trackers.len() > MAX_OBJECTS_PER_FRAME {
        return Err(DecodeError::TooManyObjects(msg.trackers.len()));
    }

    let objects = msg
        .trackers
        .iter()
        .map(|t| TrackedPose {
            id: t.tracker_id,
            pose: pose_from_wire(t),
        })
        .collect();

    Ok(TelemetryFrame {
        frame_id: msg.frame_id,
        sender_timestamp: msg.timestamp,
        source_id: msg.source_id,
        system_name: msg.system_name,
        objects,
    })
}

/// Encode a frame into its wire record.
///
/// Entries whose pose is not tracking are sent with `is_tracking = false`.
pub fn encode(frame: &TelemetryFrame) -> Vec<u8> {
    let msg = proto::TrackerFrame {
        frame_id: frame.frame_id,
        timestamp: frame.sender_timestamp,
        source_id: frame.source_id,
        system_name: frame.system_name.clone(),
        trackers: frame
            .objects
            .iter()
            .map(|o| pose_to_wire(o.id, &o.pose, frame.sender_timestamp))
            .collect(),
        ..Default::default()
    };
    msg.encode_to_vec()
}

fn pose_from_wire(t: &proto::TrackerPose) -> Pose {
    let position = t.position.as_ref().map(vec_from_wire).unwrap_or(Vector3::ZERO);
    let rotation = t
        .rotation
        .as_ref()
        .map(|q| Quaternion::new(q.w, q.x, q.y, q.z).normalized())
        .unwrap_or_else(Quaternion::identity);

    let mut pose = if t.is_tracking {
        Pose::new(position, rotation)
    } else {
        Pose::not_tracking(position, rotation)
    };
    pose.velocity = t.velocity.as_ref().map(vec_from_wire);
    pose.angular_velocity = t.angular_velocity.as_ref().map(vec_from_wire);
    pose.confidence = if t.confidence.is_finite() {
        t.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    pose
}

fn pose_to_wire(id: u32, pose: &Pose, timestamp: u64) -> proto::TrackerPose {
    proto::TrackerPose {
        tracker_id: id,
        tracker_name: String::new(),
        position: Some(vec_to_wire(pose.position)),
        rotation: Some(proto::Quaternion {
            x: pose.rotation.x,
            y: pose.rotation.y,
            z: pose.rotation.z,
            w: pose.rotation.w,
        }),
        velocity: pose.velocity.map(vec_to_wire),
        angular_velocity: pose.angular_velocity.map(vec_to_wire),
        confidence: pose.confidence,
        is_tracking: pose.valid && pose.result == TrackingResult::RunningOk,
        timestamp,
    }
}

#[inline]
fn vec_from_wire(v: &proto::Vector3) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

#[inline]
fn vec_to_wire(v: Vector3) -> proto::Vector3 {
    proto::Vector3 {
        x: v.x,
        y: v.y,
        z: v.z,
    }
}
