//! yolovr-bridge - body tracker telemetry bridge
//!
//! Receives multi-tracker pose frames over UDP and republishes a continuous
//! per-tracker 6-DOF pose stream to a host tracking runtime at a fixed rate.
//! When network data is missing or stale, each tracker falls back to a pose
//! estimated from a reference object (typically the headset) plus a static
//! body offset, so the host never sees a gap.
//!
//! # Architecture
//!
//! ```text
//! UDP datagrams ──► NetworkFrameReceiver ──► FrameCache (latest frame)
//!                                                 │
//!                    ReferencePoseSource ──► ObjectPoseResolver (per tick)
//!                                                 │
//!                          PosePublisher × N ──► DeviceHost::publish_pose
//! ```
//!
//! - [`streaming`]: wire codec, frame cache, UDP receiver
//! - [`pose`]: fallback estimator, resolver, fixed-rate publish loops
//! - [`host`]: host runtime traits and in-crate hosts
//! - [`bridge`]: startup and teardown of the whole pipeline
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use yolovr_bridge::{BridgeConfig, LogHost, StaticReference, TrackerBridge};
//!
//! let config = BridgeConfig::default();
//! let identities = config.identities()?;
//! let mut bridge = TrackerBridge::start(
//!     &config,
//!     identities,
//!     Arc::new(LogHost::new()),
//!     Arc::new(StaticReference::new(config.reference_pose())),
//! )?;
//! // ...
//! bridge.shutdown()?;
//! ```

pub mod bridge;
pub mod config;
pub mod core;
pub mod error;
pub mod host;
pub mod pose;
pub mod streaming;

pub use bridge::TrackerBridge;
pub use config::BridgeConfig;
pub use crate::core::{
    ObjectIdentity, Pose, Quaternion, TelemetryFrame, TrackedPose, TrackerRole, TrackingResult,
    Vector3, body_trackers,
};
pub use error::{Error, Result};
pub use host::{
    ChannelHost, DeviceHost, LogHost, ObjectHandle, PublishedPose, ReferencePoseSource,
    StaticReference,
};
pub use pose::{ObjectPoseResolver, PosePublisher, PoseSource, ResolvedPose};
pub use streaming::{
    FrameCache, MAX_UDP_PAYLOAD, NetworkFrameReceiver, ReceiverConfig, ReceiverStats,
};
