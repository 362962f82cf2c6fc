//! Pose resolution and publishing.

pub mod estimator;
pub mod publisher;
pub mod resolver;

pub use estimator::estimate;
pub use publisher::{
    DEFAULT_PUBLISH_PERIOD, PosePublisher, PublisherCounters, PublisherStats, run_publish_loop,
};
pub use resolver::{DEFAULT_LIVE_WINDOW, ObjectPoseResolver, PoseSource, ResolvedPose};
