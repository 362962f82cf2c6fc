//! Per-tick choice between live network pose and the fallback estimate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::estimator;
use crate::core::{ObjectIdentity, Pose};
use crate::host::ReferencePoseSource;
use crate::streaming::FrameCache;

/// Default maximum age of a frame that still counts as live.
pub const DEFAULT_LIVE_WINDOW: Duration = Duration::from_millis(50);

/// Where a resolved pose came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPose {
    pub pose: Pose,
    pub source: PoseSource,
}

/// Resolves poses against the shared cache and the reference source.
///
/// Holds no per-object history; every call is independent. Cheap to clone
/// and shared by all publish loops.
#[derive(Clone)]
pub struct ObjectPoseResolver {
    cache: Arc<FrameCache>,
    reference: Arc<dyn ReferencePoseSource>,
    live_window: Duration,
}

impl ObjectPoseResolver {
    pub fn new(cache: Arc<FrameCache>, reference: Arc<dyn ReferencePoseSource>) -> Self {
        Self {
            cache,
            reference,
            live_window: DEFAULT_LIVE_WINDOW,
        }
    }

    pub fn with_live_window(mut self, live_window: Duration) -> Self {
        self.live_window = live_window;
        self
    }

    pub fn live_window(&self) -> Duration {
        self.live_window
    }

    pub fn resolve(&self, identity: &ObjectIdentity) -> ResolvedPose {
        self.resolve_at(identity, Instant::now())
    }

    /// Resolve as if the current time were `now`.
    pub fn resolve_at(&self, identity: &ObjectIdentity, now: Instant) -> ResolvedPose {
        let live = self
            .cache
            .snapshot_at(now, self.live_window)
            .and_then(|frame| frame.find(identity.id).map(|entry| entry.pose))
            .filter(|pose| pose.valid);

        match live {
            Some(mut pose) => {
                pose.device_connected = true;
                ResolvedPose {
                    pose,
                    source: PoseSource::Live,
                }
            }
            None => {
                let reference = self.reference.reference_pose();
                ResolvedPose {
                    pose: estimator::estimate(&reference, identity.offset),
                    source: PoseSource::Fallback,
                }
            }
        }
    }
}
