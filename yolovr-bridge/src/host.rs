//! Host runtime boundary.
//!
//! The bridge talks to the tracking runtime through two capabilities: a
//! [`DeviceHost`] that registers objects and accepts pose updates, and a
//! [`ReferencePoseSource`] that supplies the anchor pose used for fallback.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::core::{ObjectIdentity, Pose, Quaternion, Vector3};
use crate::error::{Error, Result};

/// Host-assigned handle for a registered object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u32);

/// Tracking runtime that owns the registered objects.
pub trait DeviceHost: Send + Sync {
    /// Announce an object. Called once per identity before its publisher starts.
    fn register_object(&self, identity: &ObjectIdentity) -> Result<ObjectHandle>;

    /// Deliver one pose update. Must not block.
    fn publish_pose(&self, handle: ObjectHandle, pose: &Pose);
}

/// Source of the reference (head-mounted) pose.
pub trait ReferencePoseSource: Send + Sync {
    fn reference_pose(&self) -> Pose;
}

/// Reference pose held in memory and updated externally.
#[derive(Debug)]
pub struct StaticReference {
    pose: RwLock<Pose>,
}

impl StaticReference {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose: RwLock::new(pose),
        }
    }

    /// Reference standing at `position` with the given orientation.
    pub fn at(position: Vector3, rotation: Quaternion) -> Self {
        Self::new(Pose::new(position, rotation.normalized()))
    }

    pub fn set(&self, pose: Pose) {
        *self.pose.write() = pose;
    }
}

impl Default for StaticReference {
    fn default() -> Self {
        Self::new(Pose::default())
    }
}

impl ReferencePoseSource for StaticReference {
    fn reference_pose(&self) -> Pose {
        *self.pose.read()
    }
}

/// Host that only logs: registrations at info, every pose at trace.
#[derive(Debug, Default)]
pub struct LogHost {
    next_handle: AtomicU32,
    published: AtomicU64,
}

impl LogHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total poses published across all objects.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl DeviceHost for LogHost {
    fn register_object(&self, identity: &ObjectIdentity) -> Result<ObjectHandle> {
        let handle = ObjectHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        log::info!(
            "Registered {} ({}) as handle {}",
            identity.display_name(),
            identity.serial_number(),
            handle.0
        );
        Ok(handle)
    }

    fn publish_pose(&self, handle: ObjectHandle, pose: &Pose) {
        self.published.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "handle {} -> ({:.3}, {:.3}, {:.3}) valid={}",
            handle.0,
            pose.position.x,
            pose.position.y,
            pose.position.z,
            pose.valid
        );
    }
}

/// A pose update delivered through [`ChannelHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedPose {
    pub handle: ObjectHandle,
    /// Identity id the handle was registered for.
    pub object_id: u32,
    pub pose: Pose,
}

/// Host that forwards every update into a bounded channel.
///
/// When the consumer falls behind, updates are dropped instead of blocking
/// the publisher threads.
#[derive(Debug)]
pub struct ChannelHost {
    tx: Sender<PublishedPose>,
    object_ids: RwLock<Vec<u32>>,
    dropped: AtomicU64,
}

impl ChannelHost {
    /// Host plus the receiving end of its update channel.
    pub fn new(capacity: usize) -> (Self, Receiver<PublishedPose>) {
        let (tx, rx) = bounded(capacity);
        let host = Self {
            tx,
            object_ids: RwLock::new(Vec::new()),
            dropped: AtomicU64::new(0),
        };
        (host, rx)
    }

    /// Number of updates dropped because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn registered(&self) -> Vec<u32> {
        self.object_ids.read().clone()
    }
}

impl DeviceHost for ChannelHost {
    fn register_object(&self, identity: &ObjectIdentity) -> Result<ObjectHandle> {
        let mut ids = self.object_ids.write();
        if ids.contains(&identity.id) {
            return Err(Error::Registration {
                id: identity.id,
                reason: "already registered".to_string(),
            });
        }
        let handle = ObjectHandle(ids.len() as u32);
        ids.push(identity.id);
        Ok(handle)
    }

    fn publish_pose(&self, handle: ObjectHandle, pose: &Pose) {
        let Some(object_id) = self.object_ids.read().get(handle.0 as usize).copied() else {
            log::warn!("Pose for unknown handle {}", handle.0);
            return;
        };
        let update = PublishedPose {
            handle,
            object_id,
            pose: *pose,
        };
        match self.tx.try_send(update) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => {
                log::trace!("Pose consumer gone, discarding update");
            }
        }
    }
}
