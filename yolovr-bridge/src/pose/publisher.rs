//! Fixed-rate per-object publish loop.
//!
//! Each registered object gets its own named thread that resolves a pose and
//! hands it to the host once per period. The loop never fails: when no live
//! data is available the fallback estimate is published instead, so the host
//! stream has no gaps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::resolver::{ObjectPoseResolver, PoseSource};
use crate::core::ObjectIdentity;
use crate::error::{Error, Result};
use crate::host::{DeviceHost, ObjectHandle};

/// Default publish period (about 200 Hz).
pub const DEFAULT_PUBLISH_PERIOD: Duration = Duration::from_millis(5);

/// Per-object tick counters, readable while the loop runs.
#[derive(Debug, Default)]
pub struct PublisherCounters {
    ticks: AtomicU64,
    live: AtomicU64,
    fallback: AtomicU64,
}

impl PublisherCounters {
    pub fn snapshot(&self) -> PublisherStats {
        PublisherStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            live: self.live.load(Ordering::Relaxed),
            fallback: self.fallback.load(Ordering::Relaxed),
        }
    }

    fn record(&self, source: PoseSource) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        match source {
            PoseSource::Live => self.live.fetch_add(1, Ordering::Relaxed),
            PoseSource::Fallback => self.fallback.fetch_add(1, Ordering::Relaxed),
        };
    }
}

/// Copy of one object's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherStats {
    pub ticks: u64,
    pub live: u64,
    pub fallback: u64,
}

/// Resolve and publish every `period` until `running` is cleared.
///
/// The flag is checked at the top of each tick, so shutdown latency is about
/// one period.
pub fn run_publish_loop(
    identity: &ObjectIdentity,
    handle: ObjectHandle,
    resolver: &ObjectPoseResolver,
    host: &dyn DeviceHost,
    period: Duration,
    running: &AtomicBool,
    counters: &PublisherCounters,
) {
    let mut last_source: Option<PoseSource> = None;

    while running.load(Ordering::Acquire) {
        let resolved = resolver.resolve(identity);
        host.publish_pose(handle, &resolved.pose);
        counters.record(resolved.source);

        if last_source != Some(resolved.source) {
            log::debug!("{}: pose source now {:?}", identity.name, resolved.source);
            last_source = Some(resolved.source);
        }

        thread::sleep(period);
    }
}

/// Handle to one running publish thread.
pub struct PosePublisher {
    identity: Arc<ObjectIdentity>,
    running: Arc<AtomicBool>,
    counters: Arc<PublisherCounters>,
    thread: Option<JoinHandle<()>>,
}

impl PosePublisher {
    /// Start publishing for an already registered object.
    pub fn spawn(
        identity: Arc<ObjectIdentity>,
        handle: ObjectHandle,
        resolver: ObjectPoseResolver,
        host: Arc<dyn DeviceHost>,
        period: Duration,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(PublisherCounters::default());

        let thread = {
            let thread_identity = Arc::clone(&identity);
            let running = Arc::clone(&running);
            let counters = Arc::clone(&counters);
            thread::Builder::new()
                .name(format!("pose-{}", identity.name))
                .spawn(move || {
                    run_publish_loop(
                        &thread_identity,
                        handle,
                        &resolver,
                        host.as_ref(),
                        period,
                        &running,
                        &counters,
                    );
                })
                .map_err(|e| {
                    Error::ThreadSpawn(format!("publisher for {}: {}", identity.name, e))
                })?
        };

        log::debug!("Publisher started for {}", identity.serial_number());
        Ok(Self {
            identity,
            running,
            counters,
            thread: Some(thread),
        })
    }

    pub fn identity(&self) -> &ObjectIdentity {
        &self.identity
    }

    pub fn stats(&self) -> PublisherStats {
        self.counters.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Clear the running flag without waiting.
    pub fn signal_stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Stop and join. Idempotent.
    ///
    /// `None` waits until the thread exits. With a `timeout`, gives up after
    /// that long and returns [`Error::ThreadJoinTimeout`]; the handle is kept,
    /// so a later `stop(None)` or drop still joins it.
    pub fn stop(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.signal_stop();

        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        if let Some(timeout) = timeout {
            let deadline = Instant::now() + timeout;
            while !thread.is_finished() {
                if Instant::now() >= deadline {
                    self.thread = Some(thread);
                    return Err(Error::ThreadJoinTimeout {
                        name: format!("pose-{}", self.identity.name),
                        timeout,
                    });
                }
                thread::sleep(Duration::from_millis(1));
            }
        }

        thread.join().map_err(|_| Error::ThreadPanic)
    }
}

impl Drop for PosePublisher {
    fn drop(&mut self) {
        if let Err(e) = self.stop(None) {
            log::error!("Publisher for {} failed to stop: {}", self.identity.name, e);
        }
    }
}
