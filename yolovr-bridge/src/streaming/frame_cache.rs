//! Latest-frame cache shared between the receive thread and the publishers.
//!
//! Holds exactly one frame, the most recently accepted, together with its
//! local arrival time. Critical sections are a pointer copy, so readers never
//! hold the writer up for longer than an `Arc` swap.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::TelemetryFrame;

/// Generic "is anything arriving" window.
pub const DEFAULT_RECENT_WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
struct CachedFrame {
    frame: Arc<TelemetryFrame>,
    received_at: Instant,
}

/// Thread-safe holder of the most recent frame.
#[derive(Debug, Default)]
pub struct FrameCache {
    inner: RwLock<Option<CachedFrame>>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached frame, stamped with the current time.
    pub fn publish(&self, frame: TelemetryFrame) {
        self.publish_at(frame, Instant::now());
    }

    /// Replace the cached frame with an explicit arrival time.
    pub fn publish_at(&self, frame: TelemetryFrame, received_at: Instant) {
        let cached = CachedFrame {
            frame: Arc::new(frame),
            received_at,
        };
        *self.inner.write() = Some(cached);
    }

    /// Latest frame if it arrived no more than `max_age` ago.
    pub fn snapshot(&self, max_age: Duration) -> Option<Arc<TelemetryFrame>> {
        self.snapshot_at(Instant::now(), max_age)
    }

    /// [`snapshot`](Self::snapshot) evaluated at `now`.
    pub fn snapshot_at(&self, now: Instant, max_age: Duration) -> Option<Arc<TelemetryFrame>> {
        let guard = self.inner.read();
        let cached = guard.as_ref()?;
        if now.saturating_duration_since(cached.received_at) <= max_age {
            Some(Arc::clone(&cached.frame))
        } else {
            None
        }
    }

    /// True if a frame arrived within `max_age`.
    pub fn has_recent_data(&self, max_age: Duration) -> bool {
        self.snapshot(max_age).is_some()
    }

    /// Latest frame within [`DEFAULT_RECENT_WINDOW`].
    pub fn latest(&self) -> Option<Arc<TelemetryFrame>> {
        self.snapshot(DEFAULT_RECENT_WINDOW)
    }

    /// Time since the cached frame arrived, or `None` if nothing has.
    pub fn age(&self) -> Option<Duration> {
        self.inner.read().as_ref().map(|c| c.received_at.elapsed())
    }
}
