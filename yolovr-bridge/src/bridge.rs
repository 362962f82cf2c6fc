//! Lifecycle of a running bridge: receiver plus one publisher per object.
//!
//! Startup order is register all objects, start the receiver, then spawn the
//! publishers. Teardown runs the other way: publishers first, then the
//! receiver and its socket.

use std::sync::Arc;
use std::time::Duration;

use crate::config::BridgeConfig;
use crate::core::ObjectIdentity;
use crate::error::{Error, Result};
use crate::host::{DeviceHost, ObjectHandle, ReferencePoseSource};
use crate::pose::{ObjectPoseResolver, PosePublisher, PublisherStats};
use crate::streaming::{FrameCache, NetworkFrameReceiver, ReceiverStats};

/// Running receiver and publish loops for a fixed identity set.
pub struct TrackerBridge {
    cache: Arc<FrameCache>,
    /// `None` when the socket could not be bound (fallback-only mode).
    receiver: Option<NetworkFrameReceiver>,
    publishers: Vec<PosePublisher>,
    recent_window: Duration,
    join_timeout: Option<Duration>,
    shut_down: bool,
}

impl TrackerBridge {
    /// Register every identity with `host` and start publishing.
    ///
    /// A registration failure aborts startup. A receiver failure does not:
    /// the bridge keeps publishing fallback poses.
    pub fn start(
        config: &BridgeConfig,
        identities: Vec<ObjectIdentity>,
        host: Arc<dyn DeviceHost>,
        reference: Arc<dyn ReferencePoseSource>,
    ) -> Result<Self> {
        let mut registered: Vec<(Arc<ObjectIdentity>, ObjectHandle)> =
            Vec::with_capacity(identities.len());
        for identity in identities {
            let handle = host.register_object(&identity).map_err(|e| match e {
                Error::Registration { .. } => e,
                other => Error::Registration {
                    id: identity.id,
                    reason: other.to_string(),
                },
            })?;
            registered.push((Arc::new(identity), handle));
        }
        log::info!("Registered {} trackers", registered.len());

        let cache = Arc::new(FrameCache::new());
        let mut receiver =
            NetworkFrameReceiver::with_cache(config.receiver_config(), Arc::clone(&cache));
        let receiver = match receiver.start() {
            Ok(()) => Some(receiver),
            Err(e) => {
                log::warn!(
                    "Network receiver unavailable ({}), publishing fallback poses only",
                    e
                );
                None
            }
        };

        let resolver = ObjectPoseResolver::new(Arc::clone(&cache), reference)
            .with_live_window(config.live_window());

        let mut bridge = Self {
            cache,
            receiver,
            publishers: Vec::with_capacity(registered.len()),
            recent_window: config.recent_window(),
            join_timeout: config.join_timeout(),
            shut_down: false,
        };

        for (identity, handle) in registered {
            // On error `bridge` is dropped, which stops what already started
            let publisher = PosePublisher::spawn(
                identity,
                handle,
                resolver.clone(),
                Arc::clone(&host),
                config.publish_period(),
            )?;
            bridge.publishers.push(publisher);
        }

        log::info!(
            "Bridge running: {} publishers at {:?}, receiver {}",
            bridge.publishers.len(),
            config.publish_period(),
            bridge
                .receiver
                .as_ref()
                .and_then(|r| r.local_addr())
                .map_or_else(|| "disabled".to_string(), |a| a.to_string())
        );
        Ok(bridge)
    }

    pub fn frame_cache(&self) -> Arc<FrameCache> {
        Arc::clone(&self.cache)
    }

    /// Receiver counters, `None` in fallback-only mode.
    pub fn receiver_stats(&self) -> Option<ReceiverStats> {
        self.receiver.as_ref().map(|r| r.stats())
    }

    /// Per-object counters, in identity order.
    pub fn publisher_stats(&self) -> Vec<(u32, PublisherStats)> {
        self.publishers
            .iter()
            .map(|p| (p.identity().id, p.stats()))
            .collect()
    }

    /// Bound receiver address, if the receiver is running.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.receiver.as_ref().and_then(|r| r.local_addr())
    }

    /// True if a frame arrived within the recent window.
    pub fn is_receiving(&self) -> bool {
        self.cache.has_recent_data(self.recent_window)
    }

    /// Stop publishers, then the receiver. Idempotent.
    ///
    /// Returns [`Error::ThreadJoinTimeout`] if a bounded join expired with a
    /// publish still in flight. That publisher is joined when the bridge drops.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        log::info!("Shutting down bridge...");

        // Signal all publishers before joining any
        for publisher in &self.publishers {
            publisher.signal_stop();
        }

        let mut first_err = None;
        for publisher in &mut self.publishers {
            if let Err(e) = publisher.stop(self.join_timeout) {
                log::error!("Publisher for {} failed: {}", publisher.identity().name, e);
                first_err.get_or_insert(e);
            }
        }

        if let Some(receiver) = self.receiver.as_mut()
            && let Err(e) = receiver.stop()
        {
            log::error!("Receiver failed to stop: {}", e);
            first_err.get_or_insert(e);
        }

        log::info!("Bridge shutdown complete");
        first_err.map_or(Ok(()), Err)
    }
}

impl Drop for TrackerBridge {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Pose, body_trackers};
    use crate::host::{ChannelHost, StaticReference};
    use std::net::UdpSocket;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    fn test_config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.receiver.bind_address = "127.0.0.1".to_string();
        config.receiver.port = 0;
        config.publisher.period_ms = 2;
        config
    }

    struct RejectingHost;

    impl DeviceHost for RejectingHost {
        fn register_object(&self, identity: &ObjectIdentity) -> Result<ObjectHandle> {
            if identity.id == 2 {
                Err(Error::Other("no slots".to_string()))
            } else {
                Ok(ObjectHandle(identity.id))
            }
        }

        fn publish_pose(&self, _handle: ObjectHandle, _pose: &Pose) {}
    }

    /// Host whose publish call blocks, to catch teardown racing a publish.
    struct SlowHost {
        in_flight: AtomicBool,
    }

    impl DeviceHost for SlowHost {
        fn register_object(&self, identity: &ObjectIdentity) -> Result<ObjectHandle> {
            Ok(ObjectHandle(identity.id))
        }

        fn publish_pose(&self, _handle: ObjectHandle, _pose: &Pose) {
            self.in_flight.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(300));
            self.in_flight.store(false, Ordering::SeqCst);
        }
    }

    fn start_slow(config: &BridgeConfig) -> (TrackerBridge, Arc<SlowHost>) {
        let host = Arc::new(SlowHost {
            in_flight: AtomicBool::new(false),
        });
        let bridge = TrackerBridge::start(
            config,
            body_trackers().into_iter().take(1).collect(),
            host.clone(),
            Arc::new(StaticReference::default()),
        )
        .unwrap();
        while !host.in_flight.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
        (bridge, host)
    }

    #[test]
    fn test_shutdown_waits_for_publish_in_flight() {
        let (mut bridge, host) = start_slow(&test_config());

        bridge.shutdown().unwrap();
        assert!(!host.in_flight.load(Ordering::SeqCst));
    }

    #[test]
    fn test_bounded_shutdown_reports_overrun() {
        let mut config = test_config();
        config.publisher.join_timeout_ms = 20;
        let (mut bridge, host) = start_slow(&config);

        let err = bridge.shutdown().unwrap_err();
        assert!(matches!(err, Error::ThreadJoinTimeout { .. }));
        assert!(host.in_flight.load(Ordering::SeqCst));

        // Dropping the bridge still joins the overrunning publisher
        drop(bridge);
        assert!(!host.in_flight.load(Ordering::SeqCst));
    }

    #[test]
    fn test_registration_failure_aborts_start() {
        let result = TrackerBridge::start(
            &test_config(),
            body_trackers(),
            Arc::new(RejectingHost),
            Arc::new(StaticReference::default()),
        );
        match result {
            Err(Error::Registration { id, reason }) => {
                assert_eq!(id, 2);
                assert!(reason.contains("no slots"));
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("start should fail"),
        }
    }

    #[test]
    fn test_bind_failure_runs_fallback_only() {
        let occupied = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut config = test_config();
        config.receiver.port = occupied.local_addr().unwrap().port();

        let (host, rx) = ChannelHost::new(256);
        let mut bridge = TrackerBridge::start(
            &config,
            body_trackers(),
            Arc::new(host),
            Arc::new(StaticReference::default()),
        )
        .unwrap();

        assert!(bridge.receiver_stats().is_none());
        assert!(bridge.local_addr().is_none());
        assert!(!bridge.is_receiving());

        let update = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(update.pose.valid);

        bridge.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_stops_all_publishers() {
        let (host, rx) = ChannelHost::new(4096);
        let mut bridge = TrackerBridge::start(
            &test_config(),
            body_trackers(),
            Arc::new(host),
            Arc::new(StaticReference::default()),
        )
        .unwrap();

        // every tracker publishes at least once
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline
            && bridge.publisher_stats().iter().any(|(_, s)| s.ticks == 0)
        {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(bridge.publisher_stats().len(), 12);
        assert!(bridge.publisher_stats().iter().all(|(_, s)| s.ticks > 0));

        bridge.shutdown().unwrap();
        bridge.shutdown().unwrap();
        assert!(bridge.local_addr().is_none());

        let ticks: u64 = bridge.publisher_stats().iter().map(|(_, s)| s.ticks).sum();
        while rx.try_recv().is_ok() {}
        std::thread::sleep(Duration::from_millis(20));
        assert!(rx.try_recv().is_err());
        let after: u64 = bridge.publisher_stats().iter().map(|(_, s)| s.ticks).sum();
        assert_eq!(ticks, after);
    }
}
