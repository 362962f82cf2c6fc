//! Background UDP receiver feeding the frame cache.
//!
//! One named thread polls a non-blocking socket, decodes each datagram and
//! publishes accepted frames into the shared [`FrameCache`]. Failures are
//! counted in [`ReceiverStats`] and never stop the loop.

use parking_lot::Mutex;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::frame_cache::FrameCache;
use super::wire;
use crate::error::{Error, Result};

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// Receiver socket settings. Changes take effect on the next `start`.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub bind_address: String,
    pub port: u16,
    /// Socket read timeout. Zero leaves the OS default.
    pub timeout: Duration,
    /// Largest datagram accepted, in bytes. Capped at [`MAX_UDP_PAYLOAD`].
    pub max_frame_size: usize,
    /// Sleep between polls when no datagram is waiting.
    pub poll_interval: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 9999,
            timeout: Duration::from_millis(50),
            max_frame_size: MAX_UDP_PAYLOAD,
            poll_interval: Duration::from_millis(1),
        }
    }
}

impl ReceiverConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Diagnostic counters. Monotonic for the lifetime of the receiver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiverStats {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub parse_errors: u64,
    pub network_errors: u64,
    pub last_frame_time: Option<Instant>,
}

impl ReceiverStats {
    /// Drop ratio in percent over everything that reached the socket.
    pub fn drop_rate(&self) -> f64 {
        let total = self.frames_received + self.frames_dropped;
        if total > 0 {
            (self.frames_dropped as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// UDP telemetry receiver.
pub struct NetworkFrameReceiver {
    config: ReceiverConfig,
    cache: Arc<FrameCache>,
    stats: Arc<Mutex<ReceiverStats>>,
    running: Arc<AtomicBool>,
    reader_handle: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl NetworkFrameReceiver {
    /// Receiver with its own empty cache.
    pub fn new(config: ReceiverConfig) -> Self {
        Self::with_cache(config, Arc::new(FrameCache::new()))
    }

    /// Receiver publishing into an existing cache.
    pub fn with_cache(config: ReceiverConfig, cache: Arc<FrameCache>) -> Self {
        Self {
            config,
            cache,
            stats: Arc::new(Mutex::new(ReceiverStats::default())),
            running: Arc::new(AtomicBool::new(false)),
            reader_handle: None,
            local_addr: None,
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.config.max_frame_size = capped_frame_size(max_frame_size);
    }

    /// Shared cache that accepted frames are published into.
    pub fn frame_cache(&self) -> Arc<FrameCache> {
        Arc::clone(&self.cache)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Address the socket is bound to while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> ReceiverStats {
        self.stats.lock().clone()
    }

    /// Bind the socket and launch the receive thread.
    ///
    /// No-op if already running. On error nothing is left running.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        // A loop that exited on its own still holds a handle
        if let Some(handle) = self.reader_handle.take()
            && handle.join().is_err()
        {
            log::warn!("Previous receive thread had panicked");
        }

        let addr = self.config.bind_addr();
        let socket = UdpSocket::bind(addr.as_str()).map_err(|source| Error::Bind {
            addr: addr.clone(),
            source,
        })?;
        socket.set_nonblocking(true)?;
        if !self.config.timeout.is_zero() {
            socket.set_read_timeout(Some(self.config.timeout))?;
        }
        let local_addr = socket.local_addr()?;

        let running = Arc::clone(&self.running);
        let cache = Arc::clone(&self.cache);
        let stats = Arc::clone(&self.stats);
        let max_frame_size = capped_frame_size(self.config.max_frame_size);
        let poll_interval = self.config.poll_interval;

        running.store(true, Ordering::Release);
        let spawned = thread::Builder::new()
            .name("frame-receiver".to_string())
            .spawn(move || {
                Self::receive_loop(socket, running, cache, stats, max_frame_size, poll_interval);
            });

        match spawned {
            Ok(handle) => {
                self.reader_handle = Some(handle);
                self.local_addr = Some(local_addr);
                log::info!("Frame receiver listening on {}", local_addr);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(Error::ThreadSpawn(format!("frame-receiver: {}", e)))
            }
        }
    }

    /// Signal the loop, join it and release the socket. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Release);

        let Some(handle) = self.reader_handle.take() else {
            return Ok(());
        };
        handle.join().map_err(|_| Error::ThreadPanic)?;
        self.local_addr = None;

        log::info!("Frame receiver stopped");
        Ok(())
    }

    fn receive_loop(
        socket: UdpSocket,
        running: Arc<AtomicBool>,
        cache: Arc<FrameCache>,
        stats: Arc<Mutex<ReceiverStats>>,
        max_frame_size: usize,
        poll_interval: Duration,
    ) {
        log::debug!("Receive thread started");
        let _running = RunningGuard(Arc::clone(&running));

        // One spare byte so an oversized datagram is seen as such, not truncated
        let mut buffer = vec![0u8; max_frame_size.min(MAX_UDP_PAYLOAD).saturating_add(1)];

        while running.load(Ordering::Acquire) {
            let (len, src) = match socket.recv_from(&mut buffer) {
                Ok(result) => result,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    thread::sleep(poll_interval);
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    {
                        let mut s = stats.lock();
                        s.network_errors += 1;
                        s.frames_dropped += 1;
                    }
                    log::warn!("UDP receive error: {}", e);
                    thread::sleep(poll_interval);
                    continue;
                }
            };

            if len == 0 {
                continue;
            }

            match wire::decode(&buffer[..len], max_frame_size) {
                Ok(frame) => {
                    log::trace!(
                        "Frame {} from {} with {} trackers",
                        frame.frame_id,
                        src,
                        frame.len()
                    );
                    cache.publish(frame);
                    let mut s = stats.lock();
                    s.frames_received += 1;
                    s.last_frame_time = Some(Instant::now());
                }
                Err(e) => {
                    {
                        let mut s = stats.lock();
                        s.parse_errors += 1;
                        s.frames_dropped += 1;
                    }
                    log::warn!("Dropped datagram from {} ({} bytes): {}", src, len, e);
                }
            }
        }

        log::debug!("Receive thread exiting");
    }
}

fn capped_frame_size(requested: usize) -> usize {
    if requested > MAX_UDP_PAYLOAD {
        log::warn!(
            "max_frame_size {} exceeds the largest UDP payload, using {}",
            requested,
            MAX_UDP_PAYLOAD
        );
        return MAX_UDP_PAYLOAD;
    }
    requested
}

/// Clears the running flag when the receive loop exits, including by panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Drop for NetworkFrameReceiver {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("Frame receiver shutdown failed: {}", e);
        }
    }
}
