//! Simulated tracking client.
//!
//! Sends animated frames for the default body tracker set: each tracker
//! circles its body offset with a 10 cm radius. Useful for exercising the
//! bridge without a real tracking system.
//!
//! ```bash
//! cargo run --bin tracker-sim -- --fps 60 --duration 10
//! cargo run --bin tracker-sim -- --single
//! cargo run --bin tracker-sim -- --dropout 0.2
//! ```

use clap::Parser;
use prost::Message as ProstMessage;
use rand::Rng;
use std::f32::consts::TAU;
use std::net::UdpSocket;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use yolovr_bridge::core::{ObjectIdentity, body_trackers};
use yolovr_bridge::streaming::proto;
use yolovr_bridge::{Error, Result};

/// Circle radius in meters
const RADIUS: f32 = 0.1;
/// Angular speed in rad/s
const SPEED: f32 = 0.5;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Target UDP port
    #[arg(short, long, default_value_t = 9999)]
    port: u16,

    /// Run time in seconds
    #[arg(short, long, default_value_t = 30)]
    duration: u64,

    /// Frames per second
    #[arg(short, long, default_value_t = 30)]
    fps: u32,

    /// Send one frame, print it and exit
    #[arg(short, long)]
    single: bool,

    /// Probability in [0, 1] that a tracker is reported as not tracking
    #[arg(long, default_value_t = 0.0)]
    dropout: f64,
}

struct Simulator {
    trackers: Vec<ObjectIdentity>,
    frame_id: u64,
    dropout: f64,
}

impl Simulator {
    fn new(dropout: f64) -> Self {
        Self {
            trackers: body_trackers(),
            frame_id: 0,
            dropout: dropout.clamp(0.0, 1.0),
        }
    }

    fn next_frame(&mut self, timestamp_us: u64, rng: &mut impl Rng) -> proto::TrackerFrame {
        let t = timestamp_us as f64 / 1_000_000.0;
        let count = self.trackers.len() as f32;

        let trackers = self
            .trackers
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let angle = (t as f32) * SPEED + i as f32 * (TAU / count);
                let (sin, cos) = angle.sin_cos();
                let vel = RADIUS * SPEED;

                proto::TrackerPose {
                    tracker_id: id.id,
                    tracker_name: id.name.clone(),
                    position: Some(proto::Vector3 {
                        x: id.offset.x + cos * RADIUS,
                        y: id.offset.y + sin * RADIUS * 0.5,
                        z: id.offset.z + (angle * 2.0).sin() * RADIUS * 0.3,
                    }),
                    rotation: Some(proto::Quaternion {
                        x: 0.0,
                        y: 0.0,
                        z: 0.0,
                        w: 1.0,
                    }),
                    velocity: Some(proto::Vector3 {
                        x: -sin * vel,
                        y: cos * vel * 0.5,
                        z: (angle * 2.0).cos() * 2.0 * vel * 0.3,
                    }),
                    angular_velocity: None,
                    confidence: 0.95 + 0.05 * ((t + i as f64).sin() as f32),
                    is_tracking: !rng.gen_bool(self.dropout),
                    timestamp: timestamp_us,
                }
            })
            .collect();

        let frame = proto::TrackerFrame {
            frame_id: self.frame_id,
            timestamp: timestamp_us,
            source_id: 1,
            system_name: "YoloVr Tracker Sim".to_string(),
            system_fps: 30.0,
            is_calibrated: true,
            lost_tracking_count: 0,
            hmd_pose: Some(proto::TrackerPose {
                tracker_id: 999,
                tracker_name: "HMD".to_string(),
                rotation: Some(proto::Quaternion {
                    x: 0.0,
                    y: 0.0,
                    z: 0.0,
                    w: 1.0,
                }),
                confidence: 1.0,
                is_tracking: true,
                timestamp: timestamp_us,
                ..Default::default()
            }),
            trackers,
        };
        self.frame_id += 1;
        frame
    }
}

fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let target = format!("{}:{}", args.host, args.port);
    let socket = UdpSocket::bind("0.0.0.0:0")
        .map_err(|e| Error::Other(format!("Failed to create UDP socket: {}", e)))?;

    let mut sim = Simulator::new(args.dropout);
    let mut rng = rand::thread_rng();

    if args.single {
        let frame = sim.next_frame(now_us(), &mut rng);
        socket.send_to(&frame.encode_to_vec(), &target)?;
        log::info!("Sent single frame with {} trackers to {}", frame.trackers.len(), target);
        for t in &frame.trackers {
            if let Some(p) = &t.position {
                log::info!("  {}: ({:.3}, {:.3}, {:.3})", t.tracker_name, p.x, p.y, p.z);
            }
        }
        return Ok(());
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let interval = Duration::from_secs_f64(1.0 / f64::from(args.fps.max(1)));
    let duration = Duration::from_secs(args.duration);
    log::info!(
        "Sending to {} at {} fps for {}s (dropout {:.0}%)",
        target,
        args.fps,
        args.duration,
        args.dropout * 100.0
    );

    let start = Instant::now();
    let mut next_send = start;
    let mut frames_sent: u64 = 0;

    while running.load(Ordering::Relaxed) && start.elapsed() < duration {
        let now = Instant::now();
        if now >= next_send {
            let frame = sim.next_frame(now_us(), &mut rng);
            match socket.send_to(&frame.encode_to_vec(), &target) {
                Ok(_) => {
                    frames_sent += 1;
                    if frames_sent % u64::from(args.fps.max(1)) == 0 {
                        log::info!(
                            "Sent {} frames, {:.1}s elapsed",
                            frames_sent,
                            start.elapsed().as_secs_f32()
                        );
                    }
                }
                Err(e) => log::warn!("Send failed: {}", e),
            }
            next_send += interval;
        }
        thread::sleep(Duration::from_millis(1));
    }

    let elapsed = start.elapsed().as_secs_f64();
    log::info!(
        "Done: {} frames in {:.1}s ({:.1} fps)",
        frames_sent,
        elapsed,
        if elapsed > 0.0 {
            frames_sent as f64 / elapsed
        } else {
            0.0
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yolovr_bridge::MAX_UDP_PAYLOAD;
    use yolovr_bridge::streaming::wire;

    #[test]
    fn test_frame_decodes_with_all_trackers() {
        let mut sim = Simulator::new(0.0);
        let mut rng = rand::thread_rng();
        let frame = sim.next_frame(1_500_000, &mut rng);
        assert_eq!(sim.frame_id, 1);

        let decoded = wire::decode(&frame.encode_to_vec(), MAX_UDP_PAYLOAD).unwrap();
        assert_eq!(decoded.len(), 12);
        assert!(decoded.objects.iter().all(|o| o.pose.is_tracking()));
        assert!(decoded.objects.iter().all(|o| o.pose.velocity.is_some()));
        assert_eq!(decoded.system_name, "YoloVr Tracker Sim");
    }

    #[test]
    fn test_positions_stay_near_offsets() {
        let mut sim = Simulator::new(0.0);
        let mut rng = rand::thread_rng();
        let frame = sim.next_frame(7_250_000, &mut rng);
        for (t, id) in frame.trackers.iter().zip(body_trackers()) {
            let p = t.position.as_ref().unwrap();
            let dx = p.x - id.offset.x;
            let dy = p.y - id.offset.y;
            let dz = p.z - id.offset.z;
            assert!((dx * dx + dy * dy + dz * dz).sqrt() <= RADIUS + 1e-5);
        }
    }

    #[test]
    fn test_full_dropout() {
        let mut sim = Simulator::new(1.0);
        let mut rng = rand::thread_rng();
        let frame = sim.next_frame(0, &mut rng);
        assert!(frame.trackers.iter().all(|t| !t.is_tracking));
    }
}
