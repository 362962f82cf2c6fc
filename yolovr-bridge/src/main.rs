//! yolovr-bridge daemon
//!
//! Runs the receiver and the per-tracker publish loops against a logging
//! host, with a static reference pose taken from configuration.
//!
//! # Usage
//!
//! ```bash
//! # Defaults (or ./yolovr.toml if present)
//! cargo run --release
//!
//! # Custom config file and port override
//! cargo run --release -- --config bridge.toml --port 9998
//! ```

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use yolovr_bridge::{BridgeConfig, Error, LogHost, Result, StaticReference, TrackerBridge};

const DEFAULT_CONFIG_PATH: &str = "yolovr.toml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: ./yolovr.toml if it exists)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override receiver bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override receiver UDP port
    #[arg(short, long)]
    port: Option<u16>,
}

fn load_config(args: &Args) -> Result<BridgeConfig> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            BridgeConfig::load(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => BridgeConfig::default(),
    };

    if let Some(bind) = &args.bind {
        config.receiver.bind_address = bind.clone();
    }
    if let Some(port) = args.port {
        config.receiver.port = port;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("yolovr-bridge v{} starting", env!("CARGO_PKG_VERSION"));
    log::info!("  Receiver: udp://{}", config.bind_addr());
    log::info!(
        "  Publish period: {:?}, live window: {:?}",
        config.publish_period(),
        config.live_window()
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let identities = config.identities()?;
    let host = Arc::new(LogHost::new());
    let reference = Arc::new(StaticReference::new(config.reference_pose()));

    let mut bridge = TrackerBridge::start(&config, identities, host.clone(), reference)?;

    let stats_interval = config.stats_interval();
    let mut last_stats = Instant::now();
    while running.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(100));

        if let Some(interval) = stats_interval
            && last_stats.elapsed() >= interval
        {
            log_stats(&bridge, &host);
            last_stats = Instant::now();
        }
    }

    bridge.shutdown()?;
    log::info!("yolovr-bridge shutdown complete");
    Ok(())
}

fn log_stats(bridge: &TrackerBridge, host: &LogHost) {
    match bridge.receiver_stats() {
        Some(stats) => log::info!(
            "Receiver: received={} dropped={} parse_errors={} network_errors={} loss={:.1}% receiving={}",
            stats.frames_received,
            stats.frames_dropped,
            stats.parse_errors,
            stats.network_errors,
            stats.drop_rate(),
            bridge.is_receiving()
        ),
        None => log::info!("Receiver: disabled (fallback only)"),
    }

    let (live, fallback) = bridge
        .publisher_stats()
        .iter()
        .fold((0, 0), |(l, f), (_, s)| (l + s.live, f + s.fallback));
    log::info!(
        "Publishers: {} poses published (live={} fallback={})",
        host.published(),
        live,
        fallback
    );
}
