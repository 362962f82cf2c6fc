//! Configuration loading for yolovr-bridge

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::core::{ObjectIdentity, Pose, Quaternion, Vector3, body_trackers};
use crate::error::{Error, Result};
use crate::streaming::{MAX_UDP_PAYLOAD, ReceiverConfig};

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub receiver: ReceiverSection,
    #[serde(default)]
    pub resolver: ResolverSection,
    #[serde(default)]
    pub publisher: PublisherSection,
    #[serde(default)]
    pub reference: ReferenceSection,
    #[serde(default)]
    pub logging: LoggingSection,
    /// Overrides the default body tracker set when non-empty.
    #[serde(default)]
    pub trackers: Vec<ObjectIdentity>,
}

/// UDP receiver settings
#[derive(Clone, Debug, Deserialize)]
pub struct ReceiverSection {
    /// Local address to bind (default: 0.0.0.0)
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// UDP port (default: 9999)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Socket read timeout in milliseconds (default: 50)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest accepted datagram in bytes, at most 65507 (default: 65507)
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,

    /// Idle poll sleep in milliseconds (default: 1)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Live/stale policy
#[derive(Clone, Debug, Deserialize)]
pub struct ResolverSection {
    /// Maximum frame age used for live poses (default: 50)
    #[serde(default = "default_live_window_ms")]
    pub live_window_ms: u64,

    /// Window for the "receiving" health check (default: 100)
    #[serde(default = "default_recent_window_ms")]
    pub recent_window_ms: u64,
}

/// Publish loop settings
#[derive(Clone, Debug, Deserialize)]
pub struct PublisherSection {
    /// Publish period in milliseconds (default: 5, about 200 Hz)
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    /// Bounded wait per publisher on shutdown, 0 waits forever (default: 0)
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

/// Static reference pose for running without a live head-mounted device
#[derive(Clone, Debug, Deserialize)]
pub struct ReferenceSection {
    /// Position [x, y, z] in meters (default: standing head height)
    #[serde(default = "default_reference_position")]
    pub position: [f32; 3],

    /// Orientation [w, x, y, z] (default: identity)
    #[serde(default = "default_reference_rotation")]
    pub rotation: [f32; 4],
}

/// Logging settings
#[derive(Clone, Debug, Deserialize)]
pub struct LoggingSection {
    /// Default filter when RUST_LOG is unset (default: info)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Interval between stats log lines in seconds, 0 disables (default: 10)
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    9999
}
fn default_timeout_ms() -> u64 {
    50
}
fn default_max_frame_size() -> usize {
    MAX_UDP_PAYLOAD
}
fn default_poll_interval_ms() -> u64 {
    1
}
fn default_live_window_ms() -> u64 {
    50
}
fn default_recent_window_ms() -> u64 {
    100
}
fn default_period_ms() -> u64 {
    5
}
fn default_join_timeout_ms() -> u64 {
    0
}
fn default_reference_position() -> [f32; 3] {
    [0.0, 1.6, 0.0]
}
fn default_reference_rotation() -> [f32; 4] {
    [1.0, 0.0, 0.0, 0.0]
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_stats_interval_secs() -> u64 {
    10
}

impl Default for ReceiverSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            max_frame_size: default_max_frame_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            live_window_ms: default_live_window_ms(),
            recent_window_ms: default_recent_window_ms(),
        }
    }
}

impl Default for PublisherSection {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            join_timeout_ms: default_join_timeout_ms(),
        }
    }
}

impl Default for ReferenceSection {
    fn default() -> Self {
        Self {
            position: default_reference_position(),
            rotation: default_reference_rotation(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.publisher.period_ms == 0 {
            return Err(Error::Config("publisher.period_ms must be > 0".to_string()));
        }
        if self.receiver.max_frame_size == 0 {
            return Err(Error::Config("receiver.max_frame_size must be > 0".to_string()));
        }
        if self.receiver.max_frame_size > MAX_UDP_PAYLOAD {
            return Err(Error::Config(format!(
                "receiver.max_frame_size must be <= {} (largest UDP payload)",
                MAX_UDP_PAYLOAD
            )));
        }
        self.identities().map(|_| ())
    }

    /// Receiver settings with durations resolved
    pub fn receiver_config(&self) -> ReceiverConfig {
        ReceiverConfig {
            bind_address: self.receiver.bind_address.clone(),
            port: self.receiver.port,
            timeout: Duration::from_millis(self.receiver.timeout_ms),
            max_frame_size: self.receiver.max_frame_size,
            poll_interval: Duration::from_millis(self.receiver.poll_interval_ms),
        }
    }

    /// Full bind address string
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.receiver.bind_address, self.receiver.port)
    }

    pub fn live_window(&self) -> Duration {
        Duration::from_millis(self.resolver.live_window_ms)
    }

    pub fn recent_window(&self) -> Duration {
        Duration::from_millis(self.resolver.recent_window_ms)
    }

    pub fn publish_period(&self) -> Duration {
        Duration::from_millis(self.publisher.period_ms)
    }

    /// `None` when publishers should be joined without a deadline
    pub fn join_timeout(&self) -> Option<Duration> {
        match self.publisher.join_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// `None` when periodic stats logging is disabled
    pub fn stats_interval(&self) -> Option<Duration> {
        match self.logging.stats_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn reference_pose(&self) -> Pose {
        let [w, x, y, z] = self.reference.rotation;
        Pose::new(
            Vector3::from_array(self.reference.position),
            Quaternion::new(w, x, y, z).normalized(),
        )
    }

    /// Tracked object set: configured trackers, or the default body set.
    ///
    /// Configured ids must be unique and cover 0..N-1.
    pub fn identities(&self) -> Result<Vec<ObjectIdentity>> {
        if self.trackers.is_empty() {
            return Ok(body_trackers());
        }

        let mut seen = HashSet::new();
        for t in &self.trackers {
            if t.name.is_empty() {
                return Err(Error::Config(format!("tracker {} has no name", t.id)));
            }
            if t.id as usize >= self.trackers.len() {
                return Err(Error::Config(format!(
                    "tracker id {} out of range 0..{}",
                    t.id,
                    self.trackers.len()
                )));
            }
            if !seen.insert(t.id) {
                return Err(Error::Config(format!("duplicate tracker id {}", t.id)));
            }
        }

        let mut trackers = self.trackers.clone();
        trackers.sort_by_key(|t| t.id);
        Ok(trackers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TrackerRole;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:9999");
        assert_eq!(config.live_window(), Duration::from_millis(50));
        assert_eq!(config.recent_window(), Duration::from_millis(100));
        assert_eq!(config.publish_period(), Duration::from_millis(5));
        assert_eq!(config.join_timeout(), None);
        assert_eq!(config.stats_interval(), Some(Duration::from_secs(10)));
        assert_eq!(config.logging.level, "info");

        let receiver = config.receiver_config();
        assert_eq!(receiver.timeout, Duration::from_millis(50));
        assert_eq!(receiver.max_frame_size, 65_507);

        assert_eq!(config.identities().unwrap().len(), 12);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = BridgeConfig::parse("").unwrap();
        assert_eq!(config.receiver.port, 9999);
        assert_eq!(config.reference_pose().position, Vector3::new(0.0, 1.6, 0.0));
    }

    #[test]
    fn test_partial_sections() {
        let config = BridgeConfig::parse(
            r#"
            [receiver]
            port = 7000

            [resolver]
            live_window_ms = 80

            [logging]
            stats_interval_secs = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.receiver.port, 7000);
        assert_eq!(config.receiver.bind_address, "0.0.0.0");
        assert_eq!(config.live_window(), Duration::from_millis(80));
        assert_eq!(config.recent_window(), Duration::from_millis(100));
        assert!(config.stats_interval().is_none());
    }

    #[test]
    fn test_reference_rotation_normalized() {
        let config = BridgeConfig::parse(
            r#"
            [reference]
            position = [1.0, 1.5, -0.5]
            rotation = [2.0, 0.0, 0.0, 0.0]
            "#,
        )
        .unwrap();
        let pose = config.reference_pose();
        assert_eq!(pose.position, Vector3::new(1.0, 1.5, -0.5));
        assert_eq!(pose.rotation, Quaternion::identity());
    }

    #[test]
    fn test_custom_trackers() {
        let config = BridgeConfig::parse(
            r#"
            [[trackers]]
            id = 1
            name = "RightHand"
            offset = { x = 0.3, y = -0.4, z = -0.2 }
            role = "right_hand"

            [[trackers]]
            id = 0
            name = "LeftHand"
            offset = { x = -0.3, y = -0.4, z = -0.2 }
            role = "left_hand"
            "#,
        )
        .unwrap();
        let ids = config.identities().unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].name, "LeftHand");
        assert_eq!(ids[1].role, Some(TrackerRole::RightHand));
        assert_eq!(ids[1].offset, Vector3::new(0.3, -0.4, -0.2));
    }

    #[test]
    fn test_duplicate_tracker_ids_rejected() {
        let err = BridgeConfig::parse(
            r#"
            [[trackers]]
            id = 0
            name = "A"

            [[trackers]]
            id = 0
            name = "B"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_gap_in_tracker_ids_rejected() {
        let err = BridgeConfig::parse(
            r#"
            [[trackers]]
            id = 0
            name = "A"

            [[trackers]]
            id = 5
            name = "B"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_period_rejected() {
        let err = BridgeConfig::parse("[publisher]\nperiod_ms = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_frame_size_bounds() {
        let err = BridgeConfig::parse("[receiver]\nmax_frame_size = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = BridgeConfig::parse("[receiver]\nmax_frame_size = 70000\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let mut config = BridgeConfig::default();
        config.receiver.max_frame_size = usize::MAX;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = BridgeConfig::parse("[receiver]\nmax_frame_size = 65507\n").unwrap();
        assert_eq!(config.receiver_config().max_frame_size, MAX_UDP_PAYLOAD);
    }

    #[test]
    fn test_join_timeout_opt_in() {
        let config = BridgeConfig::parse("[publisher]\njoin_timeout_ms = 250\n").unwrap();
        assert_eq!(config.join_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_invalid_toml() {
        let err = BridgeConfig::parse("[receiver\nport = 1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[receiver]\nbind_address = \"127.0.0.1\"\nport = 0").unwrap();

        let config = BridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:0");
    }

    #[test]
    fn test_load_missing_file() {
        let err = BridgeConfig::load(Path::new("/nonexistent/yolovr.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
