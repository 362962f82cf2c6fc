//! Error types for yolovr-bridge

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Bridge error types
///
/// Per-datagram failures never show up here; the receive loop counts and
/// drops them (see [`crate::streaming::wire::DecodeError`]).
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UDP socket could not be bound or configured
    #[error("Failed to bind UDP socket to {addr}: {source}")]
    Bind {
        /// Address the bind was attempted on
        addr: String,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Host refused to register a tracked object
    #[error("Failed to register tracker {id}: {reason}")]
    Registration {
        /// Identity id of the rejected object
        id: u32,
        /// Host-provided reason
        reason: String,
    },

    /// Worker thread could not be spawned
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(String),

    /// Worker thread panicked before it could be joined
    #[error("Thread panicked")]
    ThreadPanic,

    /// Worker thread was still running when a bounded join gave up
    #[error("Thread {name} did not stop within {timeout:?}")]
    ThreadJoinTimeout {
        /// Thread name
        name: String,
        /// Wait that expired
        timeout: std::time::Duration,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
