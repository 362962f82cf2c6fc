//! Network ingestion: wire codec, latest-frame cache and the UDP receiver.

pub mod frame_cache;
pub mod proto;
pub mod receiver;
pub mod wire;

pub use frame_cache::{DEFAULT_RECENT_WINDOW, FrameCache};
pub use receiver::{MAX_UDP_PAYLOAD, NetworkFrameReceiver, ReceiverConfig, ReceiverStats};
pub use wire::DecodeError;
