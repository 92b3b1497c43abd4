pub mod channel_manager;
pub mod transport;

pub use channel_manager::{ChannelManager, DEFAULT_RECONNECT_DELAY};
pub use transport::{Connection, FrameSink, FrameStream, Transport, TungsteniteTransport};
