// fireboard-api: Async Rust client for a data-exchange node (REST + live-update WebSocket)

pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod websocket;

pub use client::ExchangeClient;
pub use error::Error;
pub use models::{BroadcastRequest, Data, DataInput, DataRef, Message, MessageHeader, NodeStatus};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{ChangeTick, EventStreamHandle, ReconnectConfig, StreamStatus};
