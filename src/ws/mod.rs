//! WebSocket stream client
//!
//! Read-only stream with automatic reconnection, ping keepalive and
//! cooperative shutdown.

mod client;
mod types;

pub use client::WsClient;
pub use types::{WsConfig, WsError, WsMessage};
