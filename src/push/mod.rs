//! Push Channel
//!
//! - **messages**: named push events and the `{"event", "data"}` frame format
//! - **transport**: WebSocket client with exponential-backoff reconnect

mod messages;
mod transport;

pub use messages::{PushFrame, PushMessage};
pub use transport::{reconnect_delay, PushTransportConfig, WsPushTransport};
