//! Synchronization error types
//!
//! Three families, none of them fatal to a dashboard session:
//!
//! - [`DecodeError`]: a payload or frame that does not match its schema.
//!   Dropped and logged, never retried.
//! - [`TransportError`]: an HTTP fetch that failed. The prior snapshot is
//!   retained and the next scheduled poll retries.
//! - [`ChannelError`]: the push channel went away. Surfaces as a status
//!   notice; the transport owns reconnection.

use thiserror::Error;

use crate::config::ConfigError;
use crate::model::Topic;

/// Payload or frame shape mismatch
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("payload for {topic} does not match its schema: {reason}")]
    Shape { topic: Topic, reason: String },

    #[error("unknown push event: {0}")]
    UnknownEvent(String),

    #[error("malformed push frame: {0}")]
    Frame(String),
}

/// Fetch or network failure against the data API
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("data API unavailable")]
    Unavailable,

    #[error("request timeout")]
    Timeout,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid response body: {0}")]
    Body(String),
}

impl TransportError {
    /// Classify a reqwest error the same way for every call site
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Unavailable
        } else {
            TransportError::Request(e)
        }
    }
}

/// Push channel failure
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("push channel disconnected: {0}")]
    Disconnected(String),

    #[error("push channel connect failed: {0}")]
    Connect(String),

    #[error("gave up reconnecting after {0} attempts")]
    Exhausted(u32),
}

/// Any error surfaced by the synchronization core
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("dashboard session already torn down")]
    TornDown,
}

/// Result type alias for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DecodeError::Shape {
            topic: Topic::Keywords,
            reason: "expected a sequence".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "payload for keywords does not match its schema: expected a sequence"
        );

        let err = TransportError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error 502: bad gateway");
    }

    #[test]
    fn test_sync_error_conversion() {
        let err: SyncError = ChannelError::Exhausted(5).into();
        assert!(matches!(err, SyncError::Channel(ChannelError::Exhausted(5))));
        assert_eq!(err.to_string(), "gave up reconnecting after 5 attempts");
    }
}
