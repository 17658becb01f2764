//! Push Message Types
//!
//! Named events delivered by the push transport. On the wire each frame is
//! a JSON text `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;
use crate::model::Topic;

/// Raw frame as sent by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// A decoded push event
#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    /// Transport established a connection
    Connect,
    /// Transport lost its connection
    Disconnect { reason: Option<String> },
    /// Server greeting sent right after the handshake
    Status(Value),
    /// Per-topic update
    Update { topic: Topic, payload: Value },
}

impl PushMessage {
    /// Resolve a named event and its payload
    pub fn from_named(event: &str, data: Value) -> Result<Self, DecodeError> {
        match event {
            "connect" => Ok(PushMessage::Connect),
            "status" => Ok(PushMessage::Status(data)),
            "disconnect" => Ok(PushMessage::Disconnect {
                reason: data.as_str().map(str::to_string),
            }),
            name => Topic::from_push_event(name)
                .map(|topic| PushMessage::Update {
                    topic,
                    payload: data,
                })
                .ok_or_else(|| DecodeError::UnknownEvent(name.to_string())),
        }
    }

    /// Decode a text frame
    pub fn from_frame_text(text: &str) -> Result<Self, DecodeError> {
        let frame: PushFrame =
            serde_json::from_str(text).map_err(|e| DecodeError::Frame(e.to_string()))?;
        Self::from_named(&frame.event, frame.data)
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            PushMessage::Connect => "connect",
            PushMessage::Disconnect { .. } => "disconnect",
            PushMessage::Status(_) => "status",
            PushMessage::Update { topic, .. } => topic.push_event().unwrap_or("update"),
        }
    }
}
