//! Push channel connection state
//!
//! `Disconnected -(connect)-> Connected -(disconnect)-> Disconnected`.
//! Repeated connects or disconnects are no-ops.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Connection state of the push channel for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelState {
    pub connected: bool,
    /// Last time anything arrived over the channel
    pub last_event_at: Option<DateTime<Utc>>,
}

/// Result of feeding a connect or disconnect into [`ChannelState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTransition {
    Connected,
    Disconnected,
    Unchanged,
}

impl ChannelState {
    pub fn on_connect(&mut self, at: DateTime<Utc>) -> ChannelTransition {
        self.last_event_at = Some(at);
        if self.connected {
            return ChannelTransition::Unchanged;
        }
        self.connected = true;
        ChannelTransition::Connected
    }

    pub fn on_disconnect(&mut self, at: DateTime<Utc>) -> ChannelTransition {
        self.last_event_at = Some(at);
        if !self.connected {
            return ChannelTransition::Unchanged;
        }
        self.connected = false;
        ChannelTransition::Disconnected
    }

    /// Record activity without changing connectivity
    pub fn on_event(&mut self, at: DateTime<Utc>) {
        self.last_event_at = Some(at);
    }
}
