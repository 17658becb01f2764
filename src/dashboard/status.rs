//! Status notices
//!
//! Transient banners shown when the push channel connects or drops.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => f.write_str("success"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A transient status banner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusNotice {
    pub message: String,
    pub severity: Severity,
    pub shown_at: DateTime<Utc>,
}

impl StatusNotice {
    pub fn connected(at: DateTime<Utc>) -> Self {
        Self {
            message: "Live updates connected".to_string(),
            severity: Severity::Success,
            shown_at: at,
        }
    }

    pub fn disconnected(reason: Option<&str>, at: DateTime<Utc>) -> Self {
        let message = match reason {
            Some(reason) if !reason.is_empty() => {
                format!("Live updates disconnected ({})", reason)
            }
            _ => "Live updates disconnected".to_string(),
        };

        Self {
            message,
            severity: Severity::Warning,
            shown_at: at,
        }
    }
}

/// Where status notices are displayed
pub trait StatusSink: Send {
    fn show(&mut self, notice: &StatusNotice);
    fn dismiss(&mut self);
}
