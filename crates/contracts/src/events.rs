//! Session event log: the engine-side replacement for every rendering call
//! in the terminal front end. A presentation layer subscribes and renders;
//! nothing here touches a screen.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SCHEMA_VERSION_V1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaseEventType {
    ContactConnected,
    ContactDepleted,
    ContactRefused,
    MessageSent,
    ReplyReceived,
    GatewayFailed,
    ChargesSubmitted,
    DecisionRecorded,
    RankPromoted,
    CaseReset,
    SystemNotice,
}

/// Banner shown in the terminal's notification panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseEvent {
    pub schema_version: String,
    pub case_id: String,
    /// Monotone per-session sequence, starting at 1.
    pub sequence: u64,
    pub event_type: CaseEventType,
    /// System log line as the terminal would print it.
    pub message: String,
    pub notification: Option<Notification>,
    pub details: Option<Value>,
}

impl CaseEvent {
    pub fn new(
        case_id: impl Into<String>,
        sequence: u64,
        event_type: CaseEventType,
        message: impl Into<String>,
        notification: Option<Notification>,
        details: Option<Value>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            case_id: case_id.into(),
            sequence,
            event_type,
            message: message.into(),
            notification,
            details,
        }
    }
}
