//! v1 cross-boundary contracts for the case engine, API, persistence, and
//! terminal front end.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod case_file;
pub mod events;

pub use case_file::{CaseFile, CaseTab};
pub use events::{CaseEvent, CaseEventType, Notification};

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Key under which the singleton progression record is persisted.
pub const STATS_RECORD_KEY: &str = "fbi_portal_stats_v1";

/// Agent access levels, lowest first. Promotion walks this table one step at
/// a time.
pub const RANK_NAMES: [&str; 5] = [
    "PROBATIONARY AGENT",
    "FIELD INVESTIGATOR",
    "SENIOR AGENT",
    "CASE SPECIALIST",
    "LEAD INVESTIGATOR",
];

pub fn rank_name(rank_index: usize) -> &'static str {
    RANK_NAMES[rank_index.min(RANK_NAMES.len() - 1)]
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContactKey {
    Patient,
    Reception,
    Billing,
}

impl ContactKey {
    pub const ALL: [ContactKey; 3] = [Self::Patient, Self::Reception, Self::Billing];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Reception => "reception",
            Self::Billing => "billing",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Patient => "PATIENT WITNESS",
            Self::Reception => "RECEPTION SUPERVISOR",
            Self::Billing => "BILLING COORDINATOR",
        }
    }

    /// Upper-cased tag used as the transcript sender label.
    pub fn sender_label(self) -> &'static str {
        match self {
            Self::Patient => "PATIENT",
            Self::Reception => "RECEPTION",
            Self::Billing => "BILLING",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "patient" => Some(Self::Patient),
            "reception" => Some(Self::Reception),
            "billing" => Some(Self::Billing),
            _ => None,
        }
    }
}

impl fmt::Display for ContactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BUSY is declared for forward compatibility; no current rule transitions
/// into it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactStatus {
    Available,
    Busy,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactSnapshot {
    pub key: ContactKey,
    pub display_name: String,
    pub status: ContactStatus,
    pub contact_count: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sender {
    Player,
    System,
    Contact { key: ContactKey },
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Self::Player => "YOU",
            Self::System => "SYSTEM",
            Self::Contact { key } => key.sender_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptLine {
    pub sender: Sender,
    pub text: String,
}

impl fmt::Display for TranscriptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sender.label(), self.text)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalState {
    Idle,
    Stable,
    Processing,
    Submitting,
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "IDLE",
            Self::Stable => "STABLE",
            Self::Processing => "PROCESSING",
            Self::Submitting => "SUBMITTING",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Accept,
    Reject,
    NeedMore,
    Unknown,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
            Self::NeedMore => "NEED MORE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Singleton career record. `total_decisions` counts accepted + rejected
/// only; NEED MORE outcomes are neutral and tracked separately.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionRecord {
    pub rank_index: usize,
    pub accepted: u64,
    pub rejected: u64,
    pub need_more: u64,
    pub total_decisions: u64,
    pub conviction_rate: f64,
}

impl ProgressionRecord {
    /// Re-derive the aggregate fields from the raw counters. Never divides
    /// by zero.
    pub fn recompute(&mut self) {
        self.total_decisions = self.accepted + self.rejected;
        self.conviction_rate = self.accepted as f64 / self.total_decisions.max(1) as f64;
    }

    /// Field-tolerant decode of a persisted payload: each field falls back
    /// to its zero default independently, and `rank_index` is clamped to the
    /// rank table.
    pub fn from_value(value: &Value) -> Self {
        fn counter(value: &Value, key: &str) -> u64 {
            value.get(key).and_then(Value::as_u64).unwrap_or(0)
        }

        let rank_index = value
            .get("rankIndex")
            .and_then(Value::as_u64)
            .map(|raw| raw as usize)
            .unwrap_or(0)
            .min(RANK_NAMES.len() - 1);

        let conviction_rate = value
            .get("convictionRate")
            .and_then(Value::as_f64)
            .filter(|rate| rate.is_finite())
            .unwrap_or(0.0);

        Self {
            rank_index,
            accepted: counter(value, "accepted"),
            rejected: counter(value, "rejected"),
            need_more: counter(value, "needMore"),
            total_decisions: counter(value, "totalDecisions"),
            conviction_rate,
        }
    }

    pub fn rank_name(&self) -> &'static str {
        rank_name(self.rank_index)
    }
}

impl fmt::Display for ProgressionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rank={} accepted={} rejected={} need_more={} total_decisions={} conviction_rate={:.2}",
            self.rank_name(),
            self.accepted,
            self.rejected,
            self.need_more,
            self.total_decisions,
            self.conviction_rate
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortalConfig {
    pub schema_version: String,
    pub case_id: String,
    pub gateway_base_url: String,
    /// Selections a contact tolerates before going unavailable for the
    /// session.
    pub contact_patience: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            case_id: "case_01_104a".to_string(),
            gateway_base_url: "http://127.0.0.1:8791".to_string(),
            contact_patience: 4,
        }
    }
}

/// Charge metadata collected when the player files; field names match the
/// gateway wire contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChargeSubmission {
    pub charge_target: String,
    pub charge_type: String,
    #[serde(default)]
    pub evidence_notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub role_key: String,
    pub transcript_text: String,
    pub player_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProsecuteRequest {
    pub transcript_text: String,
    pub charge_target: String,
    pub charge_type: String,
    pub evidence_notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayReply {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayErrorBody {
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ContactUnavailable,
    NoActiveContact,
    EmptyMessage,
    EmptyTranscript,
    InvalidRequest,
    GatewayError,
    PersistenceFailed,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseStatus {
    pub schema_version: String,
    pub case_id: String,
    pub active_contact: Option<ContactKey>,
    pub signal: SignalState,
    pub transcript_lines: usize,
    pub contacts_available: usize,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "case_id={} signal={} active={} transcript_lines={} contacts_available={}",
            self.case_id,
            self.signal,
            self.active_contact
                .map(ContactKey::as_str)
                .unwrap_or("NONE"),
            self.transcript_lines,
            self.contacts_available
        )
    }
}
