//! Session and progression engine for the investigation portal: contact
//! availability, transcript accumulation, verdict scoring, and rank
//! promotion. Pure state and events; rendering and IO live elsewhere.

pub mod contacts;
pub mod progression;
pub mod scoring;
pub mod session;
pub mod transcript;

pub use contacts::{ContactRegistry, ContactUnavailable};
pub use progression::{evaluate_promotion, Promotion, MIN_DECISIONS, PROMOTION_THRESHOLDS};
pub use scoring::{apply_verdict, parse_decision};
pub use session::{CaseSession, SessionError};
pub use transcript::TranscriptLog;
