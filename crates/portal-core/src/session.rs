//! Session aggregate: glues contacts, transcript, and signal state together
//! and records every state change as a `CaseEvent`. The event log is the
//! only channel to the presentation layer; no rendering is reachable from
//! here.

use std::fmt;

use contracts::{
    CaseEvent, CaseEventType, CaseStatus, ChargeSubmission, ContactKey, ContactSnapshot,
    ContactStatus, Decision, Notification, PortalConfig, Sender, SignalState, TranscriptLine,
};
use serde_json::json;

use crate::contacts::{ContactRegistry, ContactUnavailable};
use crate::progression::Promotion;
use crate::transcript::TranscriptLog;

/// Session-local failures. Everything here degrades to a visible notice;
/// nothing is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    ContactUnavailable(ContactUnavailable),
    NoActiveContact,
    EmptyMessage,
    EmptyTranscript,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContactUnavailable(inner) => inner.fmt(f),
            Self::NoActiveContact => write!(f, "no active contact selected"),
            Self::EmptyMessage => write!(f, "message text is empty"),
            Self::EmptyTranscript => write!(f, "transcript is empty; investigate before filing"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ContactUnavailable> for SessionError {
    fn from(value: ContactUnavailable) -> Self {
        Self::ContactUnavailable(value)
    }
}

#[derive(Debug)]
pub struct CaseSession {
    config: PortalConfig,
    contacts: ContactRegistry,
    transcript: TranscriptLog,
    active_contact: Option<ContactKey>,
    signal: SignalState,
    events: Vec<CaseEvent>,
    event_sequence: u64,
}

impl CaseSession {
    pub fn new(config: PortalConfig) -> Self {
        let contacts = ContactRegistry::new(config.contact_patience);
        Self {
            config,
            contacts,
            transcript: TranscriptLog::new(),
            active_contact: None,
            signal: SignalState::Idle,
            events: Vec::new(),
            event_sequence: 0,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn active_contact(&self) -> Option<ContactKey> {
        self.active_contact
    }

    pub fn signal(&self) -> SignalState {
        self.signal
    }

    pub fn contact_snapshots(&self) -> Vec<ContactSnapshot> {
        self.contacts.snapshots()
    }

    pub fn transcript_lines(&self) -> &[TranscriptLine] {
        self.transcript.lines()
    }

    /// Full transcript rendered as the gateway context string.
    pub fn transcript_text(&self) -> String {
        self.transcript.as_plain_text()
    }

    pub fn events(&self) -> &[CaseEvent] {
        &self.events
    }

    pub fn status(&self) -> CaseStatus {
        CaseStatus {
            schema_version: contracts::SCHEMA_VERSION_V1.to_string(),
            case_id: self.config.case_id.clone(),
            active_contact: self.active_contact,
            signal: self.signal,
            transcript_lines: self.transcript.len(),
            contacts_available: self.contacts.available_count(),
        }
    }

    /// Make a contact the active call target. A refused selection leaves the
    /// registry untouched and only records the refusal notice.
    pub fn select_contact(
        &mut self,
        key: ContactKey,
    ) -> Result<ContactSnapshot, ContactUnavailable> {
        let snapshot = match self.contacts.select(key) {
            Ok(snapshot) => snapshot,
            Err(refused) => {
                self.push_event(
                    CaseEventType::ContactRefused,
                    format!("CONTACT {} UNAVAILABLE.", key.display_name()),
                    Some(Notification::new(
                        "CONTACT UNAVAILABLE",
                        format!("{} is not accepting further calls.", key.display_name()),
                    )),
                    None,
                );
                return Err(refused);
            }
        };

        self.active_contact = Some(key);
        self.signal = SignalState::Stable;
        self.transcript.append(
            Sender::System,
            format!("CONNECTED: {}. (Phone line audio)", key.display_name()),
        );

        let depleted = snapshot.status == ContactStatus::Unavailable;
        let connect_notification = if depleted {
            None
        } else {
            Some(Notification::new(
                "CALL READY",
                format!(
                    "Interrogating {}. Keep it tight; contacts can stop cooperating.",
                    key.display_name()
                ),
            ))
        };

        self.push_event(
            CaseEventType::ContactConnected,
            format!("CALL SESSION READY: {}", key.display_name()),
            connect_notification,
            Some(json!({ "contact": key.as_str(), "contact_count": snapshot.contact_count })),
        );

        if depleted {
            self.push_event(
                CaseEventType::ContactDepleted,
                format!("SOFT PRESSURE: {} set to UNAVAILABLE.", key.display_name()),
                Some(Notification::new(
                    "SOFT PRESSURE",
                    format!(
                        "{} stops responding after repeated contacts.",
                        key.display_name()
                    ),
                )),
                None,
            );
        }

        Ok(snapshot)
    }

    /// Append the player's line and mark the remote call in flight. Returns
    /// the contact the gateway should answer as.
    pub fn record_player_message(&mut self, text: &str) -> Result<ContactKey, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let Some(active) = self.active_contact else {
            self.transcript
                .append(Sender::System, "SELECT A CONTACT BEFORE SENDING.");
            self.push_event(
                CaseEventType::SystemNotice,
                "No active contact selected.",
                None,
                None,
            );
            return Err(SessionError::NoActiveContact);
        };

        self.transcript.append(Sender::Player, text);
        self.signal = SignalState::Processing;
        self.push_event(
            CaseEventType::MessageSent,
            format!("SENT TO {}: \"{}\"", active.sender_label(), text),
            None,
            Some(json!({ "contact": active.as_str() })),
        );

        Ok(active)
    }

    pub fn record_reply(&mut self, contact: ContactKey, text: &str) {
        self.transcript
            .append(Sender::Contact { key: contact }, text);
        self.signal = SignalState::Stable;
        self.push_event(
            CaseEventType::ReplyReceived,
            format!("REPLY FROM {}.", contact.sender_label()),
            None,
            None,
        );
    }

    /// A failed dialogue call surfaces verbatim as a SYSTEM line; the
    /// exchange is not recorded as successful.
    pub fn record_reply_failure(&mut self, message: &str) {
        self.transcript
            .append(Sender::System, format!("ERROR: {message}"));
        self.signal = SignalState::Stable;
        self.push_event(
            CaseEventType::GatewayFailed,
            "API ERROR.",
            Some(Notification::new("ERROR", message)),
            None,
        );
    }

    /// Validate and mark the charge submission in flight.
    pub fn begin_charge_submission(
        &mut self,
        submission: &ChargeSubmission,
    ) -> Result<(), SessionError> {
        if self.transcript.is_empty() {
            self.transcript
                .append(Sender::System, "NO TRANSCRIPT. INVESTIGATE BEFORE FILING.");
            self.push_event(
                CaseEventType::SystemNotice,
                "NO TRANSCRIPT. INVESTIGATE BEFORE FILING.",
                Some(Notification::new(
                    "NO TRANSCRIPT",
                    "Investigate before filing charges.",
                )),
                None,
            );
            return Err(SessionError::EmptyTranscript);
        }

        self.signal = SignalState::Submitting;
        self.push_event(
            CaseEventType::ChargesSubmitted,
            format!(
                "CHARGES SUBMITTED: {} - {}",
                submission.charge_target, submission.charge_type
            ),
            None,
            Some(json!({
                "charge_target": submission.charge_target,
                "charge_type": submission.charge_type,
            })),
        );

        Ok(())
    }

    pub fn record_prosecution_failure(&mut self, message: &str) {
        self.transcript
            .append(Sender::System, format!("PROSECUTOR ERROR: {message}"));
        self.signal = SignalState::Stable;
        self.push_event(
            CaseEventType::GatewayFailed,
            "PROSECUTOR ERROR.",
            Some(Notification::new("PROSECUTOR ERROR", message)),
            None,
        );
    }

    pub fn record_promotion(&mut self, promotion: &Promotion) {
        self.push_event(
            CaseEventType::RankPromoted,
            format!(
                "PROMOTION: Access level increased to {}.",
                promotion.rank_name
            ),
            Some(Notification::new(
                "ACCESS LEVEL UPDATED",
                format!("Promotion granted: {}.", promotion.rank_name),
            )),
            Some(json!({
                "rank_index": promotion.rank_index,
                "rank_name": promotion.rank_name,
            })),
        );
    }

    /// Record the prosecutor's review. The narrative is surfaced even when
    /// the decision tag failed to parse.
    pub fn record_verdict(&mut self, decision: Decision, narrative: &str) {
        self.signal = SignalState::Stable;
        self.push_event(
            CaseEventType::DecisionRecorded,
            format!("PROSECUTOR DECISION: {decision}"),
            Some(Notification::new(
                "PROSECUTOR REVIEW COMPLETE",
                format!("Decision: {decision}. Your record has been updated."),
            )),
            Some(json!({
                "decision": decision.as_str(),
                "verdict_text": narrative,
            })),
        );
    }

    /// Clear session state: transcript, contact availability, active call,
    /// signal. The persisted progression record is deliberately untouched.
    pub fn reset_case(&mut self) {
        self.transcript.clear();
        self.contacts.reset_all();
        self.active_contact = None;
        self.signal = SignalState::Idle;
        self.push_event(
            CaseEventType::CaseReset,
            "CASE RESET.",
            Some(Notification::new(
                "CASE RESET",
                "Case state cleared. Contacts restored.",
            )),
            None,
        );
    }

    fn push_event(
        &mut self,
        event_type: CaseEventType,
        message: impl Into<String>,
        notification: Option<Notification>,
        details: Option<serde_json::Value>,
    ) {
        self.event_sequence += 1;
        self.events.push(CaseEvent::new(
            self.config.case_id.clone(),
            self.event_sequence,
            event_type,
            message,
            notification,
            details,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CaseSession {
        CaseSession::new(PortalConfig::default())
    }

    fn last_event(session: &CaseSession) -> &CaseEvent {
        session.events().last().expect("at least one event")
    }

    #[test]
    fn selecting_a_contact_connects_and_stabilizes_the_signal() {
        let mut session = session();

        let snapshot = session
            .select_contact(ContactKey::Patient)
            .expect("available");
        assert_eq!(snapshot.contact_count, 1);
        assert_eq!(session.active_contact(), Some(ContactKey::Patient));
        assert_eq!(session.signal(), SignalState::Stable);

        let lines = session.transcript_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].text,
            "CONNECTED: PATIENT WITNESS. (Phone line audio)"
        );
        assert_eq!(
            last_event(&session).event_type,
            CaseEventType::ContactConnected
        );
    }

    #[test]
    fn fourth_selection_emits_the_soft_pressure_event() {
        let mut session = session();
        for _ in 0..4 {
            session.select_contact(ContactKey::Patient).expect("selectable");
        }

        let event = last_event(&session);
        assert_eq!(event.event_type, CaseEventType::ContactDepleted);
        let notification = event.notification.as_ref().expect("notification");
        assert_eq!(notification.title, "SOFT PRESSURE");
    }

    #[test]
    fn refused_selection_records_the_notice_without_state_change() {
        let mut session = session();
        for _ in 0..4 {
            session.select_contact(ContactKey::Patient).expect("selectable");
        }
        let transcript_before = session.transcript_lines().len();

        let refused = session.select_contact(ContactKey::Patient);
        assert!(refused.is_err());
        assert_eq!(session.transcript_lines().len(), transcript_before);
        assert_eq!(
            last_event(&session).event_type,
            CaseEventType::ContactRefused
        );
    }

    #[test]
    fn message_without_active_contact_is_rejected_with_a_system_line() {
        let mut session = session();

        let result = session.record_player_message("hello?");
        assert_eq!(result, Err(SessionError::NoActiveContact));

        let lines = session.transcript_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "SELECT A CONTACT BEFORE SENDING.");
        assert_eq!(session.signal(), SignalState::Idle);
    }

    #[test]
    fn empty_message_is_rejected_silently() {
        let mut session = session();
        session.select_contact(ContactKey::Billing).expect("available");
        let events_before = session.events().len();

        let result = session.record_player_message("   ");
        assert_eq!(result, Err(SessionError::EmptyMessage));
        assert_eq!(session.events().len(), events_before);
    }

    #[test]
    fn message_and_reply_round_trip_sets_signal_states() {
        let mut session = session();
        session.select_contact(ContactKey::Billing).expect("available");

        let contact = session
            .record_player_message("Walk me through the coding.")
            .expect("active contact");
        assert_eq!(session.signal(), SignalState::Processing);

        session.record_reply(contact, "Every line item is automatic.");
        assert_eq!(session.signal(), SignalState::Stable);

        let text = session.transcript_text();
        assert!(text.contains("YOU: Walk me through the coding."));
        assert!(text.contains("BILLING: Every line item is automatic."));
    }

    #[test]
    fn gateway_failure_surfaces_as_a_system_line() {
        let mut session = session();
        session.select_contact(ContactKey::Patient).expect("available");
        session
            .record_player_message("Anything else?")
            .expect("active contact");

        session.record_reply_failure("upstream unavailable");

        assert_eq!(session.signal(), SignalState::Stable);
        let last_line = session.transcript_lines().last().expect("line");
        assert_eq!(last_line.sender, Sender::System);
        assert_eq!(last_line.text, "ERROR: upstream unavailable");
    }

    #[test]
    fn filing_without_transcript_is_refused() {
        let mut session = session();
        let submission = ChargeSubmission {
            charge_target: "RECEPTION".to_string(),
            charge_type: "False Reporting".to_string(),
            evidence_notes: String::new(),
        };

        let result = session.begin_charge_submission(&submission);
        assert_eq!(result, Err(SessionError::EmptyTranscript));
        assert_eq!(session.signal(), SignalState::Idle);
    }

    #[test]
    fn charge_submission_moves_the_signal_to_submitting() {
        let mut session = session();
        session.select_contact(ContactKey::Reception).expect("available");
        let submission = ChargeSubmission {
            charge_target: "RECEPTION".to_string(),
            charge_type: "Administrative Negligence".to_string(),
            evidence_notes: "Witness claims charges were automatic.".to_string(),
        };

        session
            .begin_charge_submission(&submission)
            .expect("transcript present");
        assert_eq!(session.signal(), SignalState::Submitting);
        assert_eq!(
            last_event(&session).event_type,
            CaseEventType::ChargesSubmitted
        );
    }

    #[test]
    fn reset_clears_session_state_and_restores_contacts() {
        let mut session = session();
        for _ in 0..4 {
            session.select_contact(ContactKey::Patient).expect("selectable");
        }
        session
            .record_player_message("On the record.")
            .expect("active contact");

        session.reset_case();

        assert!(session.transcript_lines().is_empty());
        assert_eq!(session.active_contact(), None);
        assert_eq!(session.signal(), SignalState::Idle);
        for snapshot in session.contact_snapshots() {
            assert_eq!(snapshot.status, ContactStatus::Available);
            assert_eq!(snapshot.contact_count, 0);
        }
    }

    #[test]
    fn event_sequence_is_monotone() {
        let mut session = session();
        session.select_contact(ContactKey::Patient).expect("available");
        session
            .record_player_message("First question.")
            .expect("active contact");
        session.record_reply(ContactKey::Patient, "First answer.");

        let sequences: Vec<u64> = session.events().iter().map(|event| event.sequence).collect();
        let mut sorted = sequences.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sequences, sorted);
        assert_eq!(sequences.first(), Some(&1));
    }
}
