//! In-process portal facade: session orchestration, gateway calls, and the
//! SQLite-backed progression record with write-through persistence.

mod gateway;
mod persistence;
mod server;

use std::fmt;
use std::path::Path;

use contracts::{
    CaseEvent, CaseStatus, ChargeSubmission, ContactKey, ContactSnapshot, Decision, PortalConfig,
    ProgressionRecord,
};
use portal_core::contacts::ContactUnavailable;
use portal_core::progression::{evaluate_promotion, Promotion};
use portal_core::scoring::apply_verdict;
use portal_core::session::{CaseSession, SessionError};

pub use gateway::{GatewayClient, GatewayError};
pub use persistence::{PersistenceError, SqliteStatsStore};
pub use server::{serve, ServerError};

const EMPTY_REPLY_PLACEHOLDER: &str = "(no response)";

#[derive(Debug)]
pub enum PortalError {
    Session(SessionError),
    Gateway(GatewayError),
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(err) => err.fmt(f),
            Self::Gateway(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for PortalError {}

impl From<SessionError> for PortalError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

#[derive(Debug, Clone)]
pub struct ReplyOutcome {
    pub contact: ContactKey,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct VerdictOutcome {
    pub verdict_text: String,
    pub decision: Decision,
    pub promotion: Option<Promotion>,
    pub record: ProgressionRecord,
}

#[derive(Debug)]
pub struct PortalApi {
    session: CaseSession,
    record: ProgressionRecord,
    gateway: GatewayClient,
    store: Option<SqliteStatsStore>,
    last_persistence_error: Option<String>,
}

impl PortalApi {
    pub fn from_config(config: PortalConfig) -> Self {
        let gateway = GatewayClient::new(config.gateway_base_url.clone());
        Self {
            session: CaseSession::new(config),
            record: ProgressionRecord::default(),
            gateway,
            store: None,
            last_persistence_error: None,
        }
    }

    /// Attach the stats store and load the persisted record once. A corrupt
    /// record silently decodes to defaults; only the sqlite open itself can
    /// fail.
    pub fn attach_sqlite_store(&mut self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let store = SqliteStatsStore::open(path)?;
        self.record = store.load_record()?;
        self.store = Some(store);
        Ok(())
    }

    pub fn case_id(&self) -> &str {
        &self.session.config().case_id
    }

    pub fn session(&self) -> &CaseSession {
        &self.session
    }

    pub fn status(&self) -> CaseStatus {
        self.session.status()
    }

    pub fn events(&self) -> &[CaseEvent] {
        self.session.events()
    }

    pub fn progression(&self) -> &ProgressionRecord {
        &self.record
    }

    pub fn last_persistence_error(&self) -> Option<&str> {
        self.last_persistence_error.as_deref()
    }

    pub fn select_contact(
        &mut self,
        key: ContactKey,
    ) -> Result<ContactSnapshot, ContactUnavailable> {
        self.session.select_contact(key)
    }

    /// Send a player line to the active contact and wait for the remote
    /// reply. On gateway failure the session keeps the player line, records
    /// the error notice, and is otherwise unchanged.
    pub async fn send_message(&mut self, text: &str) -> Result<ReplyOutcome, PortalError> {
        let contact = self.session.record_player_message(text)?;
        let transcript_text = self.session.transcript_text();

        match self
            .gateway
            .request_reply(contact.as_str(), &transcript_text, text.trim())
            .await
        {
            Ok(reply) => {
                let display = if reply.trim().is_empty() {
                    EMPTY_REPLY_PLACEHOLDER.to_string()
                } else {
                    reply
                };
                self.session.record_reply(contact, &display);
                Ok(ReplyOutcome {
                    contact,
                    text: display,
                })
            }
            Err(err) => {
                self.session.record_reply_failure(&err.user_message());
                Err(PortalError::Gateway(err))
            }
        }
    }

    /// File charges: adjudicate remotely, score the verdict, re-evaluate the
    /// rank, and persist. The record is written even when the decision tag
    /// fails to parse, matching the terminal's unconditional save.
    pub async fn file_charges(
        &mut self,
        submission: &ChargeSubmission,
    ) -> Result<VerdictOutcome, PortalError> {
        self.session.begin_charge_submission(submission)?;
        let transcript_text = self.session.transcript_text();

        match self
            .gateway
            .request_adjudication(&transcript_text, submission)
            .await
        {
            Ok(raw) => {
                let narrative = raw.trim().to_string();
                let (decision, promotion) = self.score_verdict(&narrative);

                if let Some(promotion) = &promotion {
                    self.session.record_promotion(promotion);
                }
                let display = if narrative.is_empty() {
                    EMPTY_REPLY_PLACEHOLDER.to_string()
                } else {
                    narrative
                };
                self.session.record_verdict(decision, &display);

                Ok(VerdictOutcome {
                    verdict_text: display,
                    decision,
                    promotion,
                    record: self.record.clone(),
                })
            }
            Err(err) => {
                self.session.record_prosecution_failure(&err.user_message());
                Err(PortalError::Gateway(err))
            }
        }
    }

    /// Offline scoring path used by the drill subcommand: same scoring,
    /// promotion, and write-through, no gateway.
    pub fn apply_verdict_text(&mut self, raw: &str) -> (Decision, Option<Promotion>) {
        self.score_verdict(raw)
    }

    /// Clears session state only; the persisted progression record stays.
    pub fn reset_case(&mut self) {
        self.session.reset_case();
    }

    fn score_verdict(&mut self, raw: &str) -> (Decision, Option<Promotion>) {
        let decision = apply_verdict(&mut self.record, raw);
        self.flush_record();

        // An unparseable verdict cannot grow the decision count, so rank
        // evaluation is skipped outright.
        if decision == Decision::Unknown {
            return (decision, None);
        }

        let promotion = evaluate_promotion(&mut self.record);
        if promotion.is_some() {
            self.flush_record();
        }

        (decision, promotion)
    }

    fn flush_record(&mut self) {
        let Some(store) = self.store.as_ref() else {
            return;
        };

        match store.save_record(&self.record) {
            Ok(()) => self.last_persistence_error = None,
            Err(err) => self.last_persistence_error = Some(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CaseEventType, SignalState};

    fn temp_db_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();

        std::env::temp_dir().join(format!("portal_api_{name}_{nanos}.sqlite"))
    }

    fn cleanup(path: &std::path::Path) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("sqlite-wal"));
        let _ = std::fs::remove_file(path.with_extension("sqlite-shm"));
    }

    #[test]
    fn drill_path_scores_promotes_and_persists() {
        let path = temp_db_path("drill");
        let mut api = PortalApi::from_config(PortalConfig::default());
        api.attach_sqlite_store(&path).expect("attach store");

        for _ in 0..3 {
            api.apply_verdict_text("DECISION: ACCEPT");
        }

        assert_eq!(api.progression().rank_index, 1);
        assert_eq!(api.progression().total_decisions, 3);

        let store = SqliteStatsStore::open(&path).expect("reopen");
        let loaded = store.load_record().expect("load");
        assert_eq!(&loaded, api.progression());

        cleanup(&path);
    }

    #[test]
    fn progression_survives_case_reset() {
        let path = temp_db_path("reset");
        let mut api = PortalApi::from_config(PortalConfig::default());
        api.attach_sqlite_store(&path).expect("attach store");

        api.apply_verdict_text("DECISION: ACCEPT");
        let record_before = api.progression().clone();

        api.select_contact(ContactKey::Patient).expect("available");
        api.reset_case();

        assert_eq!(api.progression(), &record_before);
        assert_eq!(api.status().signal, SignalState::Idle);
        assert_eq!(api.status().transcript_lines, 0);

        cleanup(&path);
    }

    #[test]
    fn attach_reloads_the_previous_career() {
        let path = temp_db_path("reload");

        {
            let mut api = PortalApi::from_config(PortalConfig::default());
            api.attach_sqlite_store(&path).expect("attach store");
            api.apply_verdict_text("DECISION: ACCEPT");
            api.apply_verdict_text("DECISION: REJECT");
        }

        let mut api = PortalApi::from_config(PortalConfig::default());
        api.attach_sqlite_store(&path).expect("attach store");
        assert_eq!(api.progression().accepted, 1);
        assert_eq!(api.progression().rejected, 1);
        assert_eq!(api.progression().total_decisions, 2);

        cleanup(&path);
    }

    #[test]
    fn unknown_verdict_still_writes_through() {
        let path = temp_db_path("unknown");
        let mut api = PortalApi::from_config(PortalConfig::default());
        api.attach_sqlite_store(&path).expect("attach store");

        let (decision, promotion) = api.apply_verdict_text("the prosecutor is silent");
        assert_eq!(decision, Decision::Unknown);
        assert!(promotion.is_none());
        assert!(api.last_persistence_error().is_none());

        cleanup(&path);
    }

    #[tokio::test]
    async fn send_message_without_contact_fails_before_the_gateway() {
        let mut api = PortalApi::from_config(PortalConfig::default());

        let err = api.send_message("hello?").await.expect_err("no contact");
        assert!(matches!(
            err,
            PortalError::Session(SessionError::NoActiveContact)
        ));
    }

    #[tokio::test]
    async fn unreachable_gateway_surfaces_and_leaves_state_stable() {
        let mut config = PortalConfig::default();
        // Reserved port with nothing listening.
        config.gateway_base_url = "http://127.0.0.1:9".to_string();
        let mut api = PortalApi::from_config(config);

        api.select_contact(ContactKey::Patient).expect("available");
        let err = api
            .send_message("Is anyone there?")
            .await
            .expect_err("transport failure");
        assert!(matches!(err, PortalError::Gateway(_)));

        assert_eq!(api.status().signal, SignalState::Stable);
        let last_event = api.events().last().expect("event");
        assert_eq!(last_event.event_type, CaseEventType::GatewayFailed);
        assert_eq!(api.progression(), &ProgressionRecord::default());
    }
}
