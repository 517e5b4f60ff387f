//! Client side of the remote dialogue/adjudication service. Two JSON POST
//! operations, no retry and no timeout: an unanswered call leaves the
//! session signal in PROCESSING or SUBMITTING.

use std::fmt;

use contracts::{ChargeSubmission, GatewayErrorBody, GatewayReply, ProsecuteRequest, ReplyRequest};
use serde::Serialize;

#[derive(Debug)]
pub enum GatewayError {
    Transport(reqwest::Error),
    Rejected { status: u16, message: String },
}

impl GatewayError {
    /// Message surfaced verbatim to the session, the way the terminal shows
    /// upstream failures.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(err) => err.to_string(),
            Self::Rejected { message, .. } => message.clone(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "gateway transport error: {err}"),
            Self::Rejected { status, message } => {
                write!(f, "gateway rejected request ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the remote service to answer as `role_key`, given the full
    /// transcript context plus the newest player line.
    pub async fn request_reply(
        &self,
        role_key: &str,
        transcript_text: &str,
        player_message: &str,
    ) -> Result<String, GatewayError> {
        let request = ReplyRequest {
            role_key: role_key.to_string(),
            transcript_text: transcript_text.to_string(),
            player_message: player_message.to_string(),
        };

        self.post_for_text("/api/reply", &request).await
    }

    /// Submit the case for adjudication. The returned text is the verdict
    /// narrative; decision parsing happens downstream.
    pub async fn request_adjudication(
        &self,
        transcript_text: &str,
        submission: &ChargeSubmission,
    ) -> Result<String, GatewayError> {
        let request = ProsecuteRequest {
            transcript_text: transcript_text.to_string(),
            charge_target: submission.charge_target.clone(),
            charge_type: submission.charge_type.clone(),
            evidence_notes: submission.evidence_notes.clone(),
        };

        self.post_for_text("/api/prosecute", &request).await
    }

    async fn post_for_text<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let reply = response.json::<GatewayReply>().await?;
            return Ok(reply.text);
        }

        let message = response
            .json::<GatewayErrorBody>()
            .await
            .ok()
            .map(|body| body.error)
            .filter(|error| !error.is_empty())
            .unwrap_or_else(|| "Request failed".to_string());

        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
