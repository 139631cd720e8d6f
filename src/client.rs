//! HTTP client for the session REST API.

use async_trait::async_trait;
use derive_more::{Display, Error, From};
use knight_swap_rules::Move;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    ReplayFrame, Session, SessionId, SessionStore, SessionSummary, Stats, StoreError,
};

/// Errors returned by [`ApiClient`].
#[derive(Debug, Display, Error, From)]
pub enum ClientError {
    /// Transport or decoding failure.
    #[display("HTTP error: {}", _0)]
    Http(reqwest::Error),
    /// The server has no such session.
    #[display("Session not found: {}", _0)]
    #[from(ignore)]
    NotFound(#[error(not(source))] SessionId),
    /// The server refused a write to a completed session.
    #[display("Session already completed: {}", _0)]
    #[from(ignore)]
    AlreadyCompleted(#[error(not(source))] SessionId),
    /// The server answered with an error status.
    #[display("Server error {}: {}", status, message)]
    #[from(ignore)]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the `error` field, or the status text.
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedBody {
    session_id: SessionId,
}

/// Type-safe client for a running knight swap server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for the server at `base_url` (e.g. `http://127.0.0.1:3000`).
    #[instrument(skip(base_url), fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Creating API client");
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Maps error statuses to [`ClientError`]; 404 and 409 name the session when its id is known.
    async fn check(
        response: reqwest::Response,
        session: Option<&str>,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match (status, session) {
            (StatusCode::NOT_FOUND, Some(id)) => return Err(ClientError::NotFound(id.to_string())),
            (StatusCode::CONFLICT, Some(id)) => {
                return Err(ClientError::AlreadyCompleted(id.to_string()));
            }
            _ => {}
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        warn!(status = status.as_u16(), message = %message, "Server returned an error");
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    /// Checks that the server is up.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<(), ClientError> {
        let response = self.client.get(self.url("/api/health")).send().await?;
        Self::check(response, None).await?;
        Ok(())
    }

    /// Creates a session on the server.
    #[instrument(skip(self))]
    pub async fn create_session(&self) -> Result<SessionId, ClientError> {
        let response = self.client.post(self.url("/api/sessions")).send().await?;
        let body: CreatedBody = Self::check(response, None).await?.json().await?;
        debug!(session_id = %body.session_id, "Session created remotely");
        Ok(body.session_id)
    }

    /// Appends a move to a session.
    #[instrument(skip(self, mv), fields(session_id = %id, mv = %mv))]
    pub async fn append_move(&self, id: &str, mv: Move) -> Result<(), ClientError> {
        let response = self
            .client
            .patch(self.url(&format!("/api/sessions/{}", id)))
            .json(&serde_json::json!({ "move": mv }))
            .send()
            .await?;
        Self::check(response, Some(id)).await?;
        Ok(())
    }

    /// Marks a session completed.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn complete_session(
        &self,
        id: &str,
        is_won: bool,
        duration_seconds: u32,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .patch(self.url(&format!("/api/sessions/{}", id)))
            .json(&serde_json::json!({
                "complete": true,
                "isWon": is_won,
                "durationSeconds": duration_seconds,
            }))
            .send()
            .await?;
        Self::check(response, Some(id)).await?;
        Ok(())
    }

    /// Fetches a session with its move log.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn get_session(&self, id: &str) -> Result<Session, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/sessions/{}", id)))
            .send()
            .await?;
        Ok(Self::check(response, Some(id)).await?.json().await?)
    }

    /// Lists recent sessions, newest first.
    #[instrument(skip(self))]
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ClientError> {
        let response = self.client.get(self.url("/api/sessions")).send().await?;
        Ok(Self::check(response, None).await?.json().await?)
    }

    /// Fetches aggregate statistics.
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<Stats, ClientError> {
        let response = self
            .client
            .get(self.url("/api/sessions?type=stats"))
            .send()
            .await?;
        Ok(Self::check(response, None).await?.json().await?)
    }

    /// Fetches the board at a replay index computed by the server.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn replay_frame(&self, id: &str, index: i64) -> Result<ReplayFrame, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/sessions/{}/replay?index={}", id, index)))
            .send()
            .await?;
        Ok(Self::check(response, Some(id)).await?.json().await?)
    }
}

#[async_trait]
impl SessionStore for ApiClient {
    async fn create_session(&self) -> Result<SessionId, StoreError> {
        Ok(ApiClient::create_session(self).await?)
    }

    async fn append_move(&self, id: &str, mv: Move) -> Result<(), StoreError> {
        Ok(ApiClient::append_move(self, id, mv).await?)
    }

    async fn complete_session(
        &self,
        id: &str,
        is_won: bool,
        duration_seconds: u32,
    ) -> Result<(), StoreError> {
        Ok(ApiClient::complete_session(self, id, is_won, duration_seconds).await?)
    }

    async fn get_session(&self, id: &str) -> Result<Session, StoreError> {
        Ok(ApiClient::get_session(self, id).await?)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, StoreError> {
        Ok(ApiClient::list_sessions(self).await?)
    }

    async fn get_stats(&self) -> Result<Stats, StoreError> {
        Ok(ApiClient::get_stats(self).await?)
    }
}
