//! REST API over a [`SessionStore`].

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use derive_more::{Display, Error};
use knight_swap_rules::{Move, Replay, ReplayError};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument, warn};

use crate::{ReplayFrame, SessionStore, StoreError};

/// Shared state of the router.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn SessionStore>,
}

impl AppState {
    /// Wraps a store for the handlers.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

/// Errors surfaced to HTTP callers as `{"error": message}`.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    /// 404.
    #[display("Session not found")]
    NotFound,
    /// 409: the session is already completed.
    #[display("Session already completed")]
    Conflict,
    /// 400.
    #[display("{}", _0)]
    BadRequest(#[error(not(source))] String),
    /// 422: the stored move log does not replay.
    #[display("{}", _0)]
    Unprocessable(#[error(not(source))] String),
    /// 500.
    #[display("{}", _0)]
    Internal(#[error(not(source))] String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            StoreError::AlreadyCompleted(_) => Self::Conflict,
            StoreError::Corrupt { .. } => Self::Unprocessable(err.to_string()),
            StoreError::Database(_) | StoreError::Remote(_) => {
                error!(error = %err, "Store failure");
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<ReplayError> for ApiError {
    fn from(err: ReplayError) -> Self {
        warn!(error = %err, "Move log does not replay");
        Self::Unprocessable(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Body of `PATCH /api/sessions/{id}`.
///
/// A body carrying `move` is an append, even if it also carries completion fields.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SessionUpdate {
    Append {
        #[serde(rename = "move")]
        mv: Move,
    },
    #[serde(rename_all = "camelCase")]
    Complete {
        complete: bool,
        is_won: bool,
        duration_seconds: u32,
    },
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplayQuery {
    index: Option<i64>,
}

/// Builds the API router.
pub fn router(store: Arc<dyn SessionStore>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/{id}", get(get_session).patch(update_session))
        .route("/api/sessions/{id}/replay", get(replay))
        .with_state(AppState::new(store))
}

/// Serves the API on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
#[instrument(skip_all)]
pub async fn serve(
    listener: TcpListener,
    store: Arc<dyn SessionStore>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Knight swap server listening");
    }
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C.
pub async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[instrument(skip(state))]
async fn create_session(State(state): State<AppState>) -> Result<Response, ApiError> {
    let id = state.store.create_session().await?;
    info!(session_id = %id, "Session created");
    Ok((StatusCode::OK, Json(json!({ "sessionId": id }))).into_response())
}

#[instrument(skip(state))]
async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if query.kind.as_deref() == Some("stats") {
        return Ok(Json(state.store.get_stats().await?).into_response());
    }
    let sessions = state.store.list_sessions().await?;
    debug!(count = sessions.len(), "Sessions listed");
    Ok(Json(sessions).into_response())
}

#[instrument(skip(state))]
async fn stats(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(Json(state.store.get_stats().await?).into_response())
}

#[instrument(skip(state))]
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(state.store.get_session(&id).await?).into_response())
}

#[instrument(skip(state, body), fields(len = body.len()))]
async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let update = serde_json::from_slice::<SessionUpdate>(&body).map_err(|e| {
        debug!(error = %e, "Rejected update body");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;

    match update {
        SessionUpdate::Append { mv } => state.store.append_move(&id, mv).await?,
        SessionUpdate::Complete {
            complete: true,
            is_won,
            duration_seconds,
        } => {
            state
                .store
                .complete_session(&id, is_won, duration_seconds)
                .await?
        }
        SessionUpdate::Complete { complete: false, .. } => {
            return Err(ApiError::BadRequest("Invalid request body".to_string()));
        }
    }
    Ok(Json(json!({ "success": true })).into_response())
}

#[instrument(skip(state))]
async fn replay(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<ReplayQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| {
        debug!(error = %e, "Rejected replay query");
        ApiError::BadRequest("Invalid replay index".to_string())
    })?;
    let session = state.store.get_session(&id).await?;
    let mut cursor = Replay::new(session.into_moves());
    // A log that breaks anywhere yields no frames at all.
    cursor.validate()?;
    cursor.seek(query.index.unwrap_or(-1))?;
    let frame = ReplayFrame::capture(&cursor)?;
    debug!(index = frame.index, "Replay frame computed");
    Ok(Json(frame).into_response())
}
