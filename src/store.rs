//! Durable session storage.

use async_trait::async_trait;
use chrono::Utc;
use derive_more::{Display, Error};
use knight_swap_rules::Move;
use tracing::{debug, info, instrument, warn};

use crate::{
    ClientError, DbError, GameSessionRow, Session, SessionId, SessionRepository, SessionSummary,
    SessionWrite, Stats,
};

/// Default bound on listing results.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Errors returned by a [`SessionStore`].
#[derive(Debug, Display, Error)]
pub enum StoreError {
    /// No session with this id exists.
    #[display("Session not found: {}", _0)]
    NotFound(#[error(not(source))] SessionId),
    /// The session is already completed and accepts no further writes.
    #[display("Session already completed: {}", _0)]
    AlreadyCompleted(#[error(not(source))] SessionId),
    /// The backing database failed.
    #[display("{}", _0)]
    Database(DbError),
    /// The stored move log cannot be decoded.
    #[display("Corrupt session {}: {}", id, reason)]
    Corrupt {
        /// Affected session.
        id: SessionId,
        /// Decoder message.
        reason: String,
    },
    /// A remote store failed.
    #[display("{}", _0)]
    Remote(ClientError),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        Self::Database(err)
    }
}

impl From<ClientError> for StoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(id) => Self::NotFound(id),
            ClientError::AlreadyCompleted(id) => Self::AlreadyCompleted(id),
            other => Self::Remote(other),
        }
    }
}

/// Persistence operations on game sessions.
///
/// Appends are atomic per call and a completed session is frozen; otherwise
/// concurrent writers on one session id are not coordinated.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates an empty, unfinished session and returns its id.
    async fn create_session(&self) -> Result<SessionId, StoreError>;

    /// Appends a move to the session's log and increments its move count.
    ///
    /// Fails with [`StoreError::AlreadyCompleted`] once the session is completed.
    async fn append_move(&self, id: &str, mv: Move) -> Result<(), StoreError>;

    /// Marks the session completed. Completion happens at most once.
    async fn complete_session(
        &self,
        id: &str,
        is_won: bool,
        duration_seconds: u32,
    ) -> Result<(), StoreError>;

    /// Fetches a session with its full move log.
    async fn get_session(&self, id: &str) -> Result<Session, StoreError>;

    /// Lists sessions, most recent first, bounded by the store's limit.
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, StoreError>;

    /// Aggregates statistics over all sessions.
    async fn get_stats(&self) -> Result<Stats, StoreError>;
}

/// [`SessionStore`] backed by a SQLite file.
///
/// Diesel calls are synchronous and run on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    repository: SessionRepository,
    list_limit: u32,
}

impl SqliteSessionStore {
    /// Opens the database at `db_path`, applying pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty or migrations fail.
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub async fn open(db_path: impl AsRef<str>, list_limit: u32) -> Result<Self, DbError> {
        let repository = SessionRepository::new(db_path.as_ref().to_string())?;
        let migrating = repository.clone();
        tokio::task::spawn_blocking(move || migrating.run_migrations())
            .await??;

        info!(list_limit, "Session store ready");
        Ok(Self {
            repository,
            list_limit,
        })
    }

    /// Underlying repository.
    pub fn repository(&self) -> &SessionRepository {
        &self.repository
    }

    /// Maximum number of sessions returned by [`SessionStore::list_sessions`].
    pub fn list_limit(&self) -> u32 {
        self.list_limit
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&SessionRepository) -> Result<T, StoreError> + Send + 'static,
    {
        let repository = self.repository.clone();
        tokio::task::spawn_blocking(move || op(&repository))
            .await
            .map_err(DbError::from)?
    }
}

fn to_u32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn summary_from_row(row: &GameSessionRow) -> SessionSummary {
    SessionSummary::new(
        row.id().clone(),
        row.started_at().and_utc(),
        (*row.completed_at()).map(|at| at.and_utc()),
        *row.is_won(),
        to_u32(*row.total_moves()),
        (*row.duration_seconds()).map(to_u32),
    )
}

fn check_write(id: &str, outcome: SessionWrite) -> Result<GameSessionRow, StoreError> {
    match outcome {
        SessionWrite::Applied(row) => Ok(row),
        SessionWrite::Missing => Err(StoreError::NotFound(id.to_string())),
        SessionWrite::Completed => {
            warn!(session_id = %id, "Write to a completed session refused");
            Err(StoreError::AlreadyCompleted(id.to_string()))
        }
    }
}

fn session_from_row(row: &GameSessionRow) -> Result<Session, StoreError> {
    let moves = row.decode_moves().map_err(|e| {
        warn!(session_id = %row.id(), error = %e, "Stored move log does not decode");
        StoreError::Corrupt {
            id: row.id().clone(),
            reason: e.to_string(),
        }
    })?;
    Ok(Session::from_parts(summary_from_row(row), moves))
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    #[instrument(skip(self))]
    async fn create_session(&self) -> Result<SessionId, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now().naive_utc();
        let row = self
            .blocking(move |repo| Ok(repo.create_session(&id, started_at)?))
            .await?;
        info!(session_id = %row.id(), "Session started");
        Ok(row.id().clone())
    }

    #[instrument(skip(self, mv), fields(session_id = %id, mv = %mv))]
    async fn append_move(&self, id: &str, mv: Move) -> Result<(), StoreError> {
        let key = id.to_string();
        let outcome = self
            .blocking(move |repo| Ok(repo.append_move(&key, &mv)?))
            .await?;
        let row = check_write(id, outcome)?;
        debug!(total_moves = row.total_moves(), "Move stored");
        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn complete_session(
        &self,
        id: &str,
        is_won: bool,
        duration_seconds: u32,
    ) -> Result<(), StoreError> {
        let key = id.to_string();
        let duration = i32::try_from(duration_seconds).unwrap_or(i32::MAX);
        let completed_at = Utc::now().naive_utc();
        let outcome = self
            .blocking(move |repo| Ok(repo.complete_session(&key, is_won, duration, completed_at)?))
            .await?;
        check_write(id, outcome)?;
        info!(is_won, duration_seconds, "Session completed");
        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn get_session(&self, id: &str) -> Result<Session, StoreError> {
        let key = id.to_string();
        let row = self
            .blocking(move |repo| Ok(repo.find_session(&key)?))
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        session_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, StoreError> {
        let limit = i64::from(self.list_limit);
        let rows = self
            .blocking(move |repo| Ok(repo.list_recent(limit)?))
            .await?;
        Ok(rows.iter().map(summary_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> Result<Stats, StoreError> {
        let (total, won) = self
            .blocking(|repo| Ok((repo.count_sessions()?, repo.won_results()?)))
            .await?;
        let won: Vec<(u32, Option<u32>)> = won
            .into_iter()
            .map(|(moves, time)| (to_u32(moves), time.map(to_u32)))
            .collect();
        let stats = Stats::compute(u32::try_from(total).unwrap_or(u32::MAX), &won);
        debug!(total_games = stats.total_games(), wins = stats.wins(), "Stats computed");
        Ok(stats)
    }
}
