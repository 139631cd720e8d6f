//! Database repository for game sessions.

use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use knight_swap_rules::Move;
use tracing::{debug, info, instrument};

use crate::db::{DbError, DbErrorKind, GameSessionRow, NewGameSession, SessionWrite, schema};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Milliseconds SQLite waits on a locked database before failing a statement.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Synchronous repository over the `game_sessions` table.
///
/// Opens a connection per operation; callers on an async runtime should
/// run these methods on a blocking thread.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db_path: String,
}

impl SessionRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// Use `":memory:"` only for single-operation checks; every call opens
    /// a fresh connection, so an in-memory database does not persist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new(DbErrorKind::Config, "database path is empty"));
        }
        info!(path = %db_path, "Creating SessionRepository");
        Ok(Self { db_path })
    }

    /// Path of the database file.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            DbError::new(DbErrorKind::Connection, format!("'{}': {}", self.db_path, e))
        })?;
        conn.batch_execute(&format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"))?;
        Ok(conn)
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(DbErrorKind::Migration, e.to_string()))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(())
    }

    /// Inserts an empty session.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the id is taken or a database error occurs.
    #[instrument(skip(self))]
    pub fn create_session(
        &self,
        id: &str,
        started_at: NaiveDateTime,
    ) -> Result<GameSessionRow, DbError> {
        debug!("Creating session");
        let mut conn = self.connection()?;

        let row = diesel::insert_into(schema::game_sessions::table)
            .values(&NewGameSession::new(id.to_string(), started_at))
            .returning(GameSessionRow::as_returning())
            .get_result(&mut conn)?;

        info!(session_id = %row.id(), "Session created");
        Ok(row)
    }

    /// Gets a session by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn find_session(&self, id: &str) -> Result<Option<GameSessionRow>, DbError> {
        let mut conn = self.connection()?;

        let row = schema::game_sessions::table
            .filter(schema::game_sessions::id.eq(id))
            .select(GameSessionRow::as_select())
            .first(&mut conn)
            .optional()?;

        debug!(found = row.is_some(), "Session lookup");
        Ok(row)
    }

    /// Loads a row that may still be written, or the reason it may not.
    fn writable_row(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Result<GameSessionRow, SessionWrite>, DbError> {
        let row = schema::game_sessions::table
            .filter(schema::game_sessions::id.eq(id))
            .select(GameSessionRow::as_select())
            .first(conn)
            .optional()?;
        Ok(match row {
            None => Err(SessionWrite::Missing),
            Some(row) if row.completed_at().is_some() => Err(SessionWrite::Completed),
            Some(row) => Ok(row),
        })
    }

    /// Appends a move to an unfinished session's log.
    ///
    /// The log and `total_moves` are rewritten together inside one
    /// immediate transaction, so `total_moves` always equals the log length.
    /// Completed sessions are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored log cannot be decoded or a database error occurs.
    #[instrument(skip(self, mv), fields(mv = %mv))]
    pub fn append_move(&self, id: &str, mv: &Move) -> Result<SessionWrite, DbError> {
        let mut conn = self.connection()?;

        conn.immediate_transaction(|conn| {
            let row = match Self::writable_row(conn, id)? {
                Ok(row) => row,
                Err(outcome) => {
                    debug!(?outcome, "Append refused");
                    return Ok(outcome);
                }
            };

            let mut moves = row.decode_moves()?;
            moves.push(*mv);
            let encoded = serde_json::to_string(&moves)?;

            let updated = diesel::update(
                schema::game_sessions::table.filter(schema::game_sessions::id.eq(id)),
            )
            .set((
                schema::game_sessions::moves.eq(encoded),
                schema::game_sessions::total_moves.eq(moves.len() as i32),
            ))
            .returning(GameSessionRow::as_returning())
            .get_result(conn)?;

            debug!(total_moves = updated.total_moves(), "Move appended");
            Ok(SessionWrite::Applied(updated))
        })
    }

    /// Records the completion of an unfinished session.
    ///
    /// Completion is terminal: a second completion leaves the first one in place.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn complete_session(
        &self,
        id: &str,
        is_won: bool,
        duration_seconds: i32,
        completed_at: NaiveDateTime,
    ) -> Result<SessionWrite, DbError> {
        let mut conn = self.connection()?;

        conn.immediate_transaction(|conn| {
            if let Err(outcome) = Self::writable_row(conn, id)? {
                debug!(?outcome, "Completion refused");
                return Ok(outcome);
            }

            let updated = diesel::update(
                schema::game_sessions::table.filter(schema::game_sessions::id.eq(id)),
            )
            .set((
                schema::game_sessions::completed_at.eq(Some(completed_at)),
                schema::game_sessions::is_won.eq(is_won),
                schema::game_sessions::duration_seconds.eq(Some(duration_seconds)),
            ))
            .returning(GameSessionRow::as_returning())
            .get_result(conn)?;

            info!(is_won, "Session completion recorded");
            Ok(SessionWrite::Applied(updated))
        })
    }

    /// Lists sessions, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_recent(&self, limit: i64) -> Result<Vec<GameSessionRow>, DbError> {
        let mut conn = self.connection()?;

        let rows = schema::game_sessions::table
            .order(schema::game_sessions::seq.desc())
            .limit(limit)
            .select(GameSessionRow::as_select())
            .load(&mut conn)?;

        info!(count = rows.len(), "Sessions loaded");
        Ok(rows)
    }

    /// Counts all sessions.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn count_sessions(&self) -> Result<i64, DbError> {
        let mut conn = self.connection()?;
        Ok(schema::game_sessions::table.count().get_result(&mut conn)?)
    }

    /// Move counts and durations of every won session.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn won_results(&self) -> Result<Vec<(i32, Option<i32>)>, DbError> {
        let mut conn = self.connection()?;

        let results = schema::game_sessions::table
            .filter(schema::game_sessions::is_won.eq(true))
            .select((
                schema::game_sessions::total_moves,
                schema::game_sessions::duration_seconds,
            ))
            .load::<(i32, Option<i32>)>(&mut conn)?;

        debug!(count = results.len(), "Won results loaded");
        Ok(results)
    }
}
