//! Database models.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use knight_swap_rules::Move;
use tracing::instrument;

use crate::db::schema;

/// Game session row.
///
/// `moves` holds the move log as a JSON array, in application order.
#[derive(Debug, Clone, Queryable, Selectable, Getters)]
#[diesel(table_name = schema::game_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GameSessionRow {
    seq: i32,
    id: String,
    started_at: NaiveDateTime,
    completed_at: Option<NaiveDateTime>,
    is_won: bool,
    total_moves: i32,
    duration_seconds: Option<i32>,
    moves: String,
}

impl GameSessionRow {
    /// Decodes the stored move log.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the column does not hold a move array.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn decode_moves(&self) -> Result<Vec<Move>, serde_json::Error> {
        serde_json::from_str(&self.moves)
    }
}

/// Insertable row for a fresh session; the other columns take their defaults.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::game_sessions)]
pub struct NewGameSession {
    id: String,
    started_at: NaiveDateTime,
}

/// Outcome of a write against one session row.
#[derive(Debug, Clone)]
pub enum SessionWrite {
    /// The write went through; holds the updated row.
    Applied(GameSessionRow),
    /// No session has this id.
    Missing,
    /// The session was already completed and was left untouched.
    Completed,
}
