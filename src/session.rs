//! Persisted game sessions and aggregate statistics.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use knight_swap_rules::{Board, Move, Replay, ReplayError};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Opaque unique identifier of a session.
pub type SessionId = String;

/// Lifecycle state of a stored session, derived from its completion fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    /// Not completed yet.
    InProgress,
    /// Completed with the puzzle solved.
    Won,
    /// Completed without solving (reset or quit).
    Abandoned,
}

impl SessionStatus {
    /// Derives the status from the stored completion fields.
    pub fn derive(completed: bool, is_won: bool) -> Self {
        match (completed, is_won) {
            (false, _) => Self::InProgress,
            (true, true) => Self::Won,
            (true, false) => Self::Abandoned,
        }
    }
}

/// One played game with its full move log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Session {
    id: SessionId,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    is_won: bool,
    total_moves: u32,
    duration_seconds: Option<u32>,
    moves: Vec<Move>,
}

impl Session {
    /// Assembles a session from stored parts.
    #[instrument(skip(summary, moves), fields(session_id = %summary.id))]
    pub fn from_parts(summary: SessionSummary, moves: Vec<Move>) -> Self {
        Self {
            id: summary.id,
            started_at: summary.started_at,
            completed_at: summary.completed_at,
            is_won: summary.is_won,
            total_moves: summary.total_moves,
            duration_seconds: summary.duration_seconds,
            moves,
        }
    }

    /// Lifecycle state of the session.
    pub fn status(&self) -> SessionStatus {
        SessionStatus::derive(self.completed_at.is_some(), self.is_won)
    }

    /// Consumes the session, returning its move log.
    pub fn into_moves(self) -> Vec<Move> {
        self.moves
    }
}

/// A session without its move log, as returned by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct SessionSummary {
    id: SessionId,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    is_won: bool,
    total_moves: u32,
    duration_seconds: Option<u32>,
    status: SessionStatus,
}

impl SessionSummary {
    /// Creates a summary; the status is derived from the completion fields.
    pub fn new(
        id: SessionId,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        is_won: bool,
        total_moves: u32,
        duration_seconds: Option<u32>,
    ) -> Self {
        Self {
            status: SessionStatus::derive(completed_at.is_some(), is_won),
            id,
            started_at,
            completed_at,
            is_won,
            total_moves,
            duration_seconds,
        }
    }
}

/// Aggregate over all sessions. Move and time figures cover won sessions only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Stats {
    total_games: u32,
    wins: u32,
    avg_moves_to_win: Option<f64>,
    avg_time_to_win: Option<f64>,
    best_moves: Option<u32>,
    best_time: Option<u32>,
}

impl Stats {
    /// Computes stats from the session count and `(total_moves, duration_seconds)` of won sessions.
    ///
    /// Won sessions without a duration count toward move figures but not time figures.
    #[instrument(skip(won))]
    pub fn compute(total_games: u32, won: &[(u32, Option<u32>)]) -> Self {
        let moves: Vec<u32> = won.iter().map(|(moves, _)| *moves).collect();
        let times: Vec<u32> = won.iter().filter_map(|(_, time)| *time).collect();

        Self {
            total_games,
            wins: won.len() as u32,
            avg_moves_to_win: average(&moves),
            avg_time_to_win: average(&times),
            best_moves: moves.iter().copied().min(),
            best_time: times.iter().copied().min(),
        }
    }

    /// Win rate as a percentage (0.0–100.0).
    pub fn win_rate(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            (self.wins as f64 / self.total_games as f64) * 100.0
        }
    }
}

/// Board state at one replay index, with the move that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Clamped index; -1 is the initial layout.
    pub index: i64,
    /// Board after the move at `index`.
    pub board: Board,
    /// Move at `index`, if any.
    #[serde(rename = "move")]
    pub mv: Option<Move>,
}

impl ReplayFrame {
    /// Captures the cursor's current position.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Corrupt`] when the log does not replay.
    pub fn capture(replay: &Replay) -> Result<Self, ReplayError> {
        Ok(Self {
            index: replay.index(),
            board: replay.board()?,
            mv: replay.current_move().copied(),
        })
    }
}

fn average(values: &[u32]) -> Option<f64> {
    (!values.is_empty())
        .then(|| values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64)
}
