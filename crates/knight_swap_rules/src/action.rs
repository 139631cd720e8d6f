//! Moves as first-class domain events.
//!
//! A move records which knight jumped where and when. Moves are what the
//! store persists and what replay folds over, so applying one is a pure
//! function of the board.

use crate::{Board, Cell, Position, Side};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A knight jump.
///
/// Serialized as `{"from":{"row","col"},"to":{"row","col"},"piece","timestamp"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Cell the knight leaves.
    pub from: Position,
    /// Cell the knight lands on.
    pub to: Position,
    /// Side of the moving knight.
    pub piece: Side,
    /// Milliseconds since the game clock started.
    pub timestamp: u64,
}

impl Move {
    /// Creates a new move.
    pub fn new(from: Position, to: Position, piece: Side, timestamp: u64) -> Self {
        Self {
            from,
            to,
            piece,
            timestamp,
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} -> {}", self.piece, self.from, self.to)
    }
}

/// Reason a move cannot be applied to a board.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveError {
    /// The origin cell holds no knight.
    #[display("No knight at {_0}")]
    EmptyOrigin(#[error(not(source))] Position),

    /// The destination cell is occupied.
    #[display("Destination {_0} is occupied")]
    OccupiedDestination(#[error(not(source))] Position),

    /// The knight at the origin is not the side the move claims.
    #[display("Knight at {at} is {found}, move claims {claimed}")]
    PieceMismatch {
        /// Origin cell.
        at: Position,
        /// Side actually on the board.
        found: Side,
        /// Side recorded in the move.
        claimed: Side,
    },
}

/// Applies a move, returning the new board.
///
/// Legality of the jump pattern is not checked here; that is the job of
/// [`legal_destinations`](crate::legal_destinations). Only the occupancy
/// preconditions are verified.
///
/// # Errors
///
/// Returns [`MoveError`] when the origin is empty, holds the other side,
/// or the destination is occupied.
#[instrument(level = "trace")]
pub fn try_apply_move(board: &Board, mv: &Move) -> Result<Board, MoveError> {
    let found = board
        .get(mv.from)
        .side()
        .ok_or(MoveError::EmptyOrigin(mv.from))?;
    if found != mv.piece {
        return Err(MoveError::PieceMismatch {
            at: mv.from,
            found,
            claimed: mv.piece,
        });
    }
    if !board.is_empty(mv.to) {
        return Err(MoveError::OccupiedDestination(mv.to));
    }

    let mut next = *board;
    next.set(mv.to, Cell::Knight(found));
    next.set(mv.from, Cell::Empty);
    Ok(next)
}

/// Applies a move that the caller has already validated.
///
/// # Panics
///
/// Panics if the move violates an occupancy precondition. Callers must
/// check legality first; a failure here is a bug, not bad input.
pub fn apply_move(board: &Board, mv: &Move) -> Board {
    match try_apply_move(board, mv) {
        Ok(next) => next,
        Err(e) => panic!("apply_move precondition violated for {mv}: {e}"),
    }
}
