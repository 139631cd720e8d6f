//! Deterministic replay of a stored move log.
//!
//! The move log is the only source of truth for historical boards. Every
//! board shown during playback is recomputed from the initial layout, so
//! there is no mutable copy that could drift from the log.

use crate::{Board, Move, MoveError, try_apply_move};
use tracing::{debug, instrument, warn};

/// A stored log that does not replay from the initial layout.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ReplayError {
    /// The move at `index` cannot be applied to the board reached before it.
    #[display("Move {index} does not apply to the replayed board: {source}")]
    Corrupt {
        /// Zero-based position of the offending move in the log.
        index: usize,
        /// Why the move does not apply.
        source: MoveError,
    },
}

/// Clamps a playback index into `-1..=len-1`.
///
/// `-1` denotes the initial layout, so an empty log always clamps to `-1`.
pub fn clamp_index(len: usize, index: i64) -> i64 {
    index.clamp(-1, len as i64 - 1)
}

/// Reconstructs the board after the move at `index`.
///
/// `-1` is the initial layout. Indices past the end clamp to the last
/// move, indices below `-1` clamp to `-1`.
///
/// # Errors
///
/// Returns [`ReplayError::Corrupt`] if any move up to `index` does not
/// apply; the log is damaged and no board is produced.
#[instrument(level = "debug", skip(moves), fields(len = moves.len()))]
pub fn board_at_index(moves: &[Move], index: i64) -> Result<Board, ReplayError> {
    let upto = (clamp_index(moves.len(), index) + 1) as usize;

    moves[..upto]
        .iter()
        .enumerate()
        .try_fold(Board::initial(), |board, (index, mv)| {
            try_apply_move(&board, mv).map_err(|source| {
                warn!(index, %mv, error = %source, "Move log does not replay");
                ReplayError::Corrupt { index, source }
            })
        })
}

/// A playback cursor over one move log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    moves: Vec<Move>,
    index: i64,
}

impl Replay {
    /// Creates a cursor positioned on the initial layout.
    pub fn new(moves: Vec<Move>) -> Self {
        Self { moves, index: -1 }
    }

    /// Replays the whole log once to confirm it is a valid derivation.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] for a corrupt log.
    #[instrument(skip(self), fields(len = self.moves.len()))]
    pub fn validate(&self) -> Result<Board, ReplayError> {
        board_at_index(&self.moves, self.last_index())
    }

    /// The move log.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Current index, `-1` for the initial layout.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Index of the last move, `-1` for an empty log.
    pub fn last_index(&self) -> i64 {
        self.moves.len() as i64 - 1
    }

    /// Checks if the cursor is on the last move.
    pub fn at_end(&self) -> bool {
        self.index >= self.last_index()
    }

    /// The move that produced the current board, if any.
    pub fn current_move(&self) -> Option<&Move> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.moves.get(i))
    }

    /// Board at the current index.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] for a corrupt log.
    pub fn board(&self) -> Result<Board, ReplayError> {
        board_at_index(&self.moves, self.index)
    }

    /// Moves the cursor to `index` (clamped) and returns that board.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] for a corrupt log; the cursor still moves.
    pub fn seek(&mut self, index: i64) -> Result<Board, ReplayError> {
        self.index = clamp_index(self.moves.len(), index);
        debug!(index = self.index, "Replay cursor moved");
        self.board()
    }

    /// Jumps to the initial layout.
    ///
    /// # Errors
    ///
    /// Infallible in practice; kept fallible for a uniform cursor API.
    pub fn first(&mut self) -> Result<Board, ReplayError> {
        self.seek(-1)
    }

    /// Steps back one move.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] for a corrupt log.
    pub fn prev(&mut self) -> Result<Board, ReplayError> {
        self.seek(self.index - 1)
    }

    /// Steps forward one move, stopping at the end.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] for a corrupt log.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Board, ReplayError> {
        self.seek(self.index + 1)
    }

    /// Jumps to the final board.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] for a corrupt log.
    pub fn last(&mut self) -> Result<Board, ReplayError> {
        self.seek(self.last_index())
    }
}
