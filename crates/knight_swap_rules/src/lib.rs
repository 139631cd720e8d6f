//! Pure game logic for the knight swap puzzle.
//!
//! Two white knights start on the bottom corners of a 3x3 board and two
//! black knights on the top corners. The puzzle is solved when the sides
//! have traded corners, moving only with knight jumps onto empty cells.
//!
//! # Architecture
//!
//! - **Board**: value type holding the nine cells
//! - **Rules**: legal destinations and the win predicate (pure functions)
//! - **Puzzle**: selection/move state machine for one live game, emitting events
//! - **Replay**: deterministic reconstruction of the board from a move log
//!
//! # Example
//!
//! ```
//! use knight_swap_rules::{Board, Position, legal_destinations};
//!
//! let board = Board::initial();
//! let origin = Position::new(2, 0).unwrap();
//! let targets = legal_destinations(&board, origin);
//! assert!(targets.contains(&Position::new(0, 1).unwrap()));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod invariants;
mod position;
mod puzzle;
mod replay;
mod rules;
mod types;

pub use action::{Move, MoveError, apply_move, try_apply_move};
pub use invariants::{
    Invariant, InvariantSet, InvariantViolation, KnightSwapInvariants, LogReplaysToBoard,
    MonotonicTimestamps, PieceConservation,
};
pub use position::{Position, PositionError};
pub use puzzle::{Completion, GameEvent, PuzzleGame, Selection, SessionPhase};
pub use replay::{Replay, ReplayError, board_at_index, clamp_index};
pub use rules::{KNIGHT_OFFSETS, is_legal, is_won, legal_destinations};
pub use types::{Board, Cell, Side};
