//! First-class invariants for a live puzzle.
//!
//! Invariants are logical properties that must hold after every move.
//! The state machine checks them in debug builds; tests check them directly.

use crate::{PuzzleGame, Side, board_at_index};

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together.
pub trait InvariantSet<S> {
    /// Checks all invariants, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let violations: Vec<_> = [
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
            (I3::holds(state), I3::description()),
        ]
        .into_iter()
        .filter(|(holds, _)| !holds)
        .map(|(_, description)| InvariantViolation::new(description))
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Invariant: two knights per side, always.
pub struct PieceConservation;

impl Invariant<PuzzleGame> for PieceConservation {
    fn holds(game: &PuzzleGame) -> bool {
        let board = game.board();
        board.count(Side::White) == 2 && board.count(Side::Black) == 2
    }

    fn description() -> &'static str {
        "Each side keeps exactly two knights"
    }
}

/// Invariant: replaying the move log from the initial layout yields the live board.
pub struct LogReplaysToBoard;

impl Invariant<PuzzleGame> for LogReplaysToBoard {
    fn holds(game: &PuzzleGame) -> bool {
        let last = game.moves().len() as i64 - 1;
        board_at_index(game.moves(), last).is_ok_and(|board| &board == game.board())
    }

    fn description() -> &'static str {
        "Move log replays to the live board"
    }
}

/// Invariant: move timestamps never decrease.
pub struct MonotonicTimestamps;

impl Invariant<PuzzleGame> for MonotonicTimestamps {
    fn holds(game: &PuzzleGame) -> bool {
        game.moves()
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    }

    fn description() -> &'static str {
        "Move timestamps are non-decreasing"
    }
}

/// All puzzle invariants as a composable set.
pub type KnightSwapInvariants = (PieceConservation, LogReplaysToBoard, MonotonicTimestamps);
