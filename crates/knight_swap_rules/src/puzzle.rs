//! Selection and move state machine for one live game.
//!
//! The machine is driven by cell interactions. It is synchronous: every
//! call applies its transition locally and returns the events that a
//! recorder should persist. It never waits on storage.
//!
//! ```text
//!   Idle ──click knight──▶ Selected(origin)
//!    ▲                       │ click legal target: move, back to Idle
//!    │                       │ click other knight: Selected(other)
//!    └──click empty cell─────┘
//! ```
//!
//! Orthogonally the game phase runs `NotStarted → InProgress → Won`, and
//! `abandon` takes an unfinished game back to `NotStarted`.

use crate::{Board, Move, Position, apply_move, is_won, legal_destinations};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

#[cfg(debug_assertions)]
use crate::{InvariantSet, KnightSwapInvariants};

/// Which knight, if any, the player has picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    /// Nothing selected.
    Idle,
    /// A knight is selected and its destinations are highlighted.
    Selected(Position),
}

/// Lifecycle of the game behind the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No move made yet; no session exists.
    NotStarted,
    /// At least one move made, not solved.
    InProgress,
    /// Solved. Further interactions are ignored.
    Won,
}

/// Terminal summary of a game, sent once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Whether the puzzle was solved.
    pub is_won: bool,
    /// Moves made in the game.
    pub total_moves: u32,
    /// Whole seconds since the first move.
    pub duration_seconds: u32,
}

/// Events produced by the state machine for the persistence side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// The first legal move of a game is about to be recorded; create a session.
    SessionStarted,
    /// A move was applied.
    MoveRecorded(Move),
    /// The game was solved or abandoned.
    SessionCompleted(Completion),
}

/// The in-memory authority for one interactive game.
#[derive(Debug, Clone)]
pub struct PuzzleGame {
    board: Board,
    selection: Selection,
    phase: SessionPhase,
    moves: Vec<Move>,
    started_at: Option<Instant>,
}

impl PuzzleGame {
    /// Creates a game on the initial layout.
    #[instrument]
    pub fn new() -> Self {
        Self {
            board: Board::initial(),
            selection: Selection::Idle,
            phase: SessionPhase::NotStarted,
            moves: Vec::new(),
            started_at: None,
        }
    }

    /// Returns the live board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Returns the game phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Returns the moves made so far, in order.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of moves made so far.
    pub fn move_count(&self) -> u32 {
        self.moves.len() as u32
    }

    /// Legal destinations of the selected knight, empty when idle.
    pub fn highlighted(&self) -> Vec<Position> {
        match self.selection {
            Selection::Idle => Vec::new(),
            Selection::Selected(origin) => legal_destinations(&self.board, origin),
        }
    }

    /// Game time elapsed at `now`; zero before the first move.
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        self.started_at
            .map_or(Duration::ZERO, |start| now.saturating_duration_since(start))
    }

    /// Handles a click on `pos` at the current time.
    pub fn interact(&mut self, pos: Position) -> Vec<GameEvent> {
        self.interact_at(pos, Instant::now())
    }

    /// Handles a click on `pos` at `now`.
    #[instrument(skip(self, now), fields(phase = ?self.phase, selection = ?self.selection))]
    pub fn interact_at(&mut self, pos: Position, now: Instant) -> Vec<GameEvent> {
        if self.phase == SessionPhase::Won {
            debug!("Game already won, ignoring interaction");
            return Vec::new();
        }

        let origin = match self.selection {
            Selection::Idle => {
                if !self.board.is_empty(pos) {
                    self.selection = Selection::Selected(pos);
                }
                return Vec::new();
            }
            Selection::Selected(origin) => origin,
        };

        if legal_destinations(&self.board, origin).contains(&pos) {
            return self.make_move(origin, pos, now);
        }

        self.selection = if self.board.is_empty(pos) {
            Selection::Idle
        } else {
            Selection::Selected(pos)
        };
        Vec::new()
    }

    fn make_move(&mut self, from: Position, to: Position, now: Instant) -> Vec<GameEvent> {
        let mut events = Vec::with_capacity(3);

        if self.phase == SessionPhase::NotStarted {
            self.phase = SessionPhase::InProgress;
            self.started_at = Some(now);
            info!("First move, starting session");
            events.push(GameEvent::SessionStarted);
        }

        let Some(piece) = self.board.get(from).side() else {
            // Unreachable: `from` came from a non-empty selection.
            self.selection = Selection::Idle;
            return events;
        };

        let last = self.moves.last().map_or(0, |mv| mv.timestamp);
        let timestamp = (self.elapsed_at(now).as_millis() as u64).max(last);
        let mv = Move::new(from, to, piece, timestamp);

        self.board = apply_move(&self.board, &mv);
        self.moves.push(mv);
        self.selection = Selection::Idle;
        events.push(GameEvent::MoveRecorded(mv));
        debug!(%mv, total_moves = self.moves.len(), "Move applied");

        #[cfg(debug_assertions)]
        debug_assert!(
            KnightSwapInvariants::check_all(self).is_ok(),
            "Puzzle invariants violated after {mv}"
        );

        if is_won(&self.board) {
            self.phase = SessionPhase::Won;
            let completion = self.completion(true, now);
            info!(
                total_moves = completion.total_moves,
                duration_seconds = completion.duration_seconds,
                "Puzzle solved"
            );
            events.push(GameEvent::SessionCompleted(completion));
        }

        events
    }

    /// Abandons the game at the current time.
    pub fn abandon(&mut self) -> Option<GameEvent> {
        self.abandon_at(Instant::now())
    }

    /// Resets to a fresh game.
    ///
    /// Returns a losing completion when a game was in progress; a won or
    /// unstarted game resets silently.
    #[instrument(skip(self, now), fields(phase = ?self.phase))]
    pub fn abandon_at(&mut self, now: Instant) -> Option<GameEvent> {
        let event = (self.phase == SessionPhase::InProgress)
            .then(|| GameEvent::SessionCompleted(self.completion(false, now)));
        if event.is_some() {
            info!(total_moves = self.moves.len(), "Game abandoned");
        }
        *self = Self::new();
        event
    }

    fn completion(&self, is_won: bool, now: Instant) -> Completion {
        Completion {
            is_won,
            total_moves: self.move_count(),
            duration_seconds: self.elapsed_at(now).as_secs() as u32,
        }
    }
}

impl Default for PuzzleGame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Side;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col).unwrap()
    }

    #[test]
    fn test_click_empty_stays_idle() {
        let mut game = PuzzleGame::new();
        assert!(game.interact(pos(1, 1)).is_empty());
        assert_eq!(game.selection(), Selection::Idle);
    }

    #[test]
    fn test_click_knight_selects() {
        let mut game = PuzzleGame::new();
        game.interact(pos(2, 0));
        assert_eq!(game.selection(), Selection::Selected(pos(2, 0)));
        assert_eq!(game.highlighted(), vec![pos(0, 1), pos(1, 2)]);
    }

    #[test]
    fn test_reselect_other_knight() {
        let mut game = PuzzleGame::new();
        game.interact(pos(2, 0));
        game.interact(pos(0, 2));
        assert_eq!(game.selection(), Selection::Selected(pos(0, 2)));
    }

    #[test]
    fn test_click_illegal_empty_deselects() {
        let mut game = PuzzleGame::new();
        game.interact(pos(2, 0));
        assert!(game.interact(pos(1, 1)).is_empty());
        assert_eq!(game.selection(), Selection::Idle);
        assert_eq!(game.board(), &Board::initial());
    }

    #[test]
    fn test_first_move_starts_session() {
        let mut game = PuzzleGame::new();
        let start = Instant::now();
        game.interact_at(pos(2, 0), start);
        let events = game.interact_at(pos(0, 1), start);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], GameEvent::SessionStarted);
        assert_eq!(
            events[1],
            GameEvent::MoveRecorded(Move::new(pos(2, 0), pos(0, 1), Side::White, 0))
        );
        assert_eq!(game.phase(), SessionPhase::InProgress);
        assert_eq!(game.selection(), Selection::Idle);
    }

    #[test]
    fn test_timestamps_follow_game_clock() {
        let mut game = PuzzleGame::new();
        let start = Instant::now();
        game.interact_at(pos(2, 0), start);
        game.interact_at(pos(0, 1), start);
        game.interact_at(pos(0, 0), start);
        let events = game.interact_at(pos(1, 2), start + Duration::from_millis(1250));

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::MoveRecorded(mv) if mv.timestamp == 1250));
    }

    #[test]
    fn test_abandon_in_progress_emits_loss() {
        let mut game = PuzzleGame::new();
        let start = Instant::now();
        game.interact_at(pos(2, 0), start);
        game.interact_at(pos(0, 1), start);

        let event = game.abandon_at(start + Duration::from_secs(7));
        assert_eq!(
            event,
            Some(GameEvent::SessionCompleted(Completion {
                is_won: false,
                total_moves: 1,
                duration_seconds: 7,
            }))
        );
        assert_eq!(game.phase(), SessionPhase::NotStarted);
        assert_eq!(game.board(), &Board::initial());
        assert!(game.moves().is_empty());
    }

    #[test]
    fn test_abandon_unstarted_is_silent() {
        let mut game = PuzzleGame::new();
        game.interact(pos(2, 0));
        assert_eq!(game.abandon(), None);
        assert_eq!(game.selection(), Selection::Idle);
    }
}
