//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use knight_swap::{Completion, GameEvent, Move, Position, PuzzleGame, Side, SqliteSessionStore};
use tempfile::NamedTempFile;

/// Knight ring: consecutive cells are one knight jump apart.
const RING: [(usize, usize); 8] = [
    (0, 0),
    (1, 2),
    (2, 0),
    (0, 1),
    (2, 2),
    (1, 0),
    (0, 2),
    (2, 1),
];

pub fn pos(row: usize, col: usize) -> Position {
    Position::new(row, col).expect("position in bounds")
}

/// Opens a store on a fresh temporary database; keep the file handle alive.
pub async fn temp_store(list_limit: u32) -> (NamedTempFile, SqliteSessionStore) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let store = SqliteSessionStore::open(db_path, list_limit)
        .await
        .expect("Failed to open store");
    (db_file, store)
}

/// Sixteen-move solution as (from, to) clicks.
pub fn winning_clicks() -> Vec<(Position, Position)> {
    let mut clicks = Vec::new();
    let mut occupied = [0usize, 2, 4, 6];
    for _round in 0..4 {
        for slot in occupied.iter_mut().rev() {
            let from = RING[*slot];
            let to = RING[(*slot + 1) % 8];
            clicks.push((pos(from.0, from.1), pos(to.0, to.1)));
            *slot = (*slot + 1) % 8;
        }
    }
    clicks
}

/// Plays `clicks` two seconds apart and returns every emitted event.
pub fn play_clicks(game: &mut PuzzleGame, clicks: &[(Position, Position)]) -> Vec<GameEvent> {
    let start = Instant::now();
    let mut events = Vec::new();
    for (i, (from, to)) in clicks.iter().enumerate() {
        let now = start + Duration::from_secs(2 * i as u64);
        events.extend(game.interact_at(*from, now));
        events.extend(game.interact_at(*to, now));
    }
    events
}

/// Move log and completion of a solved game.
pub fn winning_game() -> (Vec<Move>, Completion) {
    let mut game = PuzzleGame::new();
    let events = play_clicks(&mut game, &winning_clicks());
    let moves = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::MoveRecorded(mv) => Some(*mv),
            _ => None,
        })
        .collect();
    let completion = events
        .iter()
        .find_map(|e| match e {
            GameEvent::SessionCompleted(done) => Some(*done),
            _ => None,
        })
        .expect("winning clicks solve the puzzle");
    (moves, completion)
}

/// A move whose origin is empty on the initial board.
pub fn bogus_move() -> Move {
    Move::new(pos(1, 1), pos(0, 1), Side::White, 0)
}
