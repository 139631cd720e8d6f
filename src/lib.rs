//! Knight Swap - a 3x3 knight-swap puzzle with recorded, replayable sessions.
//!
//! Game logic lives in [`knight_swap_rules`]; this crate persists and serves it.
//!
//! # Architecture
//!
//! - **Store**: [`SessionStore`] with a SQLite implementation ([`SqliteSessionStore`])
//!   and a remote one ([`ApiClient`])
//! - **Recorder**: ordered, best-effort persistence of [`GameEvent`]s
//! - **Server**: axum REST API over any store
//! - **Replay**: board reconstruction and timed [`Autoplay`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use knight_swap::{PuzzleGame, Position, SessionRecorder, SqliteSessionStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = SqliteSessionStore::open("knight_swap.db", 100).await?;
//! let recorder = SessionRecorder::spawn(Arc::new(store));
//!
//! let mut game = PuzzleGame::new();
//! game.interact(Position::new(2, 0).unwrap());
//! recorder.record_all(game.interact(Position::new(0, 1).unwrap()));
//! recorder.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod autoplay;
mod client;
mod config;
mod db;
mod recorder;
mod session;
mod store;

/// Terminal rendering and the interactive loops.
pub mod console;
/// REST API.
pub mod server;

// Crate-level exports - Game rules
pub use knight_swap_rules::{
    Board, Cell, Completion, GameEvent, Move, MoveError, Position, PuzzleGame, Replay,
    ReplayError, Selection, SessionPhase, Side, board_at_index, is_legal, is_won,
    legal_destinations,
};

// Crate-level exports - Persistence
pub use db::{DbError, DbErrorKind, GameSessionRow, NewGameSession, SessionRepository, SessionWrite};
pub use session::{ReplayFrame, Session, SessionId, SessionStatus, SessionSummary, Stats};
pub use store::{DEFAULT_LIST_LIMIT, SessionStore, SqliteSessionStore, StoreError};

// Crate-level exports - Recording and playback
pub use autoplay::{Autoplay, DEFAULT_INTERVAL};
pub use recorder::{RecorderStatus, SessionRecorder};

// Crate-level exports - Client and configuration
pub use client::{ApiClient, ClientError};
pub use config::{ConfigError, DATABASE_ENV, ServerConfig};
pub use server::{ApiError, AppState};
