//! Game rules for the knight swap puzzle.
//!
//! Pure functions over [`Board`](crate::Board), kept apart from board
//! storage so the state machine and replay can share them.

pub mod legality;
pub mod win;

pub use legality::{KNIGHT_OFFSETS, is_legal, legal_destinations};
pub use win::is_won;
