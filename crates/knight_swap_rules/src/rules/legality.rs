//! Legal knight jumps.

use crate::{Board, Position};
use tracing::instrument;

/// The eight knight offsets `(d_row, d_col)`, in the order destinations are reported.
pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// Returns the empty cells the knight on `origin` can jump to.
///
/// An empty origin has no destinations. The result follows the order of
/// [`KNIGHT_OFFSETS`], so highlighting is reproducible.
#[instrument(level = "trace", skip(board))]
pub fn legal_destinations(board: &Board, origin: Position) -> Vec<Position> {
    if board.is_empty(origin) {
        return Vec::new();
    }

    KNIGHT_OFFSETS
        .iter()
        .filter_map(|&(d_row, d_col)| origin.offset(d_row, d_col))
        .filter(|&target| board.is_empty(target))
        .collect()
}

/// Checks if a knight on `from` may jump to `to`.
pub fn is_legal(board: &Board, from: Position, to: Position) -> bool {
    legal_destinations(board, from).contains(&to)
}
