//! Win detection.

use crate::{Board, Cell, Position, Side};
use tracing::instrument;

/// Checks if the sides have swapped corners.
///
/// White must hold (0,0) and (0,2), black must hold (2,0) and (2,2).
#[instrument(level = "trace")]
pub fn is_won(board: &Board) -> bool {
    const TARGETS: [(usize, Side); 4] = [
        (0, Side::White),
        (2, Side::White),
        (6, Side::Black),
        (8, Side::Black),
    ];

    TARGETS.iter().all(|&(index, side)| {
        Position::from_index(index).is_some_and(|pos| board.get(pos) == Cell::Knight(side))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_not_won() {
        assert!(!is_won(&Board::initial()));
    }

    #[test]
    fn test_winning_layout_won() {
        assert!(is_won(&Board::winning()));
    }

    #[test]
    fn test_partial_swap_not_won() {
        let board = Board::from_rows([
            [Some(Side::White), None, Some(Side::White)],
            [None, Some(Side::Black), None],
            [Some(Side::Black), None, None],
        ]);
        assert!(!is_won(&board));
    }
}
