//! Core domain types for the knight swap board.

use crate::Position;
use serde::{Deserialize, Serialize};

/// Side a knight belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    /// White knights start on the bottom row.
    White,
    /// Black knights start on the top row.
    Black,
}

impl Side {
    /// Single-character symbol used in text rendering.
    pub fn symbol(self) -> char {
        match self {
            Side::White => 'W',
            Side::Black => 'B',
        }
    }
}

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// No knight.
    #[default]
    Empty,
    /// Cell holds a knight of the given side.
    Knight(Side),
}

impl Cell {
    /// Returns the side of the knight on this cell, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::Knight(side) => Some(side),
        }
    }

    /// Checks if the cell holds no knight.
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<Option<Side>> for Cell {
    fn from(side: Option<Side>) -> Self {
        side.map_or(Cell::Empty, Cell::Knight)
    }
}

/// Rows of optional sides, the wire shape of a board.
pub type BoardRows = [[Option<Side>; 3]; 3];

/// 3x3 knight swap board.
///
/// Serialized as three rows of `"white"`, `"black"` or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "BoardRows", from = "BoardRows")]
pub struct Board {
    /// Cells in row-major order (0-8).
    cells: [Cell; 9],
}

impl Board {
    /// Side length of the board.
    pub const SIZE: usize = 3;

    /// Creates a board with no knights.
    pub fn empty() -> Self {
        Self {
            cells: [Cell::Empty; 9],
        }
    }

    /// Canonical starting layout: black on the top corners, white on the bottom corners.
    pub fn initial() -> Self {
        use Side::{Black, White};
        Self::from_rows([
            [Some(Black), None, Some(Black)],
            [None, None, None],
            [Some(White), None, Some(White)],
        ])
    }

    /// The solved layout: white on the top corners, black on the bottom corners.
    pub fn winning() -> Self {
        use Side::{Black, White};
        Self::from_rows([
            [Some(White), None, Some(White)],
            [None, None, None],
            [Some(Black), None, Some(Black)],
        ])
    }

    /// Builds a board from rows.
    pub fn from_rows(rows: BoardRows) -> Self {
        let mut board = Self::empty();
        for pos in Position::ALL {
            board.cells[pos.index()] = Cell::from(rows[pos.row()][pos.col()]);
        }
        board
    }

    /// Returns the board as rows.
    pub fn rows(&self) -> BoardRows {
        let mut rows = [[None; 3]; 3];
        for pos in Position::ALL {
            rows[pos.row()][pos.col()] = self.get(pos).side();
        }
        rows
    }

    /// Gets the cell at the given position.
    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.index()]
    }

    /// Sets the cell at the given position.
    pub(crate) fn set(&mut self, pos: Position, cell: Cell) {
        self.cells[pos.index()] = cell;
    }

    /// Checks if the cell at the given position is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos).is_empty()
    }

    /// Returns all cells in row-major order.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Counts the knights of one side.
    pub fn count(&self, side: Side) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.side() == Some(side))
            .count()
    }

    /// Iterates over occupied cells.
    pub fn knights(&self) -> impl Iterator<Item = (Position, Side)> + '_ {
        Position::ALL
            .into_iter()
            .filter_map(|pos| self.get(pos).side().map(|side| (pos, side)))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl From<Board> for BoardRows {
    fn from(board: Board) -> Self {
        board.rows()
    }
}

impl From<BoardRows> for Board {
    fn from(rows: BoardRows) -> Self {
        Board::from_rows(rows)
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..Self::SIZE {
            for col in 0..Self::SIZE {
                let symbol = self.cells[row * Self::SIZE + col]
                    .side()
                    .map_or('.', Side::symbol);
                write!(f, "{symbol}")?;
                if col < Self::SIZE - 1 {
                    write!(f, " ")?;
                }
            }
            if row < Self::SIZE - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
