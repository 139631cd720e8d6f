//! Board coordinates.

use serde::{Deserialize, Serialize};

/// A cell coordinate on the 3x3 board.
///
/// Both components are always in `0..3`; the only ways to build a
/// position are range-checked, so an out-of-bounds cell cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    row: u8,
    col: u8,
}

/// Unchecked wire form, validated on the way in.
#[derive(Deserialize)]
struct RawPosition {
    row: i64,
    col: i64,
}

/// Error returned for coordinates outside the board.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Position ({row}, {col}) is outside the 3x3 board")]
pub struct PositionError {
    /// Rejected row.
    pub row: i64,
    /// Rejected column.
    pub col: i64,
}

impl Position {
    /// All nine positions in row-major order.
    pub const ALL: [Position; 9] = [
        Position::at(0, 0),
        Position::at(0, 1),
        Position::at(0, 2),
        Position::at(1, 0),
        Position::at(1, 1),
        Position::at(1, 2),
        Position::at(2, 0),
        Position::at(2, 1),
        Position::at(2, 2),
    ];

    const fn at(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Creates a position, returning `None` when out of bounds.
    pub fn new(row: usize, col: usize) -> Option<Self> {
        (row < 3 && col < 3).then(|| Self::at(row as u8, col as u8))
    }

    /// Row index (0 is the top).
    pub fn row(self) -> usize {
        self.row as usize
    }

    /// Column index (0 is the left).
    pub fn col(self) -> usize {
        self.col as usize
    }

    /// Row-major board index (0-8).
    pub fn index(self) -> usize {
        self.row() * 3 + self.col()
    }

    /// Creates a position from a row-major index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Shifts the position by a signed offset, `None` if it leaves the board.
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;
        if (0..3).contains(&row) && (0..3).contains(&col) {
            Some(Self::at(row as u8, col as u8))
        } else {
            None
        }
    }
}

impl TryFrom<RawPosition> for Position {
    type Error = PositionError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        match (usize::try_from(raw.row), usize::try_from(raw.col)) {
            (Ok(row), Ok(col)) => Position::new(row, col),
            _ => None,
        }
        .ok_or(PositionError {
            row: raw.row,
            col: raw.col,
        })
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
