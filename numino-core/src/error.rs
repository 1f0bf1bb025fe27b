use thiserror::Error;

use crate::puzzle::{CellIndex, Coord};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("grid has zero rows or zero columns")]
    EmptyGrid,

    #[error("coordinate {0:?} out of range for a {1}x{2} grid")]
    CoordOutOfRange(Coord, u16, u16),

    #[error("cell index {0} out of range for a grid of {1} cells")]
    CellIndexOutOfRange(CellIndex, usize),

    #[error("palette is empty")]
    EmptyPalette,

    #[error("numbers set is empty")]
    EmptyNumbers,

    #[error("number {0} is not positive")]
    NonPositiveNumber(i64),

    #[error("more than one given supplied for cell {0:?}")]
    DuplicateGiven(Coord),

    #[error("given at {0:?} carries neither a number nor a color")]
    EmptyGiven(Coord),

    #[error("given at {0:?} uses color outside the palette")]
    GivenColorNotInPalette(Coord),

    #[error("given at {0:?} uses number outside the allowed numbers")]
    GivenNumberNotAllowed(Coord),

    #[error(
        "row sums total {row_total} but column sums total {col_total}; they must be equal"
    )]
    SumMismatch { row_total: i64, col_total: i64 },

    #[error("row_sums has {actual} entries, expected {expected}")]
    RowSumsLengthMismatch { expected: u16, actual: usize },

    #[error("col_sums has {actual} entries, expected {expected}")]
    ColSumsLengthMismatch { expected: u16, actual: usize },

    #[error("block at {coord:?} has {actual} cells, expected {expected} (its own number)")]
    BlockSizeMismatch {
        coord: Coord,
        expected: u32,
        actual: usize,
    },

    #[error("cell {0:?} shares a color with a differently-numbered neighbor")]
    AdjacentSameColor(Coord),
}
