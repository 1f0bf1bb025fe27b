#![forbid(unsafe_code)]
//! Grid data model for Numino puzzles: coordinates, colors, cell values,
//! givens, puzzles, solutions, and the blocks derived from a solution.
//!
//! This crate has no knowledge of solving, construction, or deconstruction;
//! it owns only the shapes those engines pass between each other and the
//! invariants ([`puzzle::Solution::check_invariants`]) that any solution must
//! satisfy.

pub mod error;
pub mod puzzle;
pub mod types;

pub use crate::error::CoreError;
pub use crate::puzzle::{Block, CellIndex, Coord, Puzzle, Solution, cell_index, coord_of};
pub use crate::types::{CellValue, ColorCode, Given, OwnedCellValue};
