#![forbid(unsafe_code)]
//! The persisted JSON format consumed by external exporters: puzzles are
//! serialized without their solutions, which may optionally be stored
//! separately, keyed by puzzle id.
//!
//! This crate has no knowledge of solving, construction, or deconstruction;
//! it only converts [`numino_core::Puzzle`]/[`numino_core::Solution`] to and
//! from the wire records.

pub mod error;
pub mod format;

pub use crate::error::IoError;
pub use crate::format::{
    Allowed, Constraints, GivenRecord, GridSize, PuzzleFile, PuzzleRecord, SolutionCell,
    SolutionsFile, from_record, read_puzzle_file, read_solutions_file, to_record,
    write_puzzle_file, write_solutions_file,
};
