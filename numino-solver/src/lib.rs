#![forbid(unsafe_code)]
//! Backtracking solver for Numino puzzles: given a [`numino_core::Puzzle`],
//! either produce one consistent solution or report how many distinct
//! solutions exist up to a small limit (used to certify uniqueness).
//!
//! The search is deterministic for a fixed `(puzzle, seed)` pair: value
//! ordering is driven by a seeded [`rand_chacha::ChaCha20Rng`], never by
//! hash-map iteration order or wall-clock state.

pub mod domain;
pub mod error;
pub mod seed;
pub mod solver;

pub use crate::domain::{Domain, ValueTable};
pub use crate::error::SolveError;
pub use crate::seed::rng_from_u64;
pub use crate::solver::{count_solutions, solve};
