//! Iteratively erases clue parts from a fully revealed solution while
//! preserving unique solvability, producing a minimal-reveals [`Puzzle`].

use numino_core::{Coord, Given, Puzzle, Solution};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

use crate::error::GenError;
use crate::seed::rng_from_u64;

#[cfg(feature = "tracing")]
use tracing::trace;

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Any,
    NumberFirst,
    ColorFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Num,
    Col,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MaskCell {
    show_num: bool,
    show_col: bool,
}

#[derive(Debug, Clone)]
pub struct DeconstructConfig {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub max_steps: u32,
    pub strategy: Strategy,
}

/// The outcome of a single [`DeconstructorStepper::step`] call.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub ok: bool,
    pub removed: Option<(u16, u16)>,
    pub reveals: usize,
    pub reason: &'static str,
}

fn difficulty_to_target_reveals(difficulty: Difficulty, rows: u16, cols: u16) -> usize {
    let cells = rows as f64 * cols as f64;
    let per_cell = match difficulty {
        Difficulty::Easy => 1.30,
        Difficulty::Medium => 1.05,
        Difficulty::Hard => 0.85,
        Difficulty::Expert => 0.65,
    };
    8.max((cells * per_cell) as usize)
}

/// Owns the mutable mask state for one deconstruction run. Not `Send`/reused
/// across runs; create one stepper per `(base_puzzle, solution, config)`.
pub struct DeconstructorStepper<'a> {
    base: &'a Puzzle,
    solution: &'a Solution,
    cfg: DeconstructConfig,
    rng: ChaCha20Rng,
    rows: u16,
    cols: u16,
    target_reveals: usize,
    mask: Vec<MaskCell>,
    candidates: Vec<(u16, u16, Part)>,
    steps_done: u32,
}

impl<'a> DeconstructorStepper<'a> {
    pub fn new(base: &'a Puzzle, solution: &'a Solution, cfg: DeconstructConfig) -> Self {
        let rows = base.rows;
        let cols = base.cols;
        let area = rows as usize * cols as usize;
        let target_reveals = difficulty_to_target_reveals(cfg.difficulty, rows, cols);

        let mut candidates = Vec::with_capacity(area * 2);
        for r in 0..rows {
            for c in 0..cols {
                candidates.push((r, c, Part::Num));
                candidates.push((r, c, Part::Col));
            }
        }
        if matches!(cfg.difficulty, Difficulty::Hard | Difficulty::Expert) {
            candidates.sort_by_key(|&(_, _, part)| if part == Part::Col { 0 } else { 1 });
        }

        let mut rng = rng_from_u64(cfg.seed);
        candidates.shuffle(&mut rng);

        Self {
            base,
            solution,
            cfg,
            rng,
            rows,
            cols,
            target_reveals,
            mask: vec![
                MaskCell {
                    show_num: true,
                    show_col: true
                };
                area
            ],
            candidates,
            steps_done: 0,
        }
    }

    #[inline]
    fn idx(&self, r: u16, c: u16) -> usize {
        r as usize * self.cols as usize + c as usize
    }

    pub fn reveals_count(&self) -> usize {
        self.mask
            .iter()
            .map(|m| m.show_num as usize + m.show_col as usize)
            .sum()
    }

    fn build_givens_from_mask(&self) -> Vec<Given> {
        let mut givens = Vec::new();
        for r in 0..self.rows {
            for c in 0..self.cols {
                let value = self.solution.get(Coord::new(r, c)).expect("in range");
                let mc = self.mask[self.idx(r, c)];
                if mc.show_num || mc.show_col {
                    givens.push(Given::new(
                        r,
                        c,
                        mc.show_num.then_some(value.num),
                        mc.show_col.then(|| value.col.clone()),
                    ));
                }
            }
        }
        givens
    }

    /// Rebuilds the [`Puzzle`] implied by the current mask.
    pub fn current_puzzle(&self) -> Result<Puzzle, GenError> {
        Ok(Puzzle::new(
            self.base.rows,
            self.base.cols,
            self.base.palette.clone(),
            self.base.numbers.clone(),
            self.base.row_sums.clone(),
            self.base.col_sums.clone(),
            self.build_givens_from_mask(),
        )?)
    }

    fn is_unique(&self) -> Result<bool, GenError> {
        let puzzle = self.current_puzzle()?;
        Ok(numino_solver::count_solutions(&puzzle, 2, self.cfg.seed)? == 1)
    }

    fn block_fully_revealed(&self, cells: &[Coord]) -> bool {
        cells.iter().all(|c| {
            let mc = self.mask[self.idx(c.row, c.col)];
            mc.show_num && mc.show_col
        })
    }

    /// Best-effort beautifier: hide one part from one cell of an
    /// over-revealed block, preferring any ordering that preserves
    /// uniqueness. Leaves the mask untouched if none does.
    fn try_remove_from_block(&mut self, cells: &[Coord]) -> Result<bool, GenError> {
        let mut local: Vec<(u16, u16, Part)> = Vec::with_capacity(cells.len() * 2);
        for c in cells {
            local.push((c.row, c.col, Part::Num));
            local.push((c.row, c.col, Part::Col));
        }
        local.shuffle(&mut self.rng);

        for (r, c, part) in local {
            let idx = self.idx(r, c);
            let prev = self.mask[idx];
            match part {
                Part::Num if !prev.show_num => continue,
                Part::Col if !prev.show_col => continue,
                _ => {}
            }

            match part {
                Part::Num => self.mask[idx].show_num = false,
                Part::Col => self.mask[idx].show_col = false,
            }

            if self.is_unique()? {
                return Ok(true);
            }
            self.mask[idx] = prev;
        }
        Ok(false)
    }

    fn ensure_no_fully_revealed_blocks(&mut self) -> Result<(), GenError> {
        let blocks = self.solution.blocks();
        for block in blocks {
            if self.block_fully_revealed(&block.cells) {
                self.try_remove_from_block(&block.cells)?;
            }
        }
        Ok(())
    }

    fn pick_next_candidate(&mut self) -> Option<(u16, u16, Part)> {
        for i in 0..self.candidates.len() {
            let (r, c, part) = self.candidates[i];
            let mc = self.mask[self.idx(r, c)];
            let hidden = match part {
                Part::Num => !mc.show_num,
                Part::Col => !mc.show_col,
            };
            if hidden {
                continue;
            }
            let strategy_ok = match self.cfg.strategy {
                Strategy::Any => true,
                Strategy::NumberFirst => part == Part::Num,
                Strategy::ColorFirst => part == Part::Col,
            };
            if strategy_ok {
                return Some(self.candidates.remove(i));
            }
        }

        for i in 0..self.candidates.len() {
            let (r, c, part) = self.candidates[i];
            let mc = self.mask[self.idx(r, c)];
            let visible = match part {
                Part::Num => mc.show_num,
                Part::Col => mc.show_col,
            };
            if visible {
                return Some(self.candidates.remove(i));
            }
        }
        None
    }

    /// Removes exactly one clue part, only if uniqueness survives. Returns a
    /// result describing whether a removal was accepted.
    pub fn step(&mut self) -> Result<StepResult, GenError> {
        if self.steps_done >= self.cfg.max_steps {
            self.ensure_no_fully_revealed_blocks()?;
            return Ok(StepResult {
                ok: false,
                removed: None,
                reveals: self.reveals_count(),
                reason: "max_steps_reached",
            });
        }
        if self.reveals_count() <= self.target_reveals {
            self.ensure_no_fully_revealed_blocks()?;
            return Ok(StepResult {
                ok: false,
                removed: None,
                reveals: self.reveals_count(),
                reason: "target_reached",
            });
        }

        self.steps_done += 1;
        let tries_limit = match self.cfg.difficulty {
            Difficulty::Expert => 2000,
            Difficulty::Hard => 800,
            Difficulty::Easy | Difficulty::Medium => 500,
        };

        let mut tries = 0u32;
        while tries < tries_limit && !self.candidates.is_empty() {
            tries += 1;
            let Some((r, c, part)) = self.pick_next_candidate() else {
                break;
            };

            let idx = self.idx(r, c);
            let prev = self.mask[idx];
            match part {
                Part::Num => self.mask[idx].show_num = false,
                Part::Col => self.mask[idx].show_col = false,
            }

            if self.is_unique()? {
                self.ensure_no_fully_revealed_blocks()?;
                trace!(r, c, ?part, "deconstructor.removed");
                return Ok(StepResult {
                    ok: true,
                    removed: Some((r, c)),
                    reveals: self.reveals_count(),
                    reason: "unique_kept",
                });
            }
            self.mask[idx] = prev;
        }

        self.ensure_no_fully_revealed_blocks()?;
        Ok(StepResult {
            ok: false,
            removed: None,
            reveals: self.reveals_count(),
            reason: "no_more_unique_removals",
        })
    }

    /// Drives [`Self::step`] until the target reveal count is reached or no
    /// more uniqueness-preserving removal exists.
    pub fn run_to_target(mut self) -> Result<Puzzle, GenError> {
        loop {
            let res = self.step()?;
            if !res.ok {
                break;
            }
        }
        self.current_puzzle()
    }
}

/// Given `(BasePuzzle, Solution, DeconstructConfig)`, iteratively removes
/// clue parts while preserving unique solvability, returning a playable
/// [`Puzzle`]. Never rejects inputs: the best reached state is returned even
/// if `max_steps` is exhausted before the target reveal count.
pub fn deconstruct(
    base: &Puzzle,
    solution: &Solution,
    cfg: DeconstructConfig,
) -> Result<Puzzle, GenError> {
    DeconstructorStepper::new(base, solution, cfg).run_to_target()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructor::{ConstructConfig, construct_solution};
    use crate::bias::Style;

    fn sample() -> (Solution, Puzzle) {
        let cfg = ConstructConfig {
            rows: 3,
            cols: 3,
            palette: vec![
                numino_core::ColorCode::new("R"),
                numino_core::ColorCode::new("B"),
                numino_core::ColorCode::new("Y"),
            ],
            numbers: vec![1, 2],
            seed: 3,
            style: Style::Balanced,
            require_all_numbers: false,
            require_all_colors: true,
            max_attempts: 300,
        };
        construct_solution(&cfg).unwrap()
    }

    #[test]
    fn deconstruct_preserves_uniqueness() {
        let (solution, base) = sample();
        let cfg = DeconstructConfig {
            seed: 11,
            difficulty: Difficulty::Easy,
            max_steps: 50_000,
            strategy: Strategy::Any,
        };
        let puzzle = deconstruct(&base, &solution, cfg).unwrap();
        assert_eq!(numino_solver::count_solutions(&puzzle, 2, 11).unwrap(), 1);
    }

    #[test]
    fn easy_reveals_at_least_the_eight_cell_floor() {
        let (solution, base) = sample();
        let cfg = DeconstructConfig {
            seed: 7,
            difficulty: Difficulty::Easy,
            max_steps: 50_000,
            strategy: Strategy::Any,
        };
        let stepper = DeconstructorStepper::new(&base, &solution, cfg);
        assert!(stepper.target_reveals >= 8);
    }

    #[test]
    fn harder_difficulty_reveals_no_more_than_easier() {
        let (solution, base) = sample();
        let easy = deconstruct(
            &base,
            &solution,
            DeconstructConfig {
                seed: 2,
                difficulty: Difficulty::Easy,
                max_steps: 50_000,
                strategy: Strategy::Any,
            },
        )
        .unwrap();
        let expert = deconstruct(
            &base,
            &solution,
            DeconstructConfig {
                seed: 2,
                difficulty: Difficulty::Expert,
                max_steps: 50_000,
                strategy: Strategy::Any,
            },
        )
        .unwrap();

        let reveal_count = |p: &Puzzle| -> usize {
            p.givens
                .iter()
                .map(|g| g.num.is_some() as usize + g.color.is_some() as usize)
                .sum()
        };
        assert!(reveal_count(&expert) <= reveal_count(&easy));
    }
}
