//! Constraint-propagation backtracking solver for [`numino_core::Puzzle`].
//!
//! Depth-first search with minimum-remaining-values variable ordering,
//! LCV-style value ordering, forward checking on the color-adjacency rule,
//! and block/sum feasibility pruning before every tentative assignment.
//! Two cells are never both reachable from the other except through cells
//! that are genuinely orthogonal neighbors, so all connectivity queries are
//! plain 4-neighbor flood fills bounded by `rows * cols`.

use numino_core::puzzle::{Coord, cell_index};
use numino_core::{OwnedCellValue, Puzzle, Solution};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use tracing::trace;

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

use crate::domain::{Domain, ValueTable};
use crate::error::SolveError;
use crate::seed::rng_from_u64;

/// Solve and return the first solution found, or `None` if the puzzle has
/// no solution.
pub fn solve(puzzle: &Puzzle, seed: u64) -> Result<Option<Solution>, SolveError> {
    let mut first = None;
    search(puzzle, seed, 1, &mut first)?;
    Ok(first)
}

/// Count solutions up to `limit` (pass `2` for a uniqueness check: the
/// result is `1` iff the puzzle has exactly one solution).
pub fn count_solutions(puzzle: &Puzzle, limit: u32, seed: u64) -> Result<u32, SolveError> {
    if limit == 0 {
        return Ok(0);
    }
    let mut first = None;
    search(puzzle, seed, limit, &mut first)
}

fn search(
    puzzle: &Puzzle,
    seed: u64,
    limit: u32,
    first: &mut Option<Solution>,
) -> Result<u32, SolveError> {
    puzzle.validate()?;
    let table = ValueTable::build(puzzle)?;
    let mut state = SearchState::new(puzzle, table);
    let mut rng = rng_from_u64(seed);
    let mut count = 0u32;

    trace!(rows = puzzle.rows, cols = puzzle.cols, limit, "solver.start");
    state.backtrack(&mut rng, limit, &mut count, first);
    trace!(count, "solver.done");
    Ok(count)
}

struct SearchState<'a> {
    puzzle: &'a Puzzle,
    table: ValueTable,
    rows: u16,
    cols: u16,
    domains: Vec<Domain>,
    assign: Vec<Option<usize>>,
    row_sum_now: Vec<i64>,
    col_sum_now: Vec<i64>,
}

impl<'a> SearchState<'a> {
    fn new(puzzle: &'a Puzzle, table: ValueTable) -> Self {
        let area = puzzle.area();
        let mut domains = vec![table.full_domain(); area];

        for given in &puzzle.givens {
            let coord = Coord::new(given.row, given.col);
            let idx = cell_index(puzzle.rows, puzzle.cols, coord).unwrap().0 as usize;
            let dom = &mut domains[idx];
            for value_idx in 0..table.len() {
                if !dom.contains(value_idx) {
                    continue;
                }
                let (num, col) = table.value_at(value_idx);
                let num_ok = given.num.is_none_or(|n| n == num);
                let col_ok = given.color.as_ref().is_none_or(|c| c == col);
                if !(num_ok && col_ok) {
                    dom.remove(value_idx);
                }
            }
        }

        Self {
            puzzle,
            table,
            rows: puzzle.rows,
            cols: puzzle.cols,
            domains,
            assign: vec![None; area],
            row_sum_now: vec![0; puzzle.rows as usize],
            col_sum_now: vec![0; puzzle.cols as usize],
        }
    }

    #[inline]
    fn row_of(&self, idx: usize) -> usize {
        idx / self.cols as usize
    }

    #[inline]
    fn col_of(&self, idx: usize) -> usize {
        idx % self.cols as usize
    }

    fn neighbors(&self, idx: usize) -> SmallVec<[usize; 4]> {
        let mut out = SmallVec::new();
        let row = self.row_of(idx);
        let col = self.col_of(idx);
        let cols = self.cols as usize;
        if row > 0 {
            out.push(idx - cols);
        }
        if row + 1 < self.rows as usize {
            out.push(idx + cols);
        }
        if col > 0 {
            out.push(idx - 1);
        }
        if col + 1 < cols {
            out.push(idx + 1);
        }
        out
    }

    /// Minimum and maximum achievable `num` across the current domain of an
    /// unassigned cell.
    fn domain_num_bounds(&self, idx: usize) -> Option<(i64, i64)> {
        let dom = self.domains[idx];
        if dom.is_empty() {
            return None;
        }
        let (mut lo, mut hi) = (i64::MAX, i64::MIN);
        for v in dom.iter_indices() {
            let num = self.table.value_at(v).0 as i64;
            lo = lo.min(num);
            hi = hi.max(num);
        }
        Some((lo, hi))
    }

    fn row_remaining_bounds(&self, row: usize, skip: usize) -> Option<(i64, i64)> {
        let cols = self.cols as usize;
        let mut lo = 0i64;
        let mut hi = 0i64;
        for col in 0..cols {
            let idx = row * cols + col;
            if idx == skip || self.assign[idx].is_some() {
                continue;
            }
            let (l, h) = self.domain_num_bounds(idx)?;
            lo += l;
            hi += h;
        }
        Some((lo, hi))
    }

    fn col_remaining_bounds(&self, col: usize, skip: usize) -> Option<(i64, i64)> {
        let rows = self.rows as usize;
        let cols = self.cols as usize;
        let mut lo = 0i64;
        let mut hi = 0i64;
        for row in 0..rows {
            let idx = row * cols + col;
            if idx == skip || self.assign[idx].is_some() {
                continue;
            }
            let (l, h) = self.domain_num_bounds(idx)?;
            lo += l;
            hi += h;
        }
        Some((lo, hi))
    }

    /// Global bound pruning: every row/column's target sum must still be
    /// reachable given the current running sum and the min/max of the
    /// remaining unassigned cells' domains.
    fn global_bounds_ok(&self) -> bool {
        for row in 0..self.rows as usize {
            let Some((lo, hi)) = self.row_remaining_bounds(row, usize::MAX) else {
                return false;
            };
            let target = self.puzzle.row_sums[row];
            if self.row_sum_now[row] + lo > target || self.row_sum_now[row] + hi < target {
                return false;
            }
        }
        for col in 0..self.cols as usize {
            let Some((lo, hi)) = self.col_remaining_bounds(col, usize::MAX) else {
                return false;
            };
            let target = self.puzzle.col_sums[col];
            if self.col_sum_now[col] + lo > target || self.col_sum_now[col] + hi < target {
                return false;
            }
        }
        true
    }

    /// Minimum-remaining-values: the unassigned cell with the smallest
    /// current domain, ties broken by first (row-major) encounter.
    fn choose_mrv(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        let mut best_count = u32::MAX;
        for idx in 0..self.assign.len() {
            if self.assign[idx].is_some() {
                continue;
            }
            let count = self.domains[idx].count();
            if count < best_count {
                best = Some(idx);
                best_count = count;
                if count == 0 {
                    break;
                }
            }
        }
        best
    }

    /// LCV-style ordering: shuffle once, then stably sort ascending by the
    /// number of currently-live neighbor values that this choice would
    /// eliminate (a different-number, same-color neighbor candidate).
    fn order_values(&self, idx: usize, rng: &mut ChaCha20Rng) -> Vec<usize> {
        let mut values: Vec<usize> = self.domains[idx].iter_indices().collect();
        values.shuffle(rng);

        let neighbors = self.neighbors(idx);
        let impact = |value_idx: usize| -> u32 {
            let (num, col) = self.table.value_at(value_idx);
            let mut count = 0u32;
            for &nb in &neighbors {
                if self.assign[nb].is_some() {
                    continue;
                }
                for nb_value in self.domains[nb].iter_indices() {
                    let (nb_num, nb_col) = self.table.value_at(nb_value);
                    if nb_num != num && nb_col == col {
                        count += 1;
                    }
                }
            }
            count
        };
        values.sort_by_key(|&v| impact(v));
        values
    }

    fn sums_ok_local(&self, idx: usize, value_idx: usize) -> bool {
        let row = self.row_of(idx);
        let col = self.col_of(idx);
        let (num, _) = self.table.value_at(value_idx);
        let num = num as i64;

        let row_target = self.puzzle.row_sums[row];
        let col_target = self.puzzle.col_sums[col];
        if self.row_sum_now[row] + num > row_target || self.col_sum_now[col] + num > col_target {
            return false;
        }

        let Some((row_lo, row_hi)) = self.row_remaining_bounds(row, idx) else {
            return false;
        };
        let row_placed = self.row_sum_now[row] + num;
        if row_placed + row_lo > row_target || row_placed + row_hi < row_target {
            return false;
        }

        let Some((col_lo, col_hi)) = self.col_remaining_bounds(col, idx) else {
            return false;
        };
        let col_placed = self.col_sum_now[col] + num;
        if col_placed + col_lo > col_target || col_placed + col_hi < col_target {
            return false;
        }

        true
    }

    fn color_adjacency_ok(&self, idx: usize, value_idx: usize) -> bool {
        let (num, col) = self.table.value_at(value_idx);
        for nb in self.neighbors(idx) {
            if let Some(nb_value) = self.assign[nb] {
                let (nb_num, nb_col) = self.table.value_at(nb_value);
                if nb_num != num && nb_col == col {
                    return false;
                }
            }
        }
        true
    }

    /// Block feasibility: the already-assigned same-value component reachable
    /// from `idx` must not exceed `num` cells, and the set of cells that
    /// could still join this block (assigned same value, or unassigned with
    /// this value still in its domain) must be at least `num` cells.
    fn block_feasible(&self, idx: usize, value_idx: usize) -> bool {
        let (num, _) = self.table.value_at(value_idx);
        let num = num as usize;

        let mut assigned_same = 1usize;
        let mut visited = vec![false; self.assign.len()];
        visited[idx] = true;
        let mut stack = vec![idx];
        while let Some(cur) = stack.pop() {
            for nb in self.neighbors(cur) {
                if visited[nb] {
                    continue;
                }
                if self.assign[nb] == Some(value_idx) {
                    visited[nb] = true;
                    assigned_same += 1;
                    stack.push(nb);
                }
            }
        }
        if assigned_same > num {
            return false;
        }

        let mut reachable = 1usize;
        let mut visited = vec![false; self.assign.len()];
        visited[idx] = true;
        let mut stack = vec![idx];
        while let Some(cur) = stack.pop() {
            for nb in self.neighbors(cur) {
                if visited[nb] {
                    continue;
                }
                let allowed = match self.assign[nb] {
                    Some(v) => v == value_idx,
                    None => self.domains[nb].contains(value_idx),
                };
                if allowed {
                    visited[nb] = true;
                    reachable += 1;
                    stack.push(nb);
                }
            }
        }
        reachable >= num
    }

    fn assign_val(&mut self, idx: usize, value_idx: usize) {
        self.assign[idx] = Some(value_idx);
        let (num, _) = self.table.value_at(value_idx);
        self.row_sum_now[self.row_of(idx)] += num as i64;
        self.col_sum_now[self.col_of(idx)] += num as i64;
    }

    fn unassign_val(&mut self, idx: usize) {
        let value_idx = self.assign[idx].take().expect("cell was assigned");
        let (num, _) = self.table.value_at(value_idx);
        self.row_sum_now[self.row_of(idx)] -= num as i64;
        self.col_sum_now[self.col_of(idx)] -= num as i64;
    }

    /// Lock `idx`'s domain to `value_idx` and prune any unassigned neighbor
    /// value that differs in number but matches in color. Returns the
    /// removed `(cell, value)` pairs so the caller can undo them in reverse.
    fn forward_check(&mut self, idx: usize, value_idx: usize) -> Vec<(usize, usize)> {
        let mut removed = Vec::new();
        for v in self.domains[idx].iter_indices() {
            if v != value_idx {
                removed.push((idx, v));
            }
        }
        self.domains[idx] = Domain::empty();
        self.domains[idx].insert(value_idx);

        let (num, col) = self.table.value_at(value_idx);
        for nb in self.neighbors(idx) {
            if self.assign[nb].is_some() {
                continue;
            }
            let to_remove: SmallVec<[usize; 8]> = self.domains[nb]
                .iter_indices()
                .filter(|&v| {
                    let (nb_num, nb_col) = self.table.value_at(v);
                    nb_num != num && nb_col == col
                })
                .collect();
            for v in to_remove {
                self.domains[nb].remove(v);
                removed.push((nb, v));
            }
        }
        removed
    }

    fn undo(&mut self, removed: Vec<(usize, usize)>) {
        for (idx, v) in removed.into_iter().rev() {
            self.domains[idx].insert(v);
        }
    }

    fn is_complete(&self) -> bool {
        self.assign.iter().all(|a| a.is_some())
    }

    fn sums_exact_ok(&self) -> bool {
        self.row_sum_now == self.puzzle.row_sums && self.col_sum_now == self.puzzle.col_sums
    }

    /// Every connected component of identically-assigned cells must have a
    /// size equal to its `num`.
    fn blocks_ok(&self) -> bool {
        let area = self.assign.len();
        let mut seen = vec![false; area];
        for start in 0..area {
            if seen[start] {
                continue;
            }
            let value_idx = self.assign[start].expect("complete assignment");
            let (num, _) = self.table.value_at(value_idx);

            let mut size = 0usize;
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(cur) = stack.pop() {
                size += 1;
                for nb in self.neighbors(cur) {
                    if seen[nb] {
                        continue;
                    }
                    if self.assign[nb] == Some(value_idx) {
                        seen[nb] = true;
                        stack.push(nb);
                    }
                }
            }
            if size != num as usize {
                return false;
            }
        }
        true
    }

    fn to_solution(&self) -> Solution {
        let grid: Vec<OwnedCellValue> = self
            .assign
            .iter()
            .map(|&v| {
                let (num, col) = self.table.value_at(v.expect("complete assignment"));
                OwnedCellValue::new(num, col.clone())
            })
            .collect();
        Solution::from_grid(self.rows, self.cols, grid).expect("grid length matches rows*cols")
    }

    fn backtrack(
        &mut self,
        rng: &mut ChaCha20Rng,
        limit: u32,
        count: &mut u32,
        first: &mut Option<Solution>,
    ) {
        if *count >= limit {
            return;
        }
        if !self.global_bounds_ok() {
            return;
        }

        let Some(idx) = self.choose_mrv() else {
            if self.sums_exact_ok() && self.blocks_ok() {
                *count += 1;
                if first.is_none() {
                    *first = Some(self.to_solution());
                }
            }
            return;
        };

        for value_idx in self.order_values(idx, rng) {
            if !self.sums_ok_local(idx, value_idx) {
                continue;
            }
            if !self.color_adjacency_ok(idx, value_idx) {
                continue;
            }
            if !self.block_feasible(idx, value_idx) {
                continue;
            }

            self.assign_val(idx, value_idx);
            let removed = self.forward_check(idx, value_idx);

            self.backtrack(rng, limit, count, first);

            self.undo(removed);
            self.unassign_val(idx);

            if *count >= limit {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use numino_core::{ColorCode, Given};

    /// A 2x2 grid with two 2-cell blocks (left column red-2, right column
    /// blue-2) has sums [4,4] per row, [4,4] per column, and is unique once
    /// any one cell is given.
    fn two_block_puzzle() -> Puzzle {
        Puzzle::new(
            2,
            2,
            vec![ColorCode::new("R"), ColorCode::new("B")],
            vec![1, 2],
            vec![4, 4],
            vec![4, 4],
            vec![Given::new(0, 0, Some(2), Some(ColorCode::new("R")))],
        )
        .unwrap()
    }

    #[test]
    fn solves_a_simple_puzzle() {
        let puzzle = two_block_puzzle();
        let sol = solve(&puzzle, 1).unwrap().expect("solution exists");
        assert_eq!(sol.get(Coord::new(0, 0)).unwrap().col.as_str(), "R");
        assert_eq!(sol.get(Coord::new(0, 1)).unwrap().col.as_str(), "B");
        sol.check_invariants(&puzzle).unwrap();
    }

    #[test]
    fn count_solutions_detects_uniqueness() {
        let puzzle = two_block_puzzle();
        assert_eq!(count_solutions(&puzzle, 2, 1).unwrap(), 1);
    }

    #[test]
    fn fully_given_puzzle_returns_single_matching_solution() {
        let base = two_block_puzzle();
        let sol = solve(&base, 1).unwrap().unwrap();
        let givens: Vec<Given> = sol
            .iter()
            .map(|(c, v)| Given::new(c.row, c.col, Some(v.num), Some(v.col.clone())))
            .collect();
        let fully_given = Puzzle::new(
            2,
            2,
            base.palette.clone(),
            base.numbers.clone(),
            base.row_sums.clone(),
            base.col_sums.clone(),
            givens,
        )
        .unwrap();

        assert_eq!(count_solutions(&fully_given, 2, 7).unwrap(), 1);
        let resolved = solve(&fully_given, 7).unwrap().unwrap();
        assert_eq!(resolved, sol);
    }

    #[test]
    fn one_by_one_grid_is_trivially_unique() {
        let puzzle = Puzzle::new(
            1,
            1,
            vec![ColorCode::new("X")],
            vec![1],
            vec![1],
            vec![1],
            Vec::new(),
        )
        .unwrap();
        assert_eq!(count_solutions(&puzzle, 2, 0).unwrap(), 1);
    }

    #[test]
    fn determinism_same_seed_same_solution() {
        let puzzle = two_block_puzzle();
        let a = solve(&puzzle, 42).unwrap().unwrap();
        let b = solve(&puzzle, 42).unwrap().unwrap();
        assert_eq!(a, b);
    }
}
