//! Stage 1-4 of puzzle construction: pick a block-size multiset, partition
//! the grid into connected blocks of those sizes, color the block-adjacency
//! graph, and emit the resulting `(Solution, BasePuzzle)` pair.

use std::collections::HashSet;

use numino_core::{ColorCode, OwnedCellValue, Puzzle, Solution};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use smallvec::SmallVec;

use crate::bias::{Style, choose_block_sizes_biased};
use crate::error::GenError;
use crate::seed::rng_from_u64;

#[cfg(feature = "tracing")]
use tracing::trace;

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

/// Inputs to the Constructor stage.
#[derive(Debug, Clone)]
pub struct ConstructConfig {
    pub rows: u16,
    pub cols: u16,
    pub palette: Vec<ColorCode>,
    pub numbers: Vec<u32>,
    pub seed: u64,
    pub style: Style,
    pub require_all_numbers: bool,
    pub require_all_colors: bool,
    pub max_attempts: u32,
}

/// Builds a fully determined grid: a multiset of block sizes tiling the
/// area, partitioned into connected blocks, each block colored so adjacent
/// blocks differ. Retries up to `cfg.max_attempts` times on any stage
/// failure before surfacing [`GenError::ConstructionExhausted`].
pub fn construct_solution(cfg: &ConstructConfig) -> Result<(Solution, Puzzle), GenError> {
    let area = cfg.rows as usize * cfg.cols as usize;
    let numbers_sum: usize = cfg.numbers.iter().map(|&n| n as usize).sum();

    if cfg.palette.is_empty() {
        return Err(GenError::EmptyPalette);
    }
    if cfg.require_all_numbers && numbers_sum > area {
        return Err(GenError::NumbersExceedArea {
            sum: numbers_sum as i64,
            area,
        });
    }

    let mut rng = rng_from_u64(cfg.seed);

    for attempt in 0..cfg.max_attempts {
        trace!(attempt, "constructor.attempt");

        let Some(block_sizes) = choose_block_sizes_biased(
            &mut rng,
            area,
            &cfg.numbers,
            cfg.style,
            cfg.require_all_numbers,
            2000,
        ) else {
            continue;
        };

        let Some((cell_to_block, block_size)) =
            partition_into_blocks(&mut rng, cfg.rows, cfg.cols, &block_sizes)
        else {
            continue;
        };

        if cfg.require_all_numbers {
            let used: HashSet<u32> = block_size.iter().copied().collect();
            if !cfg.numbers.iter().all(|n| used.contains(n)) {
                continue;
            }
        }

        let adjacency = build_block_adjacency(&cell_to_block, cfg.rows, cfg.cols, block_size.len());

        let require_colors = cfg.require_all_colors && block_size.len() >= cfg.palette.len();

        let Some(colors) =
            color_blocks_backtracking(&mut rng, &adjacency, &cfg.palette, require_colors)
        else {
            continue;
        };

        if require_colors {
            let used: HashSet<&ColorCode> = colors.iter().collect();
            if used.len() != cfg.palette.len() {
                continue;
            }
        }

        let grid: Vec<OwnedCellValue> = cell_to_block
            .iter()
            .map(|&block| {
                let block = block.expect("every cell is assigned after a successful partition");
                OwnedCellValue::new(block_size[block], colors[block].clone())
            })
            .collect();

        let solution = Solution::from_grid(cfg.rows, cfg.cols, grid)
            .expect("grid length matches rows*cols by construction");
        let row_sums = solution.row_sums();
        let col_sums = solution.col_sums();

        let base_puzzle = Puzzle::new(
            cfg.rows,
            cfg.cols,
            cfg.palette.clone(),
            cfg.numbers.clone(),
            row_sums,
            col_sums,
            Vec::new(),
        )?;

        return Ok((solution, base_puzzle));
    }

    Err(GenError::ConstructionExhausted {
        attempts: cfg.max_attempts,
    })
}

fn neighbors4(idx: usize, rows: u16, cols: u16) -> SmallVec<[usize; 4]> {
    let cols = cols as usize;
    let row = idx / cols;
    let col = idx % cols;
    let mut out = SmallVec::new();
    if row > 0 {
        out.push(idx - cols);
    }
    if row + 1 < rows as usize {
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

/// Generates up to `limit` connected shapes of `size` rooted at `start` via
/// randomized compact growth: at each step, the free-neighbor frontier is
/// scored by how many of its own neighbors already belong to the shape, and
/// the top scorer is picked with probability 0.70 (uniformly at random from
/// the frontier otherwise).
fn find_all_shapes(
    start: usize,
    size: u32,
    free: &HashSet<usize>,
    rows: u16,
    cols: u16,
    limit: u32,
    rng: &mut ChaCha20Rng,
) -> Vec<Vec<usize>> {
    let size = size as usize;
    let mut shapes = Vec::new();

    'attempt: for _ in 0..limit {
        let mut shape = vec![start];
        let mut used: HashSet<usize> = HashSet::from([start]);

        while shape.len() < size {
            let mut seen: HashSet<usize> = HashSet::new();
            let mut cand: Vec<usize> = Vec::new();
            for &cell in &shape {
                for nb in neighbors4(cell, rows, cols) {
                    if !seen.insert(nb) {
                        continue;
                    }
                    if free.contains(&nb) && !used.contains(&nb) {
                        cand.push(nb);
                    }
                }
            }

            if cand.is_empty() {
                continue 'attempt;
            }

            let score = |&cell: &usize| -> u32 {
                neighbors4(cell, rows, cols)
                    .into_iter()
                    .filter(|nb| used.contains(nb))
                    .count() as u32
            };
            cand.sort_by_key(|c| std::cmp::Reverse(score(c)));

            let pick = if rng.random::<f64>() < 0.70 {
                cand[0]
            } else {
                *cand.choose(rng).expect("cand is non-empty")
            };
            used.insert(pick);
            shape.push(pick);
        }

        shapes.push(shape);
    }

    shapes
}

type PartitionResult = (Vec<Option<usize>>, Vec<u32>);

/// Backtracks over sizes sorted largest-first, filling from the next
/// unoccupied cell in row-major order. For each size, up to 80 candidate
/// shapes are tried in shuffled order before backtracking to the previous
/// size.
fn partition_into_blocks(
    rng: &mut ChaCha20Rng,
    rows: u16,
    cols: u16,
    block_sizes: &[u32],
) -> Option<PartitionResult> {
    let area = rows as usize * cols as usize;
    let mut sizes = block_sizes.to_vec();
    sizes.sort_unstable_by_key(|&n| std::cmp::Reverse(n));

    let mut cell_to_block: Vec<Option<usize>> = vec![None; area];
    let mut block_size: Vec<u32> = vec![0; sizes.len()];

    fn next_free_cell(cell_to_block: &[Option<usize>]) -> Option<usize> {
        cell_to_block.iter().position(|b| b.is_none())
    }

    fn dfs(
        i: usize,
        sizes: &[u32],
        rows: u16,
        cols: u16,
        cell_to_block: &mut Vec<Option<usize>>,
        block_size: &mut Vec<u32>,
        rng: &mut ChaCha20Rng,
    ) -> bool {
        if i == sizes.len() {
            return true;
        }

        let Some(start) = next_free_cell(cell_to_block) else {
            return false;
        };
        let size = sizes[i];

        let free: HashSet<usize> = cell_to_block
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_none())
            .map(|(idx, _)| idx)
            .collect();
        if size as usize > free.len() {
            return false;
        }

        let mut shapes = find_all_shapes(start, size, &free, rows, cols, 80, rng);
        if shapes.is_empty() {
            return false;
        }
        shapes.shuffle(rng);

        for shape in shapes {
            for &cell in &shape {
                cell_to_block[cell] = Some(i);
            }
            block_size[i] = size;

            if dfs(i + 1, sizes, rows, cols, cell_to_block, block_size, rng) {
                return true;
            }

            for &cell in &shape {
                cell_to_block[cell] = None;
            }
        }

        false
    }

    if dfs(
        0,
        &sizes,
        rows,
        cols,
        &mut cell_to_block,
        &mut block_size,
        rng,
    ) {
        Some((cell_to_block, block_size))
    } else {
        None
    }
}

fn build_block_adjacency(
    cell_to_block: &[Option<usize>],
    rows: u16,
    cols: u16,
    n_blocks: usize,
) -> Vec<HashSet<usize>> {
    let mut adj = vec![HashSet::new(); n_blocks];
    for (idx, &block) in cell_to_block.iter().enumerate() {
        let Some(b) = block else { continue };
        for nb in neighbors4(idx, rows, cols) {
            if let Some(b2) = cell_to_block[nb]
                && b2 != b
            {
                adj[b].insert(b2);
            }
        }
    }
    adj
}

/// Graph-colors the block adjacency so adjacent blocks differ, ordering
/// blocks by degree descending and, when `require_all_colors`, preferring
/// unused colors before reused ones at every step.
fn color_blocks_backtracking(
    rng: &mut ChaCha20Rng,
    adj: &[HashSet<usize>],
    palette: &[ColorCode],
    require_all_colors: bool,
) -> Option<Vec<ColorCode>> {
    let n_blocks = adj.len();
    let mut order: Vec<usize> = (0..n_blocks).collect();
    order.sort_by_key(|&b| std::cmp::Reverse(adj[b].len()));

    let mut color_of: Vec<Option<ColorCode>> = vec![None; n_blocks];

    fn can_use(adj: &[HashSet<usize>], color_of: &[Option<ColorCode>], b: usize, col: &ColorCode) -> bool {
        adj[b].iter().all(|&nb| color_of[nb].as_ref() != Some(col))
    }

    fn dfs(
        pos: usize,
        order: &[usize],
        adj: &[HashSet<usize>],
        palette: &[ColorCode],
        require_all_colors: bool,
        color_of: &mut Vec<Option<ColorCode>>,
        rng: &mut ChaCha20Rng,
    ) -> bool {
        if pos == order.len() {
            if require_all_colors {
                let used: HashSet<&ColorCode> = color_of.iter().flatten().collect();
                return used.len() == palette.len();
            }
            return true;
        }

        let b = order[pos];
        let mut candidates: Vec<ColorCode> = palette.to_vec();
        candidates.shuffle(rng);

        if require_all_colors {
            let used: HashSet<&ColorCode> = color_of.iter().flatten().collect();
            let (unused, reused): (Vec<ColorCode>, Vec<ColorCode>) =
                candidates.into_iter().partition(|c| !used.contains(c));
            candidates = unused.into_iter().chain(reused).collect();
        }

        for col in candidates {
            if can_use(adj, color_of, b, &col) {
                color_of[b] = Some(col);
                if dfs(
                    pos + 1,
                    order,
                    adj,
                    palette,
                    require_all_colors,
                    color_of,
                    rng,
                ) {
                    return true;
                }
                color_of[b] = None;
            }
        }
        false
    }

    if dfs(
        0,
        &order,
        adj,
        palette,
        require_all_colors,
        &mut color_of,
        rng,
    ) {
        Some(
            color_of
                .into_iter()
                .map(|c| c.expect("every block is colored on success"))
                .collect(),
        )
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette(colors: &[&str]) -> Vec<ColorCode> {
        colors.iter().map(|c| ColorCode::new(*c)).collect()
    }

    #[test]
    fn constructs_a_valid_solution() {
        let cfg = ConstructConfig {
            rows: 3,
            cols: 3,
            palette: palette(&["R", "B"]),
            numbers: vec![1, 2, 3],
            seed: 1,
            style: Style::Balanced,
            require_all_numbers: true,
            require_all_colors: true,
            max_attempts: 300,
        };
        let (sol, base) = construct_solution(&cfg).expect("3x3 with numbers 1,2,3 is feasible");
        sol.check_invariants(&base).unwrap();

        let sizes: HashSet<u32> = sol.blocks().iter().map(|b| b.value.num).collect();
        assert_eq!(sizes, HashSet::from([1, 2, 3]));
    }

    #[test]
    fn rejects_infeasible_required_numbers() {
        let cfg = ConstructConfig {
            rows: 2,
            cols: 2,
            palette: palette(&["R", "B"]),
            numbers: vec![1, 2, 3, 4],
            seed: 1,
            style: Style::Uniform,
            require_all_numbers: true,
            require_all_colors: false,
            max_attempts: 10,
        };
        assert!(matches!(
            construct_solution(&cfg),
            Err(GenError::NumbersExceedArea { .. })
        ));
    }

    #[test]
    fn single_color_palette_only_feasible_without_adjacent_blocks() {
        let cfg = ConstructConfig {
            rows: 1,
            cols: 1,
            palette: palette(&["R"]),
            numbers: vec![1],
            seed: 5,
            style: Style::Uniform,
            require_all_numbers: true,
            require_all_colors: true,
            max_attempts: 50,
        };
        let (sol, base) = construct_solution(&cfg).unwrap();
        sol.check_invariants(&base).unwrap();
    }

    #[test]
    fn same_seed_is_deterministic() {
        let cfg = ConstructConfig {
            rows: 4,
            cols: 4,
            palette: palette(&["R", "B", "Y"]),
            numbers: vec![1, 2, 3],
            seed: 99,
            style: Style::Small,
            require_all_numbers: false,
            require_all_colors: true,
            max_attempts: 300,
        };
        let (sol_a, base_a) = construct_solution(&cfg).unwrap();
        let (sol_b, base_b) = construct_solution(&cfg).unwrap();
        assert_eq!(sol_a, sol_b);
        assert_eq!(base_a, base_b);
    }
}
