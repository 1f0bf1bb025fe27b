//! Biased selection of the block-size multiset that tiles a grid.
//!
//! The local weight curve shapes what sizes are favored in isolation; the
//! steering factor additionally nudges every pick toward a target block
//! count so the bias is visible in the finished puzzle, not just locally.

use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

/// A user-facing preference for the distribution of block sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Small,
    Balanced,
    Big,
    Uniform,
}

fn base_weight(style: Style, n: u32) -> f64 {
    let n = n as f64;
    match style {
        Style::Uniform => 1.0,
        Style::Small => 1.0 / n.powf(1.1),
        Style::Big => n.powf(1.6),
        Style::Balanced => n.powf(0.5),
    }
}

fn target_block_count(area: usize, numbers: &[u32], style: Style) -> f64 {
    let n_min = *numbers.iter().min().unwrap() as f64;
    let n_max = *numbers.iter().max().unwrap() as f64;
    let n_mean = numbers.iter().copied().map(|n| n as f64).sum::<f64>() / numbers.len() as f64;
    let area = area as f64;

    match style {
        Style::Small => area / n_min,
        Style::Big => area / n_max,
        Style::Uniform | Style::Balanced => area / n_mean,
    }
}

fn weighted_choice(rng: &mut ChaCha20Rng, items: &[u32], weights: &[f64]) -> u32 {
    let total: f64 = weights.iter().sum();
    let r = rng.random::<f64>() * total;
    let mut acc = 0.0;
    for (&item, &w) in items.iter().zip(weights) {
        acc += w;
        if r <= acc {
            return item;
        }
    }
    *items.last().expect("items is non-empty")
}

/// Picks a multiset of block sizes (drawn from `numbers`) summing exactly to
/// `area`, biased by `style`. Returns `None` if `max_tries` restarts all hit
/// a dead end (no remaining size fit the leftover area).
///
/// If `require_all_numbers`, the multiset is seeded with one of every allowed
/// number before the weighted fill begins; this fails immediately (`None`,
/// on the first try) if `sum(numbers) > area`.
pub fn choose_block_sizes_biased(
    rng: &mut ChaCha20Rng,
    area: usize,
    numbers: &[u32],
    style: Style,
    require_all_numbers: bool,
    max_tries: u32,
) -> Option<Vec<u32>> {
    if numbers.is_empty() {
        return None;
    }
    let seed_sum: usize = numbers.iter().map(|&n| n as usize).sum();
    if require_all_numbers && seed_sum > area {
        return None;
    }

    let n_min = *numbers.iter().min().unwrap();
    let n_max = *numbers.iter().max().unwrap();

    for _ in 0..max_tries {
        let mut remaining = area;
        let mut blocks: Vec<u32> = Vec::new();

        if require_all_numbers {
            blocks.extend_from_slice(numbers);
            remaining -= seed_sum;
        }

        let target_blocks = target_block_count(area, numbers, style);
        let mut guard = 10_000;

        while remaining > 0 && guard > 0 {
            guard -= 1;
            let fits: Vec<u32> = numbers
                .iter()
                .copied()
                .filter(|&n| n as usize <= remaining)
                .collect();
            if fits.is_empty() {
                break;
            }

            let delta = target_blocks - blocks.len() as f64;
            let weights: Vec<f64> = fits
                .iter()
                .map(|&n| {
                    let base = base_weight(style, n);
                    let factor = if delta > 0.0 {
                        (n_max as f64 / n as f64).powf(0.6)
                    } else {
                        (n as f64 / n_min as f64).powf(0.6)
                    };
                    base * factor
                })
                .collect();

            let pick = weighted_choice(rng, &fits, &weights);
            blocks.push(pick);
            remaining -= pick as usize;
        }

        if remaining == 0 {
            blocks.shuffle(rng);
            return Some(blocks);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::rng_from_u64;

    #[test]
    fn picks_sizes_summing_to_area() {
        let mut rng = rng_from_u64(7);
        let blocks =
            choose_block_sizes_biased(&mut rng, 25, &[1, 2, 3, 4, 5], Style::Balanced, true, 3000)
                .expect("feasible area");
        assert_eq!(blocks.iter().copied().sum::<u32>(), 25);
        for n in [1, 2, 3, 4, 5] {
            assert!(blocks.contains(&n));
        }
    }

    #[test]
    fn fails_fast_when_required_numbers_exceed_area() {
        let mut rng = rng_from_u64(1);
        assert!(choose_block_sizes_biased(&mut rng, 3, &[1, 2, 3, 4], Style::Uniform, true, 100).is_none());
    }

    #[test]
    fn small_style_skews_toward_more_small_blocks_than_big_style() {
        let numbers = [1u32, 2, 3, 4, 5];
        let area = 25 * 5;

        let mut small_hist = [0u32; 6];
        let mut big_hist = [0u32; 6];
        for seed in 0..30u64 {
            let mut rng = rng_from_u64(seed);
            let small = choose_block_sizes_biased(&mut rng, area, &numbers, Style::Small, false, 3000)
                .unwrap();
            for n in small {
                small_hist[n as usize] += 1;
            }

            let mut rng = rng_from_u64(seed);
            let big = choose_block_sizes_biased(&mut rng, area, &numbers, Style::Big, false, 3000)
                .unwrap();
            for n in big {
                big_hist[n as usize] += 1;
            }
        }

        let small_low: u32 = small_hist[1] + small_hist[2];
        let small_high: u32 = small_hist[4] + small_hist[5];
        let big_low: u32 = big_hist[1] + big_hist[2];
        let big_high: u32 = big_hist[4] + big_hist[5];

        assert!(small_low > small_high);
        assert!(big_high > big_low);
    }
}
