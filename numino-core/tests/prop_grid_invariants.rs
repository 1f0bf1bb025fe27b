//! Property-based tests for coordinate arithmetic and solution block derivation.

use numino_core::puzzle::{Coord, Solution, cell_index, coord_of};
use numino_core::{ColorCode, OwnedCellValue};
use proptest::prelude::*;

proptest! {
    /// `coord_of` is always the inverse of `cell_index` for in-range coordinates.
    #[test]
    fn cell_index_roundtrips(
        rows in 1u16..20,
        cols in 1u16..20,
        row in 0u16..20,
        col in 0u16..20,
    ) {
        prop_assume!(row < rows && col < cols);
        let coord = Coord::new(row, col);
        let idx = cell_index(rows, cols, coord).unwrap();
        prop_assert_eq!(coord_of(cols, idx).unwrap(), coord);
    }

    /// A uniform grid of identical values is always exactly one block.
    #[test]
    fn uniform_grid_is_a_single_block(rows in 1u16..6, cols in 1u16..6) {
        let area = rows as usize * cols as usize;
        let grid = vec![OwnedCellValue::new(area as u32, ColorCode::new("R")); area];
        let sol = Solution::from_grid(rows, cols, grid).unwrap();
        prop_assert_eq!(sol.blocks().len(), 1);
    }
}
