//! The persisted JSON record format: a `version` tag plus a list of public
//! puzzle records (no solutions), and a separate solutions-by-id store for
//! the collaborator that wants to keep answers private.

use std::collections::BTreeMap;

use numino_core::{ColorCode, Given, Puzzle, Solution};
use serde::{Deserialize, Serialize};

use crate::error::IoError;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleFile {
    pub version: u32,
    pub puzzles: Vec<PuzzleRecord>,
}

impl PuzzleFile {
    pub fn new(puzzles: Vec<PuzzleRecord>) -> Self {
        Self {
            version: FORMAT_VERSION,
            puzzles,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub id: String,
    pub grid: GridSize,
    pub allowed: Allowed,
    pub bias: String,
    pub difficulty: u32,
    pub constraints: Constraints,
    pub givens: Vec<GivenRecord>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: u16,
    pub cols: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allowed {
    pub numbers: Vec<u32>,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraints {
    pub row_sums: Vec<i64>,
    pub col_sums: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GivenRecord {
    pub r: u16,
    pub c: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<String>,
}

/// Converts a [`Puzzle`] into its wire record, tagging it with an `id`,
/// human-readable `bias` label, and a difficulty ordinal.
pub fn to_record(puzzle: &Puzzle, id: impl Into<String>, bias: impl Into<String>, difficulty: u32) -> PuzzleRecord {
    PuzzleRecord {
        id: id.into(),
        grid: GridSize {
            rows: puzzle.rows,
            cols: puzzle.cols,
        },
        allowed: Allowed {
            numbers: puzzle.numbers.clone(),
            colors: puzzle.palette.iter().map(|c| c.as_str().to_string()).collect(),
        },
        bias: bias.into(),
        difficulty,
        constraints: Constraints {
            row_sums: puzzle.row_sums.clone(),
            col_sums: puzzle.col_sums.clone(),
        },
        givens: puzzle
            .givens
            .iter()
            .map(|g| GivenRecord {
                r: g.row,
                c: g.col,
                num: g.num,
                col: g.color.as_ref().map(|c| c.as_str().to_string()),
            })
            .collect(),
    }
}

/// Reconstructs a [`Puzzle`] from its wire record, validating every
/// invariant the data model requires.
pub fn from_record(record: &PuzzleRecord) -> Result<Puzzle, IoError> {
    let palette: Vec<ColorCode> = record.allowed.colors.iter().map(ColorCode::new).collect();
    let givens: Vec<Given> = record
        .givens
        .iter()
        .map(|g| Given::new(g.r, g.c, g.num, g.col.as_deref().map(ColorCode::new)))
        .collect();

    Ok(Puzzle::new(
        record.grid.rows,
        record.grid.cols,
        palette,
        record.allowed.numbers.clone(),
        record.constraints.row_sums.clone(),
        record.constraints.col_sums.clone(),
        givens,
    )?)
}

pub fn write_puzzle_file(file: &PuzzleFile) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(file)?)
}

pub fn read_puzzle_file(json: &str) -> Result<PuzzleFile, IoError> {
    Ok(serde_json::from_str(json)?)
}

/// One cell of a privately stored solution, keyed by `"r,c"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionCell {
    pub num: u32,
    pub col: String,
}

/// Solutions stored separately from the public puzzle record, keyed by
/// puzzle id and then by `"r,c"` cell key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolutionsFile(pub BTreeMap<String, BTreeMap<String, SolutionCell>>);

impl SolutionsFile {
    pub fn insert(&mut self, puzzle_id: impl Into<String>, solution: &Solution) {
        let mut cells = BTreeMap::new();
        for (coord, value) in solution.iter() {
            cells.insert(
                format!("{},{}", coord.row, coord.col),
                SolutionCell {
                    num: value.num,
                    col: value.col.as_str().to_string(),
                },
            );
        }
        self.0.insert(puzzle_id.into(), cells);
    }

    pub fn get(&self, puzzle_id: &str) -> Option<&BTreeMap<String, SolutionCell>> {
        self.0.get(puzzle_id)
    }
}

pub fn write_solutions_file(file: &SolutionsFile) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(file)?)
}

pub fn read_solutions_file(json: &str) -> Result<SolutionsFile, IoError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_puzzle() -> Puzzle {
        Puzzle::new(
            1,
            2,
            vec![ColorCode::new("R"), ColorCode::new("B")],
            vec![1, 2],
            vec![3],
            vec![1, 2],
            vec![Given::new(0, 0, Some(1), Some(ColorCode::new("R")))],
        )
        .unwrap()
    }

    #[test]
    fn record_round_trips_through_json() {
        let puzzle = sample_puzzle();
        let record = to_record(&puzzle, "test-id", "BALANCED", 1);
        let json = serde_json::to_string(&record).unwrap();
        let parsed: PuzzleRecord = serde_json::from_str(&json).unwrap();
        let rebuilt = from_record(&parsed).unwrap();
        assert_eq!(rebuilt, puzzle);
    }

    #[test]
    fn hidden_given_parts_are_omitted_from_json() {
        let puzzle = sample_puzzle();
        let record = to_record(&puzzle, "id", "SMALL", 0);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"num\":1"));
        assert!(json.contains("\"col\":\"R\""));
    }

    #[test]
    fn puzzle_file_wraps_version_and_puzzles() {
        let record = to_record(&sample_puzzle(), "id", "BIG", 2);
        let file = PuzzleFile::new(vec![record]);
        let json = write_puzzle_file(&file).unwrap();
        let parsed = read_puzzle_file(&json).unwrap();
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.puzzles.len(), 1);
    }

    #[test]
    fn solutions_file_keys_cells_by_row_comma_col() {
        let puzzle = sample_puzzle();
        let solution = Solution::from_grid(
            puzzle.rows,
            puzzle.cols,
            vec![
                numino_core::OwnedCellValue::new(1, ColorCode::new("R")),
                numino_core::OwnedCellValue::new(2, ColorCode::new("B")),
            ],
        )
        .unwrap();

        let mut file = SolutionsFile::default();
        file.insert("puzzle-1", &solution);

        let cells = file.get("puzzle-1").unwrap();
        assert_eq!(cells.get("0,0").unwrap().num, 1);
        assert_eq!(cells.get("0,1").unwrap().col, "B");
    }
}
