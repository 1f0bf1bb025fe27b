use std::fs;

use numino_core::{ColorCode, OwnedCellValue, Puzzle, Solution};
use numino_gen::{CalibrationInput, DeconstructConfig, Difficulty, Strategy, Style, deconstruct, generate};
use numino_io::{PuzzleRecord, SolutionsFile, from_record, read_puzzle_file, to_record, write_puzzle_file, write_solutions_file};

#[cfg(feature = "telemetry-subscriber")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("numino_solver=trace,numino_gen=trace,numino_io=info,numino_cli=info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(not(feature = "telemetry-subscriber"))]
fn init_tracing() {}

fn usage() -> &'static str {
    "numino-cli\n\
\n\
USAGE:\n\
  numino-cli generate --rows <R> --cols <C> --numbers <N,N,..> --colors <C,C,..> \\\n\
                       [--balance uniform|small|big|balanced] [--seed <S>] \\\n\
                       [--out <puzzle.json>] [--solutions-out <solutions.json>]\n\
  numino-cli solve --file <puzzle.json> [--id <ID>] [--seed <S>]\n\
  numino-cli count --file <puzzle.json> [--id <ID>] [--seed <S>] [--limit <L>]\n\
  numino-cli deconstruct --file <puzzle.json> --solutions <solutions.json> [--id <ID>] \\\n\
                          [--difficulty easy|medium|hard|expert] [--strategy any|number|color] \\\n\
                          [--seed <S>] [--max-steps <N>] [--out <puzzle.json>]\n\
\n\
EXAMPLES:\n\
  numino-cli generate --rows 5 --cols 5 --numbers 1,2,3 --colors R,B,Y --seed 42\n\
  numino-cli solve --file puzzle.json\n\
  numino-cli count --file puzzle.json --limit 2\n"
}

fn parse_arg_value(args: &[String], i: &mut usize) -> Result<String, String> {
    *i += 1;
    args.get(*i).cloned().ok_or_else(|| "missing value".to_string())
}

fn parse_csv<T: std::str::FromStr>(s: &str, what: &str) -> Result<Vec<T>, String> {
    s.split(',')
        .map(|part| part.trim().parse::<T>().map_err(|_| format!("invalid {what}: {part}")))
        .collect()
}

fn parse_style(s: &str) -> Option<Style> {
    match s.to_ascii_lowercase().as_str() {
        "uniform" => Some(Style::Uniform),
        "small" => Some(Style::Small),
        "big" => Some(Style::Big),
        "balanced" => Some(Style::Balanced),
        _ => None,
    }
}

fn style_label(style: Style) -> &'static str {
    match style {
        Style::Uniform => "UNIFORM",
        Style::Small => "SMALL",
        Style::Big => "BIG",
        Style::Balanced => "BALANCED",
    }
}

fn parse_difficulty(s: &str) -> Option<Difficulty> {
    match s.to_ascii_lowercase().as_str() {
        "easy" => Some(Difficulty::Easy),
        "medium" => Some(Difficulty::Medium),
        "hard" => Some(Difficulty::Hard),
        "expert" => Some(Difficulty::Expert),
        _ => None,
    }
}

fn difficulty_ordinal(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 0,
        Difficulty::Medium => 1,
        Difficulty::Hard => 2,
        Difficulty::Expert => 3,
    }
}

fn parse_strategy(s: &str) -> Option<Strategy> {
    match s.to_ascii_lowercase().as_str() {
        "any" => Some(Strategy::Any),
        "number" => Some(Strategy::NumberFirst),
        "color" => Some(Strategy::ColorFirst),
        _ => None,
    }
}

fn select_record<'a>(records: &'a [PuzzleRecord], id: Option<&str>) -> Result<&'a PuzzleRecord, String> {
    match id {
        Some(id) => records.iter().find(|r| r.id == id).ok_or_else(|| format!("no puzzle with id {id} in file")),
        None => records.first().ok_or_else(|| "puzzle file has no puzzles".to_string()),
    }
}

fn print_solution(solution: &Solution) {
    for r in 0..solution.rows {
        let mut cells = Vec::with_capacity(solution.cols as usize);
        for c in 0..solution.cols {
            let value = solution.get(numino_core::Coord::new(r, c)).expect("in range");
            cells.push(format!("{}{}", value.num, value.col.as_str()));
        }
        println!("{}", cells.join(" "));
    }
}

fn solution_from_record(
    rows: u16,
    cols: u16,
    cells: &std::collections::BTreeMap<String, numino_io::SolutionCell>,
) -> Result<Solution, String> {
    let mut grid = Vec::with_capacity(rows as usize * cols as usize);
    for r in 0..rows {
        for c in 0..cols {
            let key = format!("{r},{c}");
            let cell = cells.get(&key).ok_or_else(|| format!("solutions file is missing cell {key}"))?;
            grid.push(OwnedCellValue::new(cell.num, ColorCode::new(&cell.col)));
        }
    }
    Solution::from_grid(rows, cols, grid).map_err(|e| e.to_string())
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err}\n\n{}", usage());
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        return Err("missing command".to_string());
    }
    let cmd = args[1].as_str();

    let mut rows: Option<u16> = None;
    let mut cols: Option<u16> = None;
    let mut numbers: Option<String> = None;
    let mut colors: Option<String> = None;
    let mut balance = Style::Balanced;
    let mut seed: u64 = 0;
    let mut file: Option<String> = None;
    let mut solutions_path: Option<String> = None;
    let mut id: Option<String> = None;
    let mut limit: u32 = 2;
    let mut difficulty = Difficulty::Medium;
    let mut strategy = Strategy::Any;
    let mut max_steps: u32 = 50_000;
    let mut out: Option<String> = None;
    let mut solutions_out: Option<String> = None;

    let mut i = 2usize;
    while i < args.len() {
        match args[i].as_str() {
            "--rows" => rows = Some(parse_arg_value(&args, &mut i)?.parse().map_err(|_| "invalid --rows".to_string())?),
            "--cols" => cols = Some(parse_arg_value(&args, &mut i)?.parse().map_err(|_| "invalid --cols".to_string())?),
            "--numbers" => numbers = Some(parse_arg_value(&args, &mut i)?),
            "--colors" => colors = Some(parse_arg_value(&args, &mut i)?),
            "--balance" => {
                let v = parse_arg_value(&args, &mut i)?;
                balance = parse_style(&v).ok_or_else(|| "invalid --balance".to_string())?;
            }
            "--seed" => seed = parse_arg_value(&args, &mut i)?.parse().map_err(|_| "invalid --seed".to_string())?,
            "--file" => file = Some(parse_arg_value(&args, &mut i)?),
            "--solutions" => solutions_path = Some(parse_arg_value(&args, &mut i)?),
            "--id" => id = Some(parse_arg_value(&args, &mut i)?),
            "--limit" => limit = parse_arg_value(&args, &mut i)?.parse().map_err(|_| "invalid --limit".to_string())?,
            "--difficulty" => {
                let v = parse_arg_value(&args, &mut i)?;
                difficulty = parse_difficulty(&v).ok_or_else(|| "invalid --difficulty".to_string())?;
            }
            "--strategy" => {
                let v = parse_arg_value(&args, &mut i)?;
                strategy = parse_strategy(&v).ok_or_else(|| "invalid --strategy".to_string())?;
            }
            "--max-steps" => max_steps = parse_arg_value(&args, &mut i)?.parse().map_err(|_| "invalid --max-steps".to_string())?,
            "--out" => out = Some(parse_arg_value(&args, &mut i)?),
            "--solutions-out" => solutions_out = Some(parse_arg_value(&args, &mut i)?),
            "--help" | "-h" => {
                println!("{}", usage());
                return Ok(());
            }
            other => return Err(format!("unknown arg: {other}")),
        }
        i += 1;
    }

    match cmd {
        "generate" => {
            let rows = rows.ok_or_else(|| "'generate' requires --rows".to_string())?;
            let cols = cols.ok_or_else(|| "'generate' requires --cols".to_string())?;
            let numbers = numbers.ok_or_else(|| "'generate' requires --numbers".to_string())?;
            let colors = colors.ok_or_else(|| "'generate' requires --colors".to_string())?;

            let numbers: Vec<u32> = parse_csv(&numbers, "--numbers entry")?;
            let colors: Vec<ColorCode> = colors.split(',').map(|c| ColorCode::new(c.trim())).collect();

            let input = CalibrationInput {
                rows,
                cols,
                numbers,
                colors,
                balance,
                seed,
            };
            let result = generate(&input).map_err(|e| e.to_string())?;

            let record = to_record(&result.puzzle, &result.id, style_label(result.style), difficulty_ordinal(result.difficulty));
            let file = numino_io::PuzzleFile::new(vec![record]);
            let json = write_puzzle_file(&file).map_err(|e| e.to_string())?;
            match &out {
                Some(path) => fs::write(path, &json).map_err(|e| e.to_string())?,
                None => println!("{json}"),
            }

            if let Some(path) = solutions_out {
                let mut solutions = SolutionsFile::default();
                solutions.insert(&result.id, &result.solution);
                let json = write_solutions_file(&solutions).map_err(|e| e.to_string())?;
                fs::write(&path, &json).map_err(|e| e.to_string())?;
            }
        }
        "solve" => {
            let file = file.ok_or_else(|| "'solve' requires --file".to_string())?;
            let json = fs::read_to_string(&file).map_err(|e| e.to_string())?;
            let puzzle_file = read_puzzle_file(&json).map_err(|e| e.to_string())?;
            let record = select_record(&puzzle_file.puzzles, id.as_deref())?;
            let puzzle: Puzzle = from_record(record).map_err(|e| e.to_string())?;

            match numino_solver::solve(&puzzle, seed).map_err(|e| e.to_string())? {
                Some(solution) => print_solution(&solution),
                None => println!("no-solution"),
            }
        }
        "count" => {
            let file = file.ok_or_else(|| "'count' requires --file".to_string())?;
            let json = fs::read_to_string(&file).map_err(|e| e.to_string())?;
            let puzzle_file = read_puzzle_file(&json).map_err(|e| e.to_string())?;
            let record = select_record(&puzzle_file.puzzles, id.as_deref())?;
            let puzzle: Puzzle = from_record(record).map_err(|e| e.to_string())?;

            let count = numino_solver::count_solutions(&puzzle, limit, seed).map_err(|e| e.to_string())?;
            println!("{count}");
        }
        "deconstruct" => {
            let file = file.ok_or_else(|| "'deconstruct' requires --file".to_string())?;
            let solutions_path = solutions_path.ok_or_else(|| "'deconstruct' requires --solutions".to_string())?;

            let json = fs::read_to_string(&file).map_err(|e| e.to_string())?;
            let puzzle_file = read_puzzle_file(&json).map_err(|e| e.to_string())?;
            let record = select_record(&puzzle_file.puzzles, id.as_deref())?;
            let puzzle: Puzzle = from_record(record).map_err(|e| e.to_string())?;

            let solutions_json = fs::read_to_string(&solutions_path).map_err(|e| e.to_string())?;
            let solutions_file = numino_io::read_solutions_file(&solutions_json).map_err(|e| e.to_string())?;
            let cells = solutions_file.get(&record.id).ok_or_else(|| format!("no solution recorded for id {}", record.id))?;
            let solution = solution_from_record(puzzle.rows, puzzle.cols, cells)?;

            let base = Puzzle::new(
                puzzle.rows,
                puzzle.cols,
                puzzle.palette.clone(),
                puzzle.numbers.clone(),
                puzzle.row_sums.clone(),
                puzzle.col_sums.clone(),
                Vec::new(),
            )
            .map_err(|e| e.to_string())?;

            let cfg = DeconstructConfig {
                seed,
                difficulty,
                max_steps,
                strategy,
            };
            let deconstructed = deconstruct(&base, &solution, cfg).map_err(|e| e.to_string())?;

            let record_out = to_record(&deconstructed, &record.id, &record.bias, difficulty_ordinal(difficulty));
            let file_out = numino_io::PuzzleFile::new(vec![record_out]);
            let json = write_puzzle_file(&file_out).map_err(|e| e.to_string())?;
            match &out {
                Some(path) => fs::write(path, &json).map_err(|e| e.to_string())?,
                None => println!("{json}"),
            }
        }
        _ => return Err(format!("unknown command: {cmd}")),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_csv_numbers() {
        let nums: Vec<u32> = parse_csv("1, 2,3", "--numbers entry").unwrap();
        assert_eq!(nums, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_bad_style() {
        assert!(parse_style("bogus").is_none());
        assert_eq!(parse_style("BALANCED"), Some(Style::Balanced));
    }

    #[test]
    fn rejects_bad_difficulty() {
        assert!(parse_difficulty("nightmare").is_none());
        assert_eq!(parse_difficulty("expert"), Some(Difficulty::Expert));
    }

    #[test]
    fn select_record_falls_back_to_first_without_id() {
        let records = vec![
            to_record(
                &Puzzle::new(1, 1, vec![ColorCode::new("R")], vec![1], vec![1], vec![1], Vec::new()).unwrap(),
                "a",
                "UNIFORM",
                0,
            ),
            to_record(
                &Puzzle::new(1, 1, vec![ColorCode::new("R")], vec![1], vec![1], vec![1], Vec::new()).unwrap(),
                "b",
                "UNIFORM",
                0,
            ),
        ];
        assert_eq!(select_record(&records, None).unwrap().id, "a");
        assert_eq!(select_record(&records, Some("b")).unwrap().id, "b");
        assert!(select_record(&records, Some("missing")).is_err());
    }
}
