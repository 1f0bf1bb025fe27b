use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error(transparent)]
    Core(#[from] numino_core::CoreError),

    #[error(transparent)]
    Solve(#[from] numino_solver::SolveError),

    #[error(
        "require_all_numbers is set but sum(numbers)={sum} exceeds the grid area={area}"
    )]
    NumbersExceedArea { sum: i64, area: usize },

    #[error("palette is empty; at least one color is required")]
    EmptyPalette,

    #[error(
        "construction did not reach a valid partition and coloring after {attempts} attempts"
    )]
    ConstructionExhausted { attempts: u32 },

    #[error(
        "generation failed: {stage} stage never converged after {attempts} attempts starting from seed {seed}"
    )]
    GenerationExhausted {
        stage: &'static str,
        attempts: u32,
        seed: u64,
    },
}
