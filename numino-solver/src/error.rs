use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Core(#[from] numino_core::CoreError),

    #[error(
        "puzzle has {numbers} numbers x {colors} colors = {product} value combinations per cell, \
         exceeding the {max}-bit domain representation"
    )]
    DomainTooLarge {
        numbers: usize,
        colors: usize,
        product: usize,
        max: u32,
    },
}
