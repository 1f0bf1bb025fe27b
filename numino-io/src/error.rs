use numino_core::CoreError;

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
