use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Worker task error: {0}")]
    Task(String),

    #[error("Relationship detection cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for RelateError {
    fn from(err: polars::error::PolarsError) -> Self {
        RelateError::Polars(err.to_string())
    }
}

impl From<tokio::task::JoinError> for RelateError {
    fn from(err: tokio::task::JoinError) -> Self {
        RelateError::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelateError>;
