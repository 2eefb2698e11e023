use thiserror::Error;

/// Errors from extraction/summarization providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider failed: {0}")]
    Failed(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("run deadline exceeded after {0} s")]
    DeadlineExceeded(u64),
}

/// Errors from the persistence store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store time error: {0}")]
    Time(#[from] time::error::Format),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Failures surfaced by the extraction pipeline and the insight lifecycle.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("extraction service error: {0}")]
    ExtractionService(#[from] ProviderError),

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<time::error::Format> for PipelineError {
    fn from(err: time::error::Format) -> Self {
        PipelineError::Persistence(StoreError::Time(err))
    }
}
