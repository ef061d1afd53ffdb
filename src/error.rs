use thiserror::Error;

/// No word in the lexicon fits the current practice pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no word available for pool [{pool}] (newest letter {newest:?}, biased: {biased})")]
pub struct StarvationError {
    pub pool: String,
    pub newest: Option<char>,
    pub biased: bool,
}

/// Errors from the progress/config storage layers
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("course not found: {0}")]
    CourseNotFound(String),

    #[error("background writer is gone")]
    WriterClosed,
}

/// Errors from the analytics reporter. Never surfaced to the game loop.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
