use thiserror::Error;

/// Container-level failures while reading a source. Malformed individual
/// rows are not errors at this level; adapters log and skip them.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Required structure (columns, tables) is missing; aborts the run.
    #[error("malformed source: {0}")]
    Format(String),

    #[error("failed to read source file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to query database: {0}")]
    Database(#[from] rusqlite::Error),
}
