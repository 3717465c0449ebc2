use history_import_remote::RemoteError;
use history_import_sources::SourceError;
use thiserror::Error;

/// Errors that abort an import run. Everything else (unresolved shows,
/// malformed rows, failed writes) is captured in the run's
/// [`ImportReport`](history_import_models::ImportReport) instead.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The source container itself is unreadable or malformed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Missing credentials or an unusable option, detected before any
    /// processing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Remote collaborator failure during setup (authentication).
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
