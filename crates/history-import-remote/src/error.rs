use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Login failed or no usable credentials were available. Fatal when
    /// raised during client setup.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the remote API.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),
}
