use std::time::Duration;
use thiserror::Error;

/// Failure to read published articles from a content store.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("content store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed article payload: {0}")]
    Decode(String),

    #[error("content store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}
