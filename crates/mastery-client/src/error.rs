use crate::retry::Retryable;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-2xx response from the chat API. 429 and 5xx are transient; every
    /// other status (auth, validation, malformed request) is terminal.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Model reply contained no text content")]
    EmptyResponse,

    #[error(transparent)]
    Core(#[from] mastery_core::Error),
}

impl Retryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Api { status, .. } => *status == 429 || (500..=599).contains(status),
            // Per-attempt timeouts count against the retry budget, same as
            // connection failures.
            Error::Http(err) => err.is_connect() || err.is_timeout(),
            _ => false,
        }
    }
}
