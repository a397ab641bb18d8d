use thiserror::Error;

/// Failure of a listing request against the index API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("index returned HTTP {0}")]
    Status(u16),

    #[error("could not decode index response: {0}")]
    Decode(String),

    #[error("index API error {code}: {message}")]
    Api { code: i64, message: String },
}

/// Failure of a content fetch against the retrieval gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("timed out")]
    Timeout,

    #[error("gateway returned HTTP {0}")]
    Status(u16),

    #[error("not an image ({0})")]
    NotImage(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            IndexError::Decode(e.to_string())
        } else {
            IndexError::Transport(e.to_string())
        }
    }
}
