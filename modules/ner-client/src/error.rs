use thiserror::Error;

pub type Result<T> = std::result::Result<T, NerError>;

#[derive(Debug, Error)]
pub enum NerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for NerError {
    fn from(err: reqwest::Error) -> Self {
        NerError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for NerError {
    fn from(err: serde_json::Error) -> Self {
        NerError::Parse(err.to_string())
    }
}
