use thiserror::Error;

pub type Result<T> = std::result::Result<T, CongressError>;

#[derive(Debug, Error)]
pub enum CongressError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for CongressError {
    fn from(err: reqwest::Error) -> Self {
        CongressError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CongressError {
    fn from(err: serde_json::Error) -> Self {
        CongressError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for CongressError {
    fn from(err: url::ParseError) -> Self {
        CongressError::Parse(err.to_string())
    }
}
