use thiserror::Error;

pub type Result<T> = std::result::Result<T, FecError>;

#[derive(Debug, Error)]
pub enum FecError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FecError {
    fn from(err: reqwest::Error) -> Self {
        FecError::Network(err.to_string())
    }
}

impl From<url::ParseError> for FecError {
    fn from(err: url::ParseError) -> Self {
        FecError::Parse(err.to_string())
    }
}
