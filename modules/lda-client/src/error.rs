use thiserror::Error;

pub type Result<T> = std::result::Result<T, LdaError>;

#[derive(Debug, Error)]
pub enum LdaError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LdaError {
    fn from(err: reqwest::Error) -> Self {
        LdaError::Network(err.to_string())
    }
}

impl From<url::ParseError> for LdaError {
    fn from(err: url::ParseError) -> Self {
        LdaError::Parse(err.to_string())
    }
}
