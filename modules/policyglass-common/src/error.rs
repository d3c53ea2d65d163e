use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyGlassError {
    #[error("Invalid bill id: {0}")]
    InvalidBillId(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl PolicyGlassError {
    /// Structural input errors surface as 4xx to the caller; everything else
    /// is either degraded locally or reported as 500 at the orchestration
    /// boundary.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PolicyGlassError::InvalidBillId(_) | PolicyGlassError::InvalidRequest(_)
        )
    }
}
