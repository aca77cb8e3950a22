use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The remote store answered with `success: false`.
    #[error("{0}")]
    Operation(String),

    /// A record in a batch was rejected, or the caller's input was unusable.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to decode record: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}
