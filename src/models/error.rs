/// Every failure the dashboard can surface.
///
/// The `Display` output is the message shown to the user, so variants that
/// carry a message render it verbatim.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized(_))
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AppError::NotFound(_)
                | AppError::Unauthorized(_)
                | AppError::Validation(_)
                | AppError::ConfigError(_)
        )
    }

    /// HTTP status behind the error, when it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Unauthorized(_) => Some(401),
            AppError::NotFound(_) => Some(404),
            AppError::Validation(_) => Some(422),
            AppError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
