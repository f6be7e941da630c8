use http::StatusCode;

pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Malformed inbound request; always answered before any backend call.
    #[error("{0}")]
    Validation(String),
    /// Failure reported by a backend, or by an auxiliary call an adapter depends on.
    #[error("{0}")]
    Backend(String),
    /// Prompt or payload construction failed inside an adapter.
    #[error("{0}")]
    Adapter(String),
    /// Writing to the client failed.
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Unsupported(String),
    /// No connector is configured for the selected backend.
    #[error("{0}")]
    Unavailable(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Unsupported(_) => StatusCode::NOT_FOUND,
            RelayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::Backend(_) | RelayError::Adapter(_) | RelayError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Validation(_) => "validation",
            RelayError::Backend(_) => "backend",
            RelayError::Adapter(_) => "adapter",
            RelayError::Transport(_) => "transport",
            RelayError::Unsupported(_) => "unsupported",
            RelayError::Unavailable(_) => "unavailable",
        }
    }
}
