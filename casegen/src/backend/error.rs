use thiserror::Error;

/// Failure reported by a chat backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("backend transport error: {0}")]
    Transport(String),
    #[error("malformed backend response: {0}")]
    Decode(String),
    #[error("backend failed mid-stream: {0}")]
    Stream(String),
}

impl BackendError {
    /// HTTP status carried by the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Rate limiting (429) and server-side failures (5xx) are worth one retry.
    pub fn is_transient(&self) -> bool {
        matches!(self.status(), Some(status) if status == 429 || status >= 500)
    }
}
