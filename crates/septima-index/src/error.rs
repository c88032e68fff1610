/// Errors returned by [`PassageIndex`](crate::PassageIndex) implementations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The request was rejected: empty vector, bad filter, or a 4xx from the service.
    #[error("invalid index query: {0}")]
    InvalidInput(String),

    /// 5xx from the service; retryable by the caller.
    #[error("index service unavailable (status {status})")]
    Unavailable { status: u16 },

    /// Transport failure or timeout.
    #[error("index request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("index response parse failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Local backend failure, e.g. a poisoned lock in the in-memory index.
    #[error("index store error: {0}")]
    Store(String),
}

impl IndexError {
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
