use septima_index::IndexError;
use septima_llm::LlmError;

/// Errors surfaced to callers of the pipeline.
///
/// Messages never carry provider detail; the underlying cause is logged where
/// it is collapsed into one of these variants.
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    /// Bad caller-supplied data. Not retryable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An embedding, index, or completion provider failed. Retryable.
    #[error("a required service is unavailable, please try again")]
    UpstreamUnavailable,

    #[error("internal error processing your question")]
    Internal,
}

impl RagError {
    /// Classify an embedding failure at a boundary that keeps the taxonomy.
    pub(crate) fn from_llm(err: &LlmError) -> Self {
        match err {
            LlmError::InvalidInput(msg) => Self::InvalidInput(msg.clone()),
            _ => Self::UpstreamUnavailable,
        }
    }

    pub(crate) fn from_index(err: &IndexError) -> Self {
        match err {
            IndexError::InvalidInput(msg) => Self::InvalidInput(msg.clone()),
            _ => Self::UpstreamUnavailable,
        }
    }
}

pub type Result<T> = std::result::Result<T, RagError>;
