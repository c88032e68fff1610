#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("{provider} returned status {status}")]
    Status { provider: String, status: u16 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Caller-supplied data was rejected; retrying the same request will not help.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_classification() {
        assert!(LlmError::InvalidInput("empty".into()).is_invalid_input());
        assert!(!LlmError::RateLimited.is_invalid_input());
        assert!(
            !LlmError::Status {
                provider: "openai".into(),
                status: 503
            }
            .is_invalid_input()
        );
    }

    #[test]
    fn status_display_omits_body() {
        let err = LlmError::Status {
            provider: "openai".into(),
            status: 502,
        };
        assert_eq!(err.to_string(), "openai returned status 502");
    }
}
