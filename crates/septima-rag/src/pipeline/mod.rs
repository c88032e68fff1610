mod orchestrator;

pub use orchestrator::RagPipeline;

use septima_index::IndexError;
use septima_llm::LlmError;

/// Steps of one `answer` call, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Routing,
    Rewriting,
    Embedding,
    Retrieving,
    Grouping,
    Prompting,
    Generating,
    Done,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Routing => "routing",
            Self::Rewriting => "rewriting",
            Self::Embedding => "embedding",
            Self::Retrieving => "retrieving",
            Self::Grouping => "grouping",
            Self::Prompting => "prompting",
            Self::Generating => "generating",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum StageError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// A mandatory step failed. Logged at the pipeline boundary, never returned.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub(crate) struct StageFailure {
    pub(crate) stage: Stage,
    #[source]
    pub(crate) source: StageError,
}

pub(crate) fn at<E: Into<StageError>>(stage: Stage) -> impl FnOnce(E) -> StageFailure {
    move |e| StageFailure {
        stage,
        source: e.into(),
    }
}
