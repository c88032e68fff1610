use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use septima_index::PassageMatch;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Citation of one parent document, carried on assistant turns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(alias = "sermon_id")]
    pub parent_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_preview: Option<String>,
}

impl SourceRef {
    #[must_use]
    pub fn new(parent_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            title: title.into(),
            main_reference: None,
            text_preview: None,
        }
    }
}

/// One turn of a conversation. History is owned by the caller and only read here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>, sources: Vec<SourceRef>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            sources,
        }
    }
}

/// Passages of one parent document, ranked by their best passage.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupedResult {
    pub parent_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preacher: Option<String>,
    pub metadata: HashMap<String, String>,
    pub passages: Vec<PassageMatch>,
    pub relevance_score: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    NeedsRetrieval,
    HistoryOnly,
}

impl RouteDecision {
    /// Map a classifier label to a decision. Only the two exact labels are accepted.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "search_new_sermons" => Some(Self::NeedsRetrieval),
            "answer_from_history" => Some(Self::HistoryOnly),
            _ => None,
        }
    }
}

/// Result of [`RagPipeline::answer`](crate::RagPipeline::answer).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub response: String,
    pub sources: Vec<SourceRef>,
}

pub(crate) const NO_RESULTS_RESPONSE: &str = "I'm sorry, I couldn't find any sermons relevant to your question. \
Please try rephrasing it.";

impl Answer {
    pub(crate) fn no_results() -> Self {
        Self {
            response: NO_RESULTS_RESPONSE.to_owned(),
            sources: Vec::new(),
        }
    }

    /// The assistant turn to append to the caller's history.
    #[must_use]
    pub fn into_message(self) -> ChatMessage {
        ChatMessage::assistant(self.response, self.sources)
    }
}
