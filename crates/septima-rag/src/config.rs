use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_PERSONA: &str = "You are Septima, a theological study assistant who knows the sermons in this \
library well. Your tone is wise and pastoral, and you stay faithful to what the preacher taught.";

fn default_router_window() -> usize {
    4
}

fn default_history_window() -> usize {
    6
}

fn default_top_k() -> usize {
    30
}

fn default_group_limit() -> usize {
    5
}

fn default_passages_per_group() -> usize {
    3
}

fn default_answer_temperature() -> f32 {
    0.4
}

fn default_router_max_tokens() -> u32 {
    10
}

fn default_rewrite_max_tokens() -> u32 {
    150
}

fn default_answer_max_tokens() -> u32 {
    1500
}

fn default_persona() -> String {
    DEFAULT_PERSONA.to_owned()
}

/// Tuning for [`RagPipeline::answer`](crate::RagPipeline::answer).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RagConfig {
    /// Messages of history shown to the router.
    #[serde(default = "default_router_window")]
    pub router_window: usize,
    /// Messages of history shown to the answer model on a history-only turn.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Passages requested from the index per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Parent documents kept after grouping.
    #[serde(default = "default_group_limit")]
    pub group_limit: usize,
    #[serde(default = "default_passages_per_group")]
    pub passages_per_group: usize,
    #[serde(default = "default_answer_temperature")]
    pub answer_temperature: f32,
    #[serde(default = "default_router_max_tokens")]
    pub router_max_tokens: u32,
    #[serde(default = "default_rewrite_max_tokens")]
    pub rewrite_max_tokens: u32,
    #[serde(default = "default_answer_max_tokens")]
    pub answer_max_tokens: u32,
    #[serde(default = "default_persona")]
    pub persona: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            router_window: default_router_window(),
            history_window: default_history_window(),
            top_k: default_top_k(),
            group_limit: default_group_limit(),
            passages_per_group: default_passages_per_group(),
            answer_temperature: default_answer_temperature(),
            router_max_tokens: default_router_max_tokens(),
            rewrite_max_tokens: default_rewrite_max_tokens(),
            answer_max_tokens: default_answer_max_tokens(),
            persona: default_persona(),
        }
    }
}

fn default_top_k_paragraphs() -> usize {
    20
}

fn default_top_k_sermons() -> usize {
    5
}

fn default_max_top_k_paragraphs() -> usize {
    100
}

fn default_max_top_k_sermons() -> usize {
    20
}

/// Defaults and ceilings for [`RagPipeline::search`](crate::RagPipeline::search).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_top_k_paragraphs")]
    pub top_k_paragraphs: usize,
    #[serde(default = "default_top_k_sermons")]
    pub top_k_sermons: usize,
    #[serde(default = "default_max_top_k_paragraphs")]
    pub max_top_k_paragraphs: usize,
    #[serde(default = "default_max_top_k_sermons")]
    pub max_top_k_sermons: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k_paragraphs: default_top_k_paragraphs(),
            top_k_sermons: default_top_k_sermons(),
            max_top_k_paragraphs: default_max_top_k_paragraphs(),
            max_top_k_sermons: default_max_top_k_sermons(),
        }
    }
}

impl SearchConfig {
    /// Resolve requested limits against the defaults, clamped to `1..=max`.
    #[must_use]
    pub fn resolve(&self, paragraphs: Option<usize>, sermons: Option<usize>) -> (usize, usize) {
        let paragraphs = paragraphs
            .unwrap_or(self.top_k_paragraphs)
            .clamp(1, self.max_top_k_paragraphs.max(1));
        let sermons = sermons
            .unwrap_or(self.top_k_sermons)
            .clamp(1, self.max_top_k_sermons.max(1));
        (paragraphs, sermons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rag_defaults() {
        let cfg = RagConfig::default();
        assert_eq!(cfg.router_window, 4);
        assert_eq!(cfg.history_window, 6);
        assert_eq!(cfg.top_k, 30);
        assert_eq!(cfg.passages_per_group, 3);
        assert_eq!(cfg.router_max_tokens, 10);
        assert!((cfg.answer_temperature - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_deserialize_fills_defaults() {
        let cfg: RagConfig = serde_json::from_str(r#"{"top_k": 12}"#).unwrap();
        assert_eq!(cfg.top_k, 12);
        assert_eq!(cfg.group_limit, 5);
        assert_eq!(cfg.persona, DEFAULT_PERSONA);
    }

    #[test]
    fn search_resolve_clamps() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.resolve(None, None), (20, 5));
        assert_eq!(cfg.resolve(Some(500), Some(0)), (100, 1));
        assert_eq!(cfg.resolve(Some(7), Some(3)), (7, 3));
    }
}
