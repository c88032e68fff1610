use std::sync::Arc;

use septima_llm::{CompletionOptions, CompletionProvider, Message};

use crate::context::transcript;
use crate::types::{ChatMessage, ChatRole, RouteDecision};

const ROUTER_PROMPT: &str = "\
You are the routing classifier of a sermon study assistant. Read the recent conversation \
and the user's new question, then reply with exactly one of these labels and nothing else:\n\
\n\
search_new_sermons\n\
answer_from_history\n\
\n\
Route to retrieval (search_new_sermons) if the query introduces a new topic or asks for \
information likely absent from the current context.\n\
Route to history (answer_from_history) if the query is a direct continuation/elaboration \
of the immediately preceding topic (e.g., \"explain more\", \"give a practical example\", \"why?\").";

/// Decides whether a question needs fresh retrieval or can be answered from
/// the conversation so far.
pub struct QueryRouter<C> {
    provider: Arc<C>,
    window: usize,
    max_tokens: u32,
}

impl<C: CompletionProvider> QueryRouter<C> {
    #[must_use]
    pub fn new(provider: Arc<C>, window: usize, max_tokens: u32) -> Self {
        Self {
            provider,
            window,
            max_tokens,
        }
    }

    /// Never fails: any provider error or unexpected label falls back to
    /// [`RouteDecision::NeedsRetrieval`].
    pub async fn route(&self, query: &str, history: &[ChatMessage]) -> RouteDecision {
        if !history.iter().any(|m| m.role == ChatRole::User) {
            return RouteDecision::NeedsRetrieval;
        }

        let messages = self.build_prompt(query, history);
        let options = CompletionOptions::deterministic(self.max_tokens);

        match self.provider.complete(&messages, options).await {
            Ok(label) => {
                if let Some(decision) = RouteDecision::from_label(&label) {
                    tracing::debug!(?decision, "query routed");
                    decision
                } else {
                    tracing::warn!(
                        label = label.trim(),
                        "router returned an unknown label, falling back to retrieval"
                    );
                    RouteDecision::NeedsRetrieval
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "router call failed, falling back to retrieval");
                RouteDecision::NeedsRetrieval
            }
        }
    }

    fn build_prompt(&self, query: &str, history: &[ChatMessage]) -> Vec<Message> {
        let start = history.len().saturating_sub(self.window);
        let recent = transcript(&history[start..], "User", "Assistant");
        vec![
            Message::system(ROUTER_PROMPT),
            Message::user(format!(
                "Recent conversation:\n{recent}\n\nNew question: {query}"
            )),
        ]
    }
}

#[cfg(test)]
mod tests {
    use septima_llm::mock::MockProvider;

    use super::*;
    use crate::types::SourceRef;

    fn router(mock: &Arc<MockProvider>) -> QueryRouter<MockProvider> {
        QueryRouter::new(Arc::clone(mock), 4, 10)
    }

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("What is grace?"),
            ChatMessage::assistant("Grace is unmerited favour.", vec![SourceRef::new("s1", "Grace")]),
        ]
    }

    #[tokio::test]
    async fn empty_history_skips_model() {
        let mock = Arc::new(MockProvider::default());
        let decision = router(&mock).route("Who was Spurgeon?", &[]).await;
        assert_eq!(decision, RouteDecision::NeedsRetrieval);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn assistant_only_history_skips_model() {
        let mock = Arc::new(MockProvider::default());
        let history = vec![ChatMessage::assistant("Welcome!", vec![])];
        assert_eq!(
            router(&mock).route("hello", &history).await,
            RouteDecision::NeedsRetrieval
        );
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn history_label_routes_to_history() {
        let mock = Arc::new(MockProvider::with_responses(vec!["answer_from_history".into()]));
        let decision = router(&mock).route("explain more", &conversation()).await;
        assert_eq!(decision, RouteDecision::HistoryOnly);

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].options.temperature.abs() < f32::EPSILON);
        assert_eq!(calls[0].options.max_tokens, Some(10));
        assert!(calls[0].messages[0].content.contains("search_new_sermons"));
        assert!(calls[0].messages[1].content.contains("User: What is grace?"));
        assert!(calls[0].messages[1].content.ends_with("New question: explain more"));
    }

    #[tokio::test]
    async fn unknown_label_falls_back() {
        let mock = Arc::new(MockProvider::with_responses(vec!["maybe?".into()]));
        let decision = router(&mock).route("and then?", &conversation()).await;
        assert_eq!(decision, RouteDecision::NeedsRetrieval);
    }

    #[tokio::test]
    async fn provider_error_falls_back() {
        let mock = Arc::new(MockProvider::failing());
        let decision = router(&mock).route("why?", &conversation()).await;
        assert_eq!(decision, RouteDecision::NeedsRetrieval);
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn prompt_keeps_only_window() {
        let mock = Arc::new(MockProvider::with_responses(vec!["search_new_sermons".into()]));
        let history: Vec<ChatMessage> = (0..6)
            .map(|i| ChatMessage::user(format!("question {i}")))
            .collect();
        router(&mock).route("next", &history).await;
        let prompt = &mock.calls()[0].messages[1].content;
        assert!(!prompt.contains("question 1"));
        assert!(prompt.contains("question 2"));
        assert!(prompt.contains("question 5"));
    }
}
