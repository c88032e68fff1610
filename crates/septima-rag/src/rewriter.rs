use std::sync::Arc;

use septima_llm::{CompletionOptions, CompletionProvider, Message};

use crate::context::transcript;
use crate::types::ChatMessage;

const REWRITE_PROMPT: &str = "\
You turn follow-up questions into standalone search queries. Given the conversation \
and a follow-up question, write one self-contained question that keeps the intent of \
the follow-up and replaces pronouns and omissions with what they refer to in the \
conversation. The result is used to search a sermon library, so keep it short and \
specific. Reply with the question only.";

/// Makes follow-up questions self-contained for embedding search.
pub struct QueryRewriter<C> {
    provider: Arc<C>,
    max_tokens: u32,
}

impl<C: CompletionProvider> QueryRewriter<C> {
    #[must_use]
    pub fn new(provider: Arc<C>, max_tokens: u32) -> Self {
        Self {
            provider,
            max_tokens,
        }
    }

    /// Best-effort: returns `query` unchanged when history is empty or the
    /// model call fails.
    pub async fn rewrite(&self, query: &str, history: &[ChatMessage]) -> String {
        if history.is_empty() {
            return query.to_owned();
        }

        let messages = vec![
            Message::system(REWRITE_PROMPT),
            Message::user(format!(
                "Conversation:\n{}\n\nFollow-up question: {query}",
                transcript(history, "User", "AI")
            )),
        ];

        match self
            .provider
            .complete(&messages, CompletionOptions::deterministic(self.max_tokens))
            .await
        {
            Ok(text) => {
                let standalone = text.trim();
                if standalone.is_empty() {
                    tracing::warn!("rewriter returned empty text, using original query");
                    query.to_owned()
                } else {
                    tracing::debug!(standalone = %standalone, "query rewritten");
                    standalone.to_owned()
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "query rewrite failed, using original query");
                query.to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use septima_llm::mock::MockProvider;

    use super::*;

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("Tell me about the prodigal son."),
            ChatMessage::assistant("The father runs to meet him.", vec![]),
        ]
    }

    #[tokio::test]
    async fn empty_history_is_identity() {
        let mock = Arc::new(MockProvider::default());
        let rewriter = QueryRewriter::new(Arc::clone(&mock), 150);
        let query = "  What about  him?  ";
        assert_eq!(rewriter.rewrite(query, &[]).await, query);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn rewrites_with_full_transcript() {
        let mock = Arc::new(MockProvider::with_responses(vec![
            "  Why did the father in the parable of the prodigal son run?\n".into(),
        ]));
        let rewriter = QueryRewriter::new(Arc::clone(&mock), 150);
        let out = rewriter.rewrite("Why did he run?", &conversation()).await;
        assert_eq!(out, "Why did the father in the parable of the prodigal son run?");

        let call = &mock.calls()[0];
        assert_eq!(call.options.max_tokens, Some(150));
        assert!(call.options.temperature.abs() < f32::EPSILON);
        let prompt = &call.messages[1].content;
        assert!(prompt.contains("User: Tell me about the prodigal son."));
        assert!(prompt.contains("AI: The father runs to meet him."));
        assert!(prompt.contains("Follow-up question: Why did he run?"));
    }

    #[tokio::test]
    async fn error_returns_original() {
        let mock = Arc::new(MockProvider::failing());
        let rewriter = QueryRewriter::new(mock, 150);
        assert_eq!(rewriter.rewrite("Why?", &conversation()).await, "Why?");
    }

    #[tokio::test]
    async fn blank_output_returns_original() {
        let mock = Arc::new(MockProvider::with_responses(vec!["   ".into()]));
        let rewriter = QueryRewriter::new(mock, 150);
        assert_eq!(rewriter.rewrite("Why?", &conversation()).await, "Why?");
    }
}
