use std::fmt::Write as _;

use septima_llm::Message;

use crate::types::{ChatMessage, ChatRole, GroupedResult};

const RETRIEVAL_RULES: &str = "\
Answer the user's question using only the CONTEXT below, a collection of paragraphs \
taken from sermons.\n\
If the context does not clearly answer the question, say politely: \
\"I found no direct answer in the material I reviewed.\" Never invent information.\n\
Bring together what the relevant paragraphs say into one coherent answer written \
in several paragraphs.\n\
Where you can, name the sermon that informed each part of your answer.";

const HISTORY_RULES: &str = "\
Continue the conversation below by answering the user's new question. Build on what \
has already been discussed and keep the same voice.";

/// Render messages as `Label: content` lines.
pub(crate) fn transcript(messages: &[ChatMessage], user: &str, assistant: &str) -> String {
    let mut out = String::new();
    for (i, msg) in messages.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let label = match msg.role {
            ChatRole::User => user,
            ChatRole::Assistant => assistant,
        };
        let _ = write!(out, "{label}: {}", msg.content);
    }
    out
}

/// Assembles the messages sent to the answer model.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    persona: String,
    history_window: usize,
}

impl ContextBuilder {
    #[must_use]
    pub fn new(persona: impl Into<String>, history_window: usize) -> Self {
        Self {
            persona: persona.into(),
            history_window,
        }
    }

    /// System message with persona, rules and every passage of `groups`, then
    /// the user's question as asked.
    #[must_use]
    pub fn build_retrieval_prompt(&self, user_query: &str, groups: &[GroupedResult]) -> Vec<Message> {
        let mut context = String::new();
        for group in groups {
            for passage in &group.passages {
                if !context.is_empty() {
                    context.push_str("\n\n---\n\n");
                }
                let _ = write!(context, "Paragraph from the sermon \"{}\"", group.title);
                if let Some(reference) = &group.main_reference {
                    let _ = write!(context, " ({reference})");
                }
                let _ = write!(context, ":\n{}", passage.text_preview);
            }
        }

        let system = format!(
            "{}\n\n{RETRIEVAL_RULES}\n\n--- CONTEXT ---\n{context}\n--- END OF CONTEXT ---",
            self.persona
        );
        vec![Message::system(system), Message::user(user_query)]
    }

    /// System message framing the last `history_window` messages as prior
    /// conversation, then the new question.
    #[must_use]
    pub fn build_history_prompt(&self, user_query: &str, history: &[ChatMessage]) -> Vec<Message> {
        let start = history.len().saturating_sub(self.history_window);
        let prior = transcript(&history[start..], "User", "Assistant");
        let system = format!(
            "{}\n\n{HISTORY_RULES}\n\n--- PRIOR CONVERSATION ---\n{prior}\n--- END OF PRIOR CONVERSATION ---",
            self.persona
        );
        vec![Message::system(system), Message::user(user_query)]
    }
}
