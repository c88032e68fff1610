use std::future::Future;

use septima_index::PassageIndex;
use septima_llm::{CompletionProvider, EmbeddingProvider};
use septima_rag::{Answer, ChatMessage, GroupedResult, RagError, RagPipeline};

/// What the gateway needs from the chat core.
pub trait ChatBackend: Send + Sync + 'static {
    fn answer(
        &self,
        query: &str,
        history: &[ChatMessage],
    ) -> impl Future<Output = Result<Answer, RagError>> + Send;

    fn search(
        &self,
        query: &str,
        top_k_paragraphs: Option<usize>,
        top_k_sermons: Option<usize>,
    ) -> impl Future<Output = Result<Vec<GroupedResult>, RagError>> + Send;
}

impl<C, E, V> ChatBackend for RagPipeline<C, E, V>
where
    C: CompletionProvider + 'static,
    E: EmbeddingProvider + 'static,
    V: PassageIndex + 'static,
{
    fn answer(
        &self,
        query: &str,
        history: &[ChatMessage],
    ) -> impl Future<Output = Result<Answer, RagError>> + Send {
        RagPipeline::answer(self, query, history)
    }

    fn search(
        &self,
        query: &str,
        top_k_paragraphs: Option<usize>,
        top_k_sermons: Option<usize>,
    ) -> impl Future<Output = Result<Vec<GroupedResult>, RagError>> + Send {
        RagPipeline::search(self, query, top_k_paragraphs, top_k_sermons)
    }
}
