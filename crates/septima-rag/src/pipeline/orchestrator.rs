use std::sync::Arc;

use septima_index::{MetadataKeys, PassageIndex};
use septima_llm::{CompletionOptions, CompletionProvider, EmbeddingProvider};

use super::{Stage, StageFailure, at};
use crate::config::{RagConfig, SearchConfig};
use crate::context::ContextBuilder;
use crate::error::RagError;
use crate::grouper::PassageGrouper;
use crate::rewriter::QueryRewriter;
use crate::router::QueryRouter;
use crate::sources::{sources_for_retrieval, sources_from_history};
use crate::types::{Answer, ChatMessage, GroupedResult, RouteDecision};

/// Sermon chat over three injected ports: completion, embedding and the
/// passage index. Holds no per-call state and can be shared across tasks.
pub struct RagPipeline<C, E, V> {
    completion: Arc<C>,
    embedder: Arc<E>,
    index: Arc<V>,
    router: QueryRouter<C>,
    rewriter: QueryRewriter<C>,
    grouper: PassageGrouper,
    context: ContextBuilder,
    config: RagConfig,
    search: SearchConfig,
}

impl<C, E, V> std::fmt::Debug for RagPipeline<C, E, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("grouper", &self.grouper)
            .field("config", &self.config)
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl<C, E, V> RagPipeline<C, E, V>
where
    C: CompletionProvider,
    E: EmbeddingProvider,
    V: PassageIndex,
{
    #[must_use]
    pub fn new(completion: Arc<C>, embedder: Arc<E>, index: Arc<V>, config: RagConfig) -> Self {
        Self {
            router: QueryRouter::new(
                Arc::clone(&completion),
                config.router_window,
                config.router_max_tokens,
            ),
            rewriter: QueryRewriter::new(Arc::clone(&completion), config.rewrite_max_tokens),
            grouper: PassageGrouper::new(MetadataKeys::default(), config.passages_per_group),
            context: ContextBuilder::new(config.persona.clone(), config.history_window),
            completion,
            embedder,
            index,
            config,
            search: SearchConfig::default(),
        }
    }

    #[must_use]
    pub fn with_metadata_keys(mut self, keys: MetadataKeys) -> Self {
        self.grouper = PassageGrouper::new(keys, self.config.passages_per_group);
        self
    }

    #[must_use]
    pub fn with_search_config(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Answer `query` in the context of `history`.
    ///
    /// An empty index result is not an error: it yields a fixed apology with no
    /// sources and no generation call.
    ///
    /// # Errors
    ///
    /// [`RagError::InvalidInput`] for a blank query. Any provider failure on a
    /// mandatory step is logged and returned as [`RagError::Internal`].
    pub async fn answer(&self, query: &str, history: &[ChatMessage]) -> Result<Answer, RagError> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidInput("query must not be empty".into()));
        }

        match self.run(query, history).await {
            Ok(answer) => {
                tracing::debug!(stage = %Stage::Done, sources = answer.sources.len(), "answer ready");
                Ok(answer)
            }
            Err(failure) => {
                tracing::error!(
                    stage = %failure.stage,
                    error = ?failure,
                    "failed to answer question"
                );
                Err(RagError::Internal)
            }
        }
    }

    async fn run(&self, query: &str, history: &[ChatMessage]) -> Result<Answer, StageFailure> {
        tracing::debug!(stage = %Stage::Routing, history = history.len());
        let decision = self.router.route(query, history).await;

        let (messages, sources) = match decision {
            RouteDecision::NeedsRetrieval => {
                tracing::debug!(stage = %Stage::Rewriting);
                let standalone = self.rewriter.rewrite(query, history).await;

                tracing::debug!(stage = %Stage::Embedding);
                let vector = self
                    .embedder
                    .embed(&standalone)
                    .await
                    .map_err(at(Stage::Embedding))?;

                tracing::debug!(stage = %Stage::Retrieving, top_k = self.config.top_k);
                let matches = self
                    .index
                    .query(vector, self.config.top_k, None)
                    .await
                    .map_err(at(Stage::Retrieving))?;
                if matches.is_empty() {
                    tracing::info!("no passages matched, returning apology");
                    return Ok(Answer::no_results());
                }

                tracing::debug!(stage = %Stage::Grouping, matches = matches.len());
                let groups = self.grouper.group(matches, self.config.group_limit);

                tracing::debug!(stage = %Stage::Prompting, groups = groups.len());
                let sources = sources_for_retrieval(&groups);
                (self.context.build_retrieval_prompt(query, &groups), sources)
            }
            RouteDecision::HistoryOnly => {
                tracing::debug!(stage = %Stage::Prompting, mode = "history");
                (
                    self.context.build_history_prompt(query, history),
                    sources_from_history(history),
                )
            }
        };

        tracing::debug!(stage = %Stage::Generating, messages = messages.len());
        let options = CompletionOptions {
            temperature: self.config.answer_temperature,
            max_tokens: Some(self.config.answer_max_tokens),
        };
        let text = self
            .completion
            .complete(&messages, options)
            .await
            .map_err(at(Stage::Generating))?;

        Ok(Answer {
            response: text.trim().to_owned(),
            sources,
        })
    }

    /// Semantic sermon search: embed the raw query, fetch passages and group
    /// them. `None` limits fall back to the configured defaults; all limits are
    /// clamped to the configured maxima.
    ///
    /// # Errors
    ///
    /// [`RagError::InvalidInput`] for a blank query or a rejected request,
    /// [`RagError::UpstreamUnavailable`] when a provider cannot be reached.
    pub async fn search(
        &self,
        query: &str,
        top_k_paragraphs: Option<usize>,
        top_k_sermons: Option<usize>,
    ) -> Result<Vec<GroupedResult>, RagError> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidInput("query must not be empty".into()));
        }
        let (paragraphs, sermons) = self.search.resolve(top_k_paragraphs, top_k_sermons);

        let vector = self.embedder.embed(query).await.map_err(|e| {
            tracing::error!(error = %e, "sermon search embedding failed");
            RagError::from_llm(&e)
        })?;
        let matches = self
            .index
            .query(vector, paragraphs, None)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "sermon search index query failed");
                RagError::from_index(&e)
            })?;

        if matches.is_empty() {
            tracing::info!("sermon search found no passages");
            return Ok(Vec::new());
        }
        let groups = self.grouper.group(matches, sermons);
        tracing::info!(sermons = groups.len(), paragraphs, "sermon search complete");
        Ok(groups)
    }
}
