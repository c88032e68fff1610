//! Startup wiring: config path resolution, loading, and pipeline construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use septima_index::PineconeIndex;
use septima_llm::openai::OpenAiProvider;
use septima_rag::RagPipeline;

use crate::config::Config;
use crate::vault::{EnvVaultProvider, OPENAI_API_KEY, PINECONE_API_KEY};

/// The production pipeline: OpenAI for chat and embeddings, Pinecone for retrieval.
pub type SermonPipeline = RagPipeline<OpenAiProvider, OpenAiProvider, PineconeIndex>;

/// Priority: CLI `--config` > `SEPTIMA_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("SEPTIMA_CONFIG")
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

/// Load, validate, and resolve secrets from the environment.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or the result is invalid.
pub async fn load_config(path: &Path) -> anyhow::Result<Config> {
    let mut config = Config::load(path)?;
    config.validate()?;
    config.resolve_secrets(&EnvVaultProvider).await?;
    Ok(config)
}

fn openai_provider(config: &Config, api_key: &str, timeout_secs: u64) -> anyhow::Result<OpenAiProvider> {
    let client = septima_llm::http::build_client(Duration::from_secs(timeout_secs))
        .context("failed to build LLM HTTP client")?;
    Ok(OpenAiProvider::new(
        client,
        api_key.to_owned(),
        config.llm.base_url.clone(),
        config.llm.chat_model.clone(),
        config.llm.embedding_model.clone(),
    )
    .with_max_retries(config.llm.max_retries))
}

/// Construct the production pipeline from a loaded config.
///
/// Completion and embedding calls get separate clients so each honors its own timeout.
///
/// # Errors
///
/// Returns an error if an API key is missing or an HTTP client cannot be built.
pub fn build_pipeline(config: &Config) -> anyhow::Result<SermonPipeline> {
    let openai_key = config
        .secrets
        .openai_api_key
        .as_ref()
        .with_context(|| format!("{OPENAI_API_KEY} is not set"))?;
    let pinecone_key = config
        .secrets
        .pinecone_api_key
        .as_ref()
        .with_context(|| format!("{PINECONE_API_KEY} is not set"))?;

    let completion = openai_provider(config, openai_key.expose(), config.timeouts.llm_seconds)?;
    let embedder = openai_provider(config, openai_key.expose(), config.timeouts.embedding_seconds)?;

    let index_client = septima_llm::http::build_client(Duration::from_secs(
        config.timeouts.index_seconds,
    ))
    .context("failed to build index HTTP client")?;
    let index = PineconeIndex::new(
        index_client,
        pinecone_key.expose().to_owned(),
        config.index.endpoint.clone(),
    )
    .with_namespace(config.index.namespace.clone())
    .with_metadata_keys(config.index.metadata.clone());

    tracing::info!(
        chat_model = %config.llm.chat_model,
        embedding_model = %config.llm.embedding_model,
        endpoint = %config.index.endpoint,
        "pipeline ready"
    );

    Ok(RagPipeline::new(
        Arc::new(completion),
        Arc::new(embedder),
        Arc::new(index),
        config.rag.clone(),
    )
    .with_metadata_keys(config.index.metadata.clone())
    .with_search_config(config.search.clone()))
}
