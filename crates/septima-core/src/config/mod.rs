mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

use crate::vault::{OPENAI_API_KEY, PINECONE_API_KEY, Secret, VaultProvider};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending field.
    pub fn validate(&self) -> anyhow::Result<()> {
        let rag = &self.rag;
        if rag.router_window == 0 || rag.history_window == 0 {
            bail!("rag.router_window and rag.history_window must be at least 1");
        }
        if rag.top_k == 0 || rag.group_limit == 0 {
            bail!("rag.top_k and rag.group_limit must be at least 1");
        }
        if rag.passages_per_group == 0 {
            bail!("rag.passages_per_group must be at least 1");
        }
        if !(0.0..=2.0).contains(&rag.answer_temperature) {
            bail!(
                "rag.answer_temperature must be within 0.0..=2.0, got {}",
                rag.answer_temperature
            );
        }
        if rag.router_max_tokens == 0 || rag.rewrite_max_tokens == 0 || rag.answer_max_tokens == 0 {
            bail!("rag token limits must be at least 1");
        }
        if self.search.max_top_k_paragraphs == 0 || self.search.max_top_k_sermons == 0 {
            bail!("search maxima must be at least 1");
        }
        if self.index.endpoint.trim().is_empty() {
            bail!("index.endpoint is not set (config file or SEPTIMA_INDEX_ENDPOINT)");
        }
        if self.llm.base_url.trim().is_empty() {
            bail!("llm.base_url must not be empty");
        }
        Ok(())
    }

    /// Resolve API keys through the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        if let Some(val) = vault.get_secret(OPENAI_API_KEY).await? {
            self.secrets.openai_api_key = Some(Secret::new(val));
        }
        if let Some(val) = vault.get_secret(PINECONE_API_KEY).await? {
            self.secrets.pinecone_api_key = Some(Secret::new(val));
        }
        Ok(())
    }
}
