use std::str::FromStr;

use super::Config;

/// Read `key` and parse it, warning when the value is present but unusable.
fn parsed<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    if let Ok(value) = raw.trim().parse() {
        Some(value)
    } else {
        tracing::warn!("ignoring invalid {key} value: {raw}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_providers();
        self.apply_env_overrides_rag();
        self.apply_env_overrides_gateway();
    }

    fn apply_env_overrides_providers(&mut self) {
        if let Ok(v) = std::env::var("SEPTIMA_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("SEPTIMA_LLM_CHAT_MODEL") {
            self.llm.chat_model = v;
        }
        if let Ok(v) = std::env::var("SEPTIMA_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Some(n) = parsed("SEPTIMA_LLM_MAX_RETRIES") {
            self.llm.max_retries = n;
        }
        if let Ok(v) = std::env::var("SEPTIMA_INDEX_ENDPOINT") {
            self.index.endpoint = v;
        }
        if let Ok(v) = std::env::var("SEPTIMA_INDEX_NAMESPACE") {
            self.index.namespace = Some(v).filter(|ns| !ns.is_empty());
        }
        if let Some(secs) = parsed("SEPTIMA_TIMEOUT_LLM") {
            self.timeouts.llm_seconds = secs;
        }
        if let Some(secs) = parsed("SEPTIMA_TIMEOUT_EMBEDDING") {
            self.timeouts.embedding_seconds = secs;
        }
        if let Some(secs) = parsed("SEPTIMA_TIMEOUT_INDEX") {
            self.timeouts.index_seconds = secs;
        }
    }

    fn apply_env_overrides_rag(&mut self) {
        if let Some(n) = parsed("SEPTIMA_RAG_ROUTER_WINDOW") {
            self.rag.router_window = n;
        }
        if let Some(n) = parsed("SEPTIMA_RAG_HISTORY_WINDOW") {
            self.rag.history_window = n;
        }
        if let Some(n) = parsed("SEPTIMA_RAG_TOP_K") {
            self.rag.top_k = n;
        }
        if let Some(n) = parsed("SEPTIMA_RAG_GROUP_LIMIT") {
            self.rag.group_limit = n;
        }
        if let Some(t) = parsed("SEPTIMA_RAG_ANSWER_TEMPERATURE") {
            self.rag.answer_temperature = t;
        }
        if let Some(n) = parsed("SEPTIMA_SEARCH_TOP_K_PARAGRAPHS") {
            self.search.top_k_paragraphs = n;
        }
        if let Some(n) = parsed("SEPTIMA_SEARCH_TOP_K_SERMONS") {
            self.search.top_k_sermons = n;
        }
    }

    fn apply_env_overrides_gateway(&mut self) {
        if let Ok(v) = std::env::var("SEPTIMA_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Some(port) = parsed("SEPTIMA_GATEWAY_PORT") {
            self.gateway.port = port;
        }
        if let Some(limit) = parsed("SEPTIMA_GATEWAY_RATE_LIMIT") {
            self.gateway.rate_limit = limit;
        }
        if let Some(size) = parsed("SEPTIMA_GATEWAY_MAX_BODY_SIZE") {
            self.gateway.max_body_size = size;
        }
    }
}
