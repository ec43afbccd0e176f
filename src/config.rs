use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the state snapshot (rate counters + embedding cache) is stored
    pub data_dir: PathBuf,
    /// News search backend configuration
    pub sources: SourcesConfig,
    /// Embedding service configuration
    pub embedding: EmbeddingConfig,
    /// Zero-shot stance model configuration
    pub stance: StanceConfig,
    /// Maximum concurrently scored documents
    pub scoring_concurrency: usize,
    /// Over-sampling factor applied to `limit` when fetching candidates
    pub fetch_multiplier: usize,
}

/// Configuration for the news search backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// newsapi.org API key; backend disabled when absent
    pub news_api_key: Option<String>,
    /// gnews.io API key; backend disabled when absent
    pub gnews_api_key: Option<String>,
    /// content.guardianapis.com API key; backend disabled when absent
    pub guardian_api_key: Option<String>,
    /// Requests allowed per backend for the process run; exceeded backends are
    /// skipped until an external reset
    pub request_limit: u32,
    /// Per-search timeout in seconds
    pub search_timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            news_api_key: None,
            gnews_api_key: None,
            guardian_api_key: None,
            request_limit: 100,
            search_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name for embeddings
    pub model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub dim: usize,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Cache entry time-to-live in seconds
    pub cache_ttl_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            api_key: None,
            dim: 384,
            timeout_secs: 20,
            cache_ttl_secs: 86_400,
        }
    }
}

/// Configuration for the zero-shot stance classifier sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StanceConfig {
    /// Base URL for the classification API (e.g. "http://127.0.0.1:8083").
    /// If None, the model layer is skipped and rule-based detection leads.
    pub base_url: Option<String>,
    /// Model name to send in the classify request.
    pub model: Option<String>,
    /// Request timeout in seconds (capped at 30).
    pub timeout_secs: u64,
}

impl Default for StanceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: None,
            timeout_secs: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            sources: SourcesConfig::default(),
            embedding: EmbeddingConfig::default(),
            stance: StanceConfig::default(),
            scoring_concurrency: 8,
            fetch_multiplier: 3,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("NEWS_LENS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(key) = std::env::var("NEWS_API_KEY") {
            config.sources.news_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GNEWS_API_KEY") {
            config.sources.gnews_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GUARDIAN_API_KEY") {
            config.sources.guardian_api_key = Some(key);
        }
        if let Ok(val) = std::env::var("SOURCE_REQUEST_LIMIT") {
            if let Ok(v) = val.parse() {
                config.sources.request_limit = v;
            }
        }
        if let Ok(val) = std::env::var("SOURCE_SEARCH_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.sources.search_timeout_secs = v;
            }
        }
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }
        if let Ok(url) = std::env::var("EMBEDDING_BASE_URL") {
            config.embedding.base_url = url;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            config.embedding.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.embedding.dim = d;
            }
        }
        if let Ok(val) = std::env::var("EMBEDDING_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.embedding.timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("EMBEDDING_CACHE_TTL_SECS") {
            if let Ok(v) = val.parse() {
                config.embedding.cache_ttl_secs = v;
            }
        }
        if let Ok(url) = std::env::var("STANCE_BASE_URL") {
            config.stance.base_url = Some(url);
        }
        if let Ok(model) = std::env::var("STANCE_MODEL") {
            config.stance.model = Some(model);
        }
        if let Ok(val) = std::env::var("STANCE_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.stance.timeout_secs = v.min(30); // Cap at 30s
            }
        }
        if let Ok(val) = std::env::var("NEWS_LENS_SCORING_CONCURRENCY") {
            if let Ok(v) = val.parse::<usize>() {
                config.scoring_concurrency = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("NEWS_LENS_FETCH_MULTIPLIER") {
            if let Ok(v) = val.parse::<usize>() {
                config.fetch_multiplier = v.max(1);
            }
        }

        config
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}
