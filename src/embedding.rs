//! Embedding client: remote embedding service with a TTL cache and a
//! deterministic fallback vector for outages.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;

/// Maximum characters to send per text to the embedding API.
/// News bodies routinely exceed small-model context windows; 2 000 chars of
/// lead text carries the topical signal that similarity scoring needs.
const MAX_EMBED_CHARS: usize = 2_000;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Stable 64-bit cache key for a text.
pub fn text_key(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

// ─── Cache ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    vector: Vec<f32>,
    inserted_at: DateTime<Utc>,
}

/// Serialized form of one cache entry, used by the state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshotEntry {
    pub key: u64,
    pub vector: Vec<f32>,
    pub inserted_at: DateTime<Utc>,
}

/// In-memory embedding cache keyed by text hash, with TTL eviction.
pub struct EmbeddingCache {
    entries: RwLock<HashMap<u64, CacheEntry>>,
    ttl: Duration,
}

impl EmbeddingCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Return the cached vector for `key` if present and not expired.
    /// Expired entries are dropped on access.
    pub fn get(&self, key: u64) -> Option<Vec<f32>> {
        let expired = {
            let entries = self.entries.read();
            match entries.get(&key) {
                Some(entry) if Utc::now() - entry.inserted_at < self.ttl => {
                    return Some(entry.vector.clone());
                }
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.entries.write().remove(&key);
        }
        None
    }

    /// Store a vector unless another writer got there first.
    pub fn insert_if_absent(&self, key: u64, vector: Vec<f32>) {
        self.entries.write().entry(key).or_insert_with(|| CacheEntry {
            vector,
            inserted_at: Utc::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Export all live entries for the state snapshot.
    pub fn export(&self) -> Vec<CacheSnapshotEntry> {
        let entries = self.entries.read();
        entries
            .iter()
            .map(|(key, entry)| CacheSnapshotEntry {
                key: *key,
                vector: entry.vector.clone(),
                inserted_at: entry.inserted_at,
            })
            .collect()
    }

    /// Restore entries from a snapshot, skipping ones past their TTL.
    pub fn restore(&self, snapshot: Vec<CacheSnapshotEntry>) {
        let now = Utc::now();
        let mut entries = self.entries.write();
        for item in snapshot {
            if now - item.inserted_at < self.ttl {
                entries.insert(
                    item.key,
                    CacheEntry {
                        vector: item.vector,
                        inserted_at: item.inserted_at,
                    },
                );
            }
        }
    }

    #[cfg(test)]
    fn insert_at(&self, key: u64, vector: Vec<f32>, inserted_at: DateTime<Utc>) {
        self.entries.write().insert(
            key,
            CacheEntry {
                vector,
                inserted_at,
            },
        );
    }
}

// ─── Client ──────────────────────────────────────────────

/// Result of one embed call.
pub struct EmbeddingOutcome {
    pub vector: Vec<f32>,
    /// True when the remote service failed and a fallback vector was used.
    pub degraded: bool,
}

/// Client for the external embedding service with cache and degraded mode.
pub struct EmbeddingClient {
    client: reqwest::Client,
    config: EmbeddingConfig,
    cache: Arc<EmbeddingCache>,
}

impl EmbeddingClient {
    pub fn new(client: reqwest::Client, config: EmbeddingConfig, cache: Arc<EmbeddingCache>) -> Self {
        Self {
            client,
            config,
            cache,
        }
    }

    /// Embed a text. Cache hit returns the stored vector; a miss calls the
    /// remote service and stores on success; remote failure yields a
    /// deterministic fallback vector flagged as degraded.
    pub async fn embed(&self, text: &str) -> EmbeddingOutcome {
        let truncated = truncate_for_embedding(text);
        let key = text_key(truncated);

        if let Some(vector) = self.cache.get(key) {
            return EmbeddingOutcome {
                vector,
                degraded: false,
            };
        }

        match embed_remote(&self.client, &self.config, truncated).await {
            Ok(vector) => {
                self.cache.insert_if_absent(key, vector.clone());
                EmbeddingOutcome {
                    vector,
                    degraded: false,
                }
            }
            Err(e) => {
                tracing::warn!("Embedding service failed, using fallback vector: {e:#}");
                EmbeddingOutcome {
                    vector: fallback_vector(truncated, self.config.dim),
                    degraded: true,
                }
            }
        }
    }
}

/// Deterministic pseudo-random unit vector derived from the text alone, so
/// similarity math stays defined when the embedding service is down.
pub fn fallback_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut vector = Vec::with_capacity(dim);
    for i in 0..dim {
        let mut hasher = DefaultHasher::new();
        i.hash(&mut hasher);
        text.hash(&mut hasher);
        let raw = hasher.finish();
        // Map the hash onto [-1, 1]
        let unit = (raw as f64 / u64::MAX as f64) * 2.0 - 1.0;
        vector.push(unit as f32);
    }

    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

/// Cosine similarity; 0.0 on zero norm or mismatched lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

// ─── Remote providers ────────────────────────────────────

async fn embed_remote(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    text: &str,
) -> Result<Vec<f32>> {
    match config.provider.as_str() {
        "ollama" => embed_ollama(client, config, text).await,
        "openai" => embed_openai(client, config, text).await,
        other => anyhow::bail!("Unknown embedding provider: {other}"),
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    /// Ask Ollama to silently truncate inputs that exceed the model's context
    /// length instead of returning a 400 error.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

async fn embed_ollama(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    text: &str,
) -> Result<Vec<f32>> {
    let url = format!("{}/api/embed", config.base_url);

    let req = OllamaEmbedRequest {
        model: config.model.clone(),
        input: vec![text.to_string()],
        truncate: true,
    };

    let resp = client
        .post(&url)
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama embed API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama embed API returned {status}: {body}");
    }

    let body: OllamaEmbedResponse = resp
        .json()
        .await
        .context("Failed to parse Ollama embed response")?;

    body.embeddings
        .into_iter()
        .next()
        .context("No embedding returned")
}

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

async fn embed_openai(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    text: &str,
) -> Result<Vec<f32>> {
    let url = format!("{}/v1/embeddings", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiEmbedRequest {
        model: config.model.clone(),
        input: vec![text.to_string()],
    };

    let resp = client
        .post(&url)
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI embed API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI embed API returned {status}: {body}");
    }

    let body: OpenAiEmbedResponse = resp
        .json()
        .await
        .context("Failed to parse OpenAI embed response")?;

    body.data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .context("No embedding returned")
}
