use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::embedding::{CacheSnapshotEntry, EmbeddingCache};

/// Snapshots older than this are ignored on load.
const SNAPSHOT_MAX_AGE_HOURS: i64 = 24;

/// Shared pipeline state: the HTTP client, the embedding cache, the scoring
/// semaphore, and the per-backend request counters.
///
/// Counters and cache are process-local and non-authoritative; `persist` and
/// `restore_snapshot` give them a best-effort life across restarts.
#[derive(Clone)]
pub struct RetrievalState {
    pub http_client: reqwest::Client,
    pub embedding_cache: Arc<EmbeddingCache>,
    pub scoring_semaphore: Arc<tokio::sync::Semaphore>,
    request_counts: Arc<RwLock<HashMap<String, u32>>>,
    request_limit: u32,
}

#[derive(Serialize, Deserialize)]
struct StateSnapshot {
    saved_at: DateTime<Utc>,
    request_counts: HashMap<String, u32>,
    embedding_cache: Vec<CacheSnapshotEntry>,
}

impl RetrievalState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        // Ensure the data directory exists
        std::fs::create_dir_all(&config.data_dir)?;

        let state = Self {
            http_client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            embedding_cache: Arc::new(EmbeddingCache::new(config.embedding.cache_ttl_secs)),
            scoring_semaphore: Arc::new(tokio::sync::Semaphore::new(
                config.scoring_concurrency.max(1),
            )),
            request_counts: Arc::new(RwLock::new(HashMap::new())),
            request_limit: config.sources.request_limit,
        };

        // Reload persisted counters and cache when present and fresh
        let snapshot_path = config.snapshot_path();
        if snapshot_path.exists() {
            state.restore_snapshot(&snapshot_path);
        }

        Ok(state)
    }

    /// Count one issued request against a backend's budget.
    pub fn record_request(&self, backend: &str) {
        let mut counts = self.request_counts.write();
        *counts.entry(backend.to_string()).or_insert(0) += 1;
    }

    /// Whether a backend has used up its request budget for this process run.
    pub fn is_rate_limited(&self, backend: &str) -> bool {
        self.request_counts
            .read()
            .get(backend)
            .copied()
            .unwrap_or(0)
            >= self.request_limit
    }

    pub fn request_count(&self, backend: &str) -> u32 {
        self.request_counts
            .read()
            .get(backend)
            .copied()
            .unwrap_or(0)
    }

    /// Zero all backend counters, re-enabling rate-limited backends.
    pub fn reset_rate_limits(&self) {
        self.request_counts.write().clear();
    }

    pub fn clear_embedding_cache(&self) {
        self.embedding_cache.clear();
    }

    /// Persist counters and embedding cache to disk (atomic write via temp
    /// file + rename). Best effort: failures are ignored.
    pub fn persist(&self, path: &Path) {
        let snapshot = StateSnapshot {
            saved_at: Utc::now(),
            request_counts: self.request_counts.read().clone(),
            embedding_cache: self.embedding_cache.export(),
        };
        if let Ok(data) = serde_json::to_string_pretty(&snapshot) {
            let tmp_path = path.with_extension("json.tmp");
            if std::fs::write(&tmp_path, &data).is_ok() {
                let _ = std::fs::rename(&tmp_path, path);
            }
        }
    }

    /// Reload a persisted snapshot. Unreadable or stale snapshots are ignored.
    pub fn restore_snapshot(&self, path: &Path) {
        let Some(snapshot) = read_snapshot(path) else {
            return;
        };
        let age = Utc::now() - snapshot.saved_at;
        if age > chrono::Duration::hours(SNAPSHOT_MAX_AGE_HOURS) {
            tracing::debug!("ignoring stale state snapshot at {}", path.display());
            return;
        }
        *self.request_counts.write() = snapshot.request_counts;
        self.embedding_cache.restore(snapshot.embedding_cache);
    }
}

fn read_snapshot(path: &Path) -> Option<StateSnapshot> {
    let data = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}
