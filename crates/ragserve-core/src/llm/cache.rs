//! Query embedding cache
//!
//! Repeated questions against the same embedding model skip the network
//! round trip. Entries expire after a TTL and the cache holds at most
//! `capacity` vectors.

use moka::future::Cache;
use std::time::Duration;

const DEFAULT_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_CAPACITY: u64 = 4096;

/// In-memory TTL cache of query embeddings
#[derive(Clone)]
pub struct EmbeddingCache {
    entries: Cache<String, Vec<f32>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    pub fn with_limits(ttl: Duration, capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity.max(1))
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cached vector, if present and younger than the TTL
    pub async fn get(&self, key: &str) -> Option<Vec<f32>> {
        self.entries.get(key).await
    }

    pub async fn insert(&self, key: String, vector: Vec<f32>) {
        self.entries.insert(key, vector).await;
    }

    /// Approximate entry count; exact after pending maintenance has run
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache key for a (model, text) pair
pub fn embedding_cache_key(model: &str, text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(model.as_bytes());
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    format!("embed:{}:{}", model, hasher.finalize().to_hex())
}
