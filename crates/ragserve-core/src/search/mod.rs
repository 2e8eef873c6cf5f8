//! Search backend
//!
//! Provides:
//! - BM25 full-text search via FTS5
//! - Vector similarity search
//! - The async [`SearchBackend`] seam used by retrieval strategies

mod bm25;
mod vector;

pub use bm25::build_fts_query;

use crate::db::Database;
use crate::error::{RagError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// A relevance-scored unit of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Source reference, unique within a collection
    pub source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub text: String,
    pub score: f64,
}

/// Read-only search capabilities over named collections.
///
/// Results are ordered by descending score. Searching a collection that does
/// not exist fails with `UnknownCollection`.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn collection_exists(&self, collection: &str) -> Result<bool>;

    async fn vector_search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>>;

    async fn keyword_search(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>>;
}

/// [`SearchBackend`] over the SQLite index.
///
/// Every call runs on the blocking pool so SQLite I/O never stalls the
/// async workers.
#[derive(Clone)]
pub struct SqliteBackend {
    db: Arc<Mutex<Database>>,
}

impl SqliteBackend {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Shared handle to the underlying database
    pub fn database(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|_| RagError::Retrieval("index lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| RagError::Retrieval(format!("search task failed: {}", e)))?
    }
}

#[async_trait]
impl SearchBackend for SqliteBackend {
    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        let collection = collection.to_string();
        self.with_db(move |db| db.collection_exists(&collection)).await
    }

    async fn vector_search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        let collection = collection.to_string();
        let embedding = embedding.to_vec();
        self.with_db(move |db| db.search_vectors(&collection, &embedding, limit))
            .await
    }

    async fn keyword_search(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        let collection = collection.to_string();
        let query = query.to_string();
        self.with_db(move |db| db.search_keywords(&collection, &query, limit))
            .await
    }
}
