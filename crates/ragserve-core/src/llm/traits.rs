//! Provider capability traits

use crate::error::Result;
use async_trait::async_trait;

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for batch of texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Answer generation trait
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a completion for a fully composed prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Passage relevance scoring trait
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Score each document against the query; higher is more relevant.
    ///
    /// Documents missing from the output are treated as unscored.
    async fn rerank(&self, query: &str, documents: &[RerankDocument]) -> Result<Vec<RerankResult>>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Document sent for reranking
#[derive(Debug, Clone, PartialEq)]
pub struct RerankDocument {
    pub id: String,
    pub text: String,
}

/// Relevance score for one document
#[derive(Debug, Clone, PartialEq)]
pub struct RerankResult {
    pub id: String,
    pub score: f64,
}
