//! Embedder backed by a remote embeddings endpoint

use super::{Embedder, LLMClient};
use crate::error::{RagError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Adapts an [`LLMClient`] to the [`Embedder`] trait.
///
/// Vectors whose length differs from the configured dimensions are rejected,
/// since they could never be compared against the collection's index.
pub struct HttpEmbedder {
    client: Arc<dyn LLMClient>,
}

impl HttpEmbedder {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        let expected = self.client.embedding_dimensions();
        if expected != 0 && vector.len() != expected {
            return Err(RagError::Provider(format!(
                "{} returned {}-dim embedding, expected {}",
                self.client.model_name(),
                vector.len(),
                expected
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.client.embed(text).await?;
        self.check_dimensions(&vector)?;
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.client.embed_batch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(RagError::Provider(format!(
                "embedding batch size mismatch: sent {}, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        for vector in &vectors {
            self.check_dimensions(vector)?;
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.client.embedding_dimensions()
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }
}
