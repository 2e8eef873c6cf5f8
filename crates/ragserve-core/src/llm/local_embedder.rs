//! In-process hashing embedder
//!
//! Each lowercase alphanumeric term is hashed into a dimension and its term
//! frequency accumulated; the vector is L2-normalised. Texts sharing terms
//! get positive cosine similarity, texts with no common term get zero.

use super::Embedder;
use crate::error::{RagError, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// Deterministic embedder with no external service
pub struct LocalEmbedder {
    model: String,
    dimensions: usize,
}

impl LocalEmbedder {
    pub fn new(model: impl Into<String>, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::Config(
                "local embedder needs at least one dimension".into(),
            ));
        }
        Ok(Self {
            model: model.into(),
            dimensions,
        })
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lowered = text.to_lowercase();
        let mut tf: HashMap<&str, usize> = HashMap::new();
        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            *tf.entry(word).or_insert(0) += 1;
        }

        for (term, count) in tf {
            let idx = term_bucket(term) % self.dimensions;
            vector[idx] += count as f32;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

/// Stable across processes and platforms, unlike `DefaultHasher`
fn term_bucket(term: &str) -> usize {
    let digest = blake3::hash(term.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes) as usize
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::cosine_similarity;

    #[tokio::test]
    async fn test_deterministic_and_normalised() {
        let embedder = LocalEmbedder::new("local", 64).unwrap();
        let a = embedder.embed("Rust ownership rules").await.unwrap();
        let b = embedder.embed("rust OWNERSHIP rules").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_shared_terms_score_higher() {
        let embedder = LocalEmbedder::new("local", 384).unwrap();
        let query = embedder.embed("borrow checker").await.unwrap();
        let related = embedder.embed("the borrow checker enforces aliasing").await.unwrap();
        let unrelated = embedder.embed("python garbage collection").await.unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = LocalEmbedder::new("local", 8).unwrap();
        let v = embedder.embed("  ?! ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(LocalEmbedder::new("local", 0).is_err());
    }
}
