//! Vector similarity search
//!
//! Computes cosine similarity between query embedding and stored embeddings.

use super::RetrievedPassage;
use crate::db::{cosine_similarity, Database};
use crate::error::{RagError, Result};
use rusqlite::params;

impl Database {
    /// Perform vector similarity search within one collection.
    ///
    /// Only positive similarities count as matches. Equal scores are ordered
    /// by insertion order, so results are deterministic.
    pub fn search_vectors(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        let info = self
            .get_collection(collection)?
            .ok_or_else(|| RagError::UnknownCollection(collection.to_string()))?;

        if query_embedding.len() != info.dimensions {
            return Err(RagError::Retrieval(format!(
                "query embedding has {} dimensions, collection '{}' expects {}",
                query_embedding.len(),
                collection,
                info.dimensions
            )));
        }

        let mut similarities: Vec<(i64, f32)> = self
            .get_vectors_for_collection(collection)?
            .iter()
            .map(|(id, embedding)| (*id, cosine_similarity(query_embedding, embedding)))
            .filter(|(_, sim)| *sim > 0.0)
            .collect();

        similarities.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        similarities.truncate(limit);

        let mut stmt = self
            .conn
            .prepare("SELECT source, title, body FROM passages WHERE id = ?1")?;
        let mut results = Vec::with_capacity(similarities.len());
        for (id, score) in similarities {
            let passage = stmt.query_row(params![id], |row| {
                Ok(RetrievedPassage {
                    source: row.get(0)?,
                    title: row.get(1)?,
                    text: row.get(2)?,
                    score: score as f64,
                })
            })?;
            results.push(passage);
        }

        Ok(results)
    }
}
