//! Naive strategy: one dense vector search

use super::{dedupe_by_source, Retriever, RetrieverBinding, StrategyId};
use crate::error::{RagError, Result};
use crate::search::RetrievedPassage;
use async_trait::async_trait;

/// Embeds the question and returns the nearest passages
pub struct NaiveRetriever {
    binding: RetrieverBinding,
}

impl NaiveRetriever {
    pub fn new(binding: RetrieverBinding) -> Self {
        Self { binding }
    }
}

#[async_trait]
impl Retriever for NaiveRetriever {
    async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedPassage>> {
        let embedding = self
            .binding
            .embedder
            .embed(question)
            .await
            .map_err(RagError::into_retrieval)?;

        let matches = self
            .binding
            .backend
            .vector_search(&self.binding.collection, &embedding, top_k)
            .await
            .map_err(RagError::into_retrieval)?;

        let mut passages = dedupe_by_source(matches);
        passages.truncate(top_k);

        tracing::debug!(
            collection = %self.binding.collection,
            results = passages.len(),
            "naive retrieval finished"
        );
        Ok(passages)
    }

    fn strategy(&self) -> StrategyId {
        StrategyId::Naive
    }

    fn collection(&self) -> &str {
        &self.binding.collection
    }
}
