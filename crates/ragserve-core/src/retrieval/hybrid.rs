//! Hybrid strategy: vector and keyword search merged with Reciprocal Rank
//! Fusion, optionally reranked

use super::{dedupe_by_source, Retriever, RetrieverBinding, StrategyId};
use crate::config::HybridConfig;
use crate::error::{RagError, Result};
use crate::search::RetrievedPassage;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Runs both searches concurrently and fuses their rankings
pub struct HybridRetriever {
    binding: RetrieverBinding,
}

impl HybridRetriever {
    pub fn new(binding: RetrieverBinding) -> Self {
        Self { binding }
    }

    fn candidate_limit(&self, top_k: usize) -> usize {
        top_k.saturating_mul(self.binding.hybrid.candidate_multiplier.max(1))
    }
}

#[async_trait]
impl Retriever for HybridRetriever {
    async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedPassage>> {
        let RetrieverBinding {
            collection,
            backend,
            embedder,
            hybrid,
            rerank,
        } = &self.binding;
        let limit = self.candidate_limit(top_k);

        let embedding = embedder
            .embed(question)
            .await
            .map_err(RagError::into_retrieval)?;

        let (vector, keyword) = futures::try_join!(
            backend.vector_search(collection, &embedding, limit),
            backend.keyword_search(collection, question, limit),
        )
        .map_err(RagError::into_retrieval)?;

        tracing::debug!(
            collection = %collection,
            vector = vector.len(),
            keyword = keyword.len(),
            "hybrid candidates collected"
        );

        let fused = rrf_fusion(
            &dedupe_by_source(vector),
            &dedupe_by_source(keyword),
            hybrid,
        );
        let mut ranked = match rerank {
            Some(stage) => {
                let candidates = fused.len();
                let ranked = stage.apply(question, fused, top_k).await?;
                tracing::debug!(
                    model = stage.model_name(),
                    candidates,
                    "reranked hybrid candidates"
                );
                ranked
            }
            None => fused,
        };
        ranked.truncate(top_k);
        Ok(ranked)
    }

    fn strategy(&self) -> StrategyId {
        StrategyId::Hybrid
    }

    fn collection(&self) -> &str {
        &self.binding.collection
    }
}

struct Fused {
    score: f64,
    vector_rank: Option<usize>,
    keyword_rank: Option<usize>,
    passage: RetrievedPassage,
}

/// Weighted Reciprocal Rank Fusion.
///
/// Each list contributes `weight / (rrf_k + rank)` (1-based rank) to every
/// source it contains. Inputs must already be free of duplicate sources.
/// Ties are broken by vector rank, then keyword rank, then source, so the
/// output order is fully determined by the inputs. When one list is empty
/// the result is the other list in its own order.
pub fn rrf_fusion(
    vector: &[RetrievedPassage],
    keyword: &[RetrievedPassage],
    config: &HybridConfig,
) -> Vec<RetrievedPassage> {
    let mut scores: HashMap<&str, Fused> = HashMap::new();

    for (rank, passage) in vector.iter().enumerate() {
        let contribution = config.vector_weight / (config.rrf_k + (rank + 1) as f64);
        let entry = scores.entry(passage.source.as_str()).or_insert(Fused {
            score: 0.0,
            vector_rank: None,
            keyword_rank: None,
            passage: passage.clone(),
        });
        entry.score += contribution;
        entry.vector_rank = Some(rank);
    }

    for (rank, passage) in keyword.iter().enumerate() {
        let contribution = config.keyword_weight / (config.rrf_k + (rank + 1) as f64);
        let entry = scores.entry(passage.source.as_str()).or_insert(Fused {
            score: 0.0,
            vector_rank: None,
            keyword_rank: None,
            passage: passage.clone(),
        });
        entry.score += contribution;
        entry.keyword_rank = Some(rank);
    }

    let mut fused: Vec<Fused> = scores.into_values().collect();
    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| rank_order(a.vector_rank, b.vector_rank))
            .then_with(|| rank_order(a.keyword_rank, b.keyword_rank))
            .then_with(|| a.passage.source.cmp(&b.passage.source))
    });

    fused
        .into_iter()
        .map(|f| RetrievedPassage {
            score: f.score,
            ..f.passage
        })
        .collect()
}

/// Present ranks sort before absent ones
fn rank_order(a: Option<usize>, b: Option<usize>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
