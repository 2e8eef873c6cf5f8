//! Reranking of fused hybrid candidates

use crate::error::{RagError, Result};
use crate::llm::{RerankDocument, Reranker};
use crate::search::RetrievedPassage;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// A reranker plus the number of fused candidates it sees per query
#[derive(Clone)]
pub struct RerankStage {
    reranker: Arc<dyn Reranker>,
    max_candidates: usize,
}

impl RerankStage {
    pub fn new(reranker: Arc<dyn Reranker>, max_candidates: usize) -> Self {
        Self {
            reranker,
            max_candidates: max_candidates.max(1),
        }
    }

    pub fn model_name(&self) -> &str {
        self.reranker.model_name()
    }

    /// Reorder the head of `fused` by reranker score.
    ///
    /// At most `max(max_candidates, top_k)` candidates are scored and
    /// returned. Passages the reranker leaves unscored follow the scored
    /// ones in fused order. Equal scores keep fused order.
    pub async fn apply(
        &self,
        question: &str,
        mut fused: Vec<RetrievedPassage>,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        fused.truncate(self.max_candidates.max(top_k));
        if fused.is_empty() {
            return Ok(fused);
        }

        let documents: Vec<RerankDocument> = fused
            .iter()
            .map(|p| RerankDocument {
                id: p.source.clone(),
                text: p.text.clone(),
            })
            .collect();
        let scores: HashMap<String, f64> = self
            .reranker
            .rerank(question, &documents)
            .await
            .map_err(RagError::into_retrieval)?
            .into_iter()
            .filter(|r| r.score.is_finite())
            .map(|r| (r.id, r.score))
            .collect();

        Ok(order_by_scores(fused, &scores))
    }
}

fn order_by_scores(
    fused: Vec<RetrievedPassage>,
    scores: &HashMap<String, f64>,
) -> Vec<RetrievedPassage> {
    let floor = scores.values().copied().fold(f64::INFINITY, f64::min);
    let floor = if floor.is_finite() { floor } else { 0.0 };

    let mut ranked: Vec<(Option<f64>, RetrievedPassage)> = fused
        .into_iter()
        .map(|p| (scores.get(&p.source).copied(), p))
        .collect();
    // Stable: ties and unscored passages keep fused order.
    ranked.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    ranked
        .into_iter()
        .map(|(score, passage)| RetrievedPassage {
            score: score.unwrap_or(floor),
            ..passage
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::RerankResult;
    use async_trait::async_trait;

    /// Scores passages by a fixed table keyed on source
    struct TableReranker(Vec<(&'static str, f64)>);

    #[async_trait]
    impl Reranker for TableReranker {
        async fn rerank(
            &self,
            _query: &str,
            documents: &[RerankDocument],
        ) -> Result<Vec<RerankResult>> {
            Ok(documents
                .iter()
                .filter_map(|d| {
                    self.0
                        .iter()
                        .find(|(id, _)| *id == d.id)
                        .map(|(id, score)| RerankResult {
                            id: id.to_string(),
                            score: *score,
                        })
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "table"
        }
    }

    struct DownReranker;

    #[async_trait]
    impl Reranker for DownReranker {
        async fn rerank(&self, _: &str, _: &[RerankDocument]) -> Result<Vec<RerankResult>> {
            Err(RagError::Provider("rerank service unavailable".into()))
        }

        fn model_name(&self) -> &str {
            "down"
        }
    }

    fn fused(sources: &[&str]) -> Vec<RetrievedPassage> {
        sources
            .iter()
            .enumerate()
            .map(|(i, s)| RetrievedPassage {
                source: s.to_string(),
                title: String::new(),
                text: format!("body {}", s),
                score: 0.05 - i as f64 * 0.001,
            })
            .collect()
    }

    fn sources(passages: &[RetrievedPassage]) -> Vec<&str> {
        passages.iter().map(|p| p.source.as_str()).collect()
    }

    #[tokio::test]
    async fn test_reorders_by_reranker_score() {
        let stage = RerankStage::new(
            Arc::new(TableReranker(vec![("a", 0.1), ("b", 0.9), ("c", 0.5)])),
            10,
        );
        let out = stage.apply("q", fused(&["a", "b", "c"]), 3).await.unwrap();
        assert_eq!(sources(&out), vec!["b", "c", "a"]);
        assert_eq!(out[0].score, 0.9);
    }

    #[tokio::test]
    async fn test_unscored_follow_scored_in_fused_order() {
        let stage = RerankStage::new(Arc::new(TableReranker(vec![("c", 0.7)])), 10);
        let out = stage.apply("q", fused(&["a", "b", "c"]), 3).await.unwrap();
        assert_eq!(sources(&out), vec!["c", "a", "b"]);
        assert!(out.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_candidate_window_is_capped() {
        let stage = RerankStage::new(Arc::new(TableReranker(vec![("d", 1.0)])), 2);
        // `d` falls outside the window and is never scored
        let out = stage.apply("q", fused(&["a", "b", "c", "d"]), 1).await.unwrap();
        assert_eq!(sources(&out), vec!["a", "b"]);

        // top_k wider than the window widens it
        let out = stage.apply("q", fused(&["a", "b", "c", "d"]), 4).await.unwrap();
        assert_eq!(out[0].source, "d");
    }

    #[tokio::test]
    async fn test_reranker_failure_is_retrieval_error() {
        let stage = RerankStage::new(Arc::new(DownReranker), 10);
        let err = stage.apply("q", fused(&["a"]), 1).await.unwrap_err();
        assert!(matches!(err, RagError::Retrieval(_)));
    }
}
