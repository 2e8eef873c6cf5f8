//! Retrieval strategies
//!
//! A strategy ranks passages of one collection against a question. The set
//! of strategies is closed: [`StrategyId`] names them and
//! [`StrategyId::instantiate`] is the single place a tag becomes an
//! implementation.

mod hybrid;
mod naive;
mod rerank;

pub use hybrid::{rrf_fusion, HybridRetriever};
pub use naive::NaiveRetriever;
pub use rerank::RerankStage;

use crate::config::HybridConfig;
use crate::error::{RagError, Result};
use crate::llm::Embedder;
use crate::search::{RetrievedPassage, SearchBackend};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Retrieval algorithm tag
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    /// Single dense vector search
    #[default]
    Naive,
    /// Vector and keyword search merged by rank fusion
    Hybrid,
}

impl StrategyId {
    pub const ALL: [StrategyId; 2] = [StrategyId::Naive, StrategyId::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Naive => "naive",
            StrategyId::Hybrid => "hybrid",
        }
    }

    /// Build the retriever for this strategy, bound to one collection
    pub fn instantiate(self, binding: RetrieverBinding) -> Box<dyn Retriever> {
        match self {
            StrategyId::Naive => Box::new(NaiveRetriever::new(binding)),
            StrategyId::Hybrid => Box::new(HybridRetriever::new(binding)),
        }
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyId {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "naive" => Ok(StrategyId::Naive),
            "hybrid" => Ok(StrategyId::Hybrid),
            other => Err(RagError::InvalidInput(format!(
                "Unknown strategy: {}. Supported strategies are: naive, hybrid",
                other
            ))),
        }
    }
}

/// Everything a retriever is bound to at construction
#[derive(Clone)]
pub struct RetrieverBinding {
    pub collection: String,
    pub backend: Arc<dyn SearchBackend>,
    pub embedder: Arc<dyn Embedder>,
    pub hybrid: HybridConfig,
    /// Applied to fused hybrid candidates when present
    pub rerank: Option<RerankStage>,
}

/// Retrieval capability shared by all strategies
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return at most `top_k` passages, highest relevance first, no two
    /// sharing a source reference
    async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedPassage>>;

    fn strategy(&self) -> StrategyId;

    /// Collection this retriever searches
    fn collection(&self) -> &str;
}

/// Drop repeated sources, keeping the higher-scoring occurrence.
///
/// Output is sorted by descending score; equal scores keep input order.
pub fn dedupe_by_source(mut passages: Vec<RetrievedPassage>) -> Vec<RetrievedPassage> {
    // Stable sort: the first occurrence of each source is its best one.
    passages.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut seen = HashSet::new();
    passages.retain(|p| seen.insert(p.source.clone()));
    passages
}
