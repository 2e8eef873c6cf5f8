//! Query and result types

use crate::error::{RagError, Result};
use crate::retrieval::StrategyId;
use crate::search::RetrievedPassage;
use serde::{Deserialize, Serialize};

/// Default number of passages per query
pub const DEFAULT_TOP_K: usize = 5;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// An inbound question against one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub question: String,
    pub collection: String,
    #[serde(default)]
    pub strategy: StrategyId,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Content version of the collection, when the caller tracks one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_version: Option<String>,
}

impl Query {
    pub fn new(question: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            collection: collection.into(),
            strategy: StrategyId::default(),
            top_k: DEFAULT_TOP_K,
            collection_version: None,
        }
    }

    pub fn with_strategy(mut self, strategy: StrategyId) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_collection_version(mut self, version: impl Into<String>) -> Self {
        self.collection_version = Some(version.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(RagError::InvalidInput("question must not be empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::InvalidInput("collection must not be empty".into()));
        }
        if self.top_k == 0 {
            return Err(RagError::InvalidInput("top_k must be at least 1".into()));
        }
        Ok(())
    }
}

/// How well the answer is supported by retrieved evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// At least one passage backed the answer
    Grounded,
    /// Generation ran with empty context
    Low,
}

/// Answer plus the evidence it was generated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub passages: Vec<RetrievedPassage>,
    pub confidence: Confidence,
    pub strategy: StrategyId,
    pub collection: String,
}

impl QueryResult {
    pub fn is_low_confidence(&self) -> bool {
        self.confidence == Confidence::Low
    }
}
