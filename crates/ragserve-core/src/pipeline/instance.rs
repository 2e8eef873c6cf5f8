//! A bound, ready-to-query pipeline

use super::key::PipelineKey;
use crate::error::{RagError, Result};
use crate::llm::Generator;
use crate::retrieval::{Retriever, StrategyId};
use crate::search::RetrievedPassage;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One retrieval strategy bound to a collection and a provider set.
///
/// Never mutated after construction; a changed configuration produces a new
/// key and therefore a new pipeline.
pub struct Pipeline {
    key: PipelineKey,
    retriever: Box<dyn Retriever>,
    generator: Arc<dyn Generator>,
    embedding_model: String,
    built_at: DateTime<Utc>,
}

impl Pipeline {
    pub fn new(
        key: PipelineKey,
        retriever: Box<dyn Retriever>,
        generator: Arc<dyn Generator>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            key,
            retriever,
            generator,
            embedding_model: embedding_model.into(),
            built_at: Utc::now(),
        }
    }

    pub fn key(&self) -> &PipelineKey {
        &self.key
    }

    pub fn strategy(&self) -> StrategyId {
        self.retriever.strategy()
    }

    pub fn collection(&self) -> &str {
        self.retriever.collection()
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn generation_model(&self) -> &str {
        self.generator.model_name()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Ranked passages for a question
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedPassage>> {
        self.retriever
            .retrieve(question, top_k)
            .await
            .map_err(RagError::into_retrieval)
    }

    /// Completion for a composed prompt
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.generator
            .generate(prompt)
            .await
            .map_err(RagError::into_generation)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("key", &self.key)
            .field("embedding_model", &self.embedding_model)
            .field("generation_model", &self.generator.model_name())
            .field("built_at", &self.built_at)
            .finish()
    }
}
