//! Provider factory
//!
//! Maps a provider configuration to concrete embedding and generation
//! handles. The pipeline manager only sees the [`ProviderFactory`] trait, so
//! new backends are added here without touching caching or retrieval.

use crate::config::{
    EmbeddingConfig, EmbeddingProviderKind, GenerationConfig, GenerationProviderKind,
    RerankConfig, RerankProviderKind,
};
use crate::error::{RagError, Result};
use crate::llm::{
    CrossEncoderReranker, Embedder, Generator, HttpEmbedder, HttpGenerator, LlmReranker,
    LocalEmbedder, OllamaClient, OpenAIClient, Reranker,
};
use std::sync::Arc;

/// Selects provider implementations for a configuration
pub trait ProviderFactory: Send + Sync {
    /// Build the embedder used for query (and ingestion) embeddings
    fn embedder(&self, config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>>;

    /// Build the answer generator
    fn generator(&self, config: &GenerationConfig) -> Result<Arc<dyn Generator>>;

    /// Build the reranker applied to hybrid candidates.
    ///
    /// Only called when the provider configuration enables reranking.
    fn reranker(&self, config: &RerankConfig) -> Result<Arc<dyn Reranker>> {
        Err(RagError::Config(format!(
            "reranker provider {:?} is not available from this factory",
            config.provider
        )))
    }
}

/// Built-in providers: OpenAI-compatible, Ollama and the local embedder
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProviderFactory;

impl ProviderFactory for DefaultProviderFactory {
    fn embedder(&self, config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
        tracing::info!(
            "Using embedding provider: {:?} (model: {})",
            config.provider,
            config.model
        );
        let embedder: Arc<dyn Embedder> = match config.provider {
            EmbeddingProviderKind::OpenAI => Arc::new(HttpEmbedder::new(Arc::new(
                OpenAIClient::for_embedding(config)?,
            ))),
            EmbeddingProviderKind::Ollama => Arc::new(HttpEmbedder::new(Arc::new(
                OllamaClient::for_embedding(config)?,
            ))),
            EmbeddingProviderKind::Local => {
                Arc::new(LocalEmbedder::new(config.model.clone(), config.dimensions)?)
            }
        };
        Ok(embedder)
    }

    fn generator(&self, config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
        tracing::info!(
            "Using LLM provider: {:?} (model: {})",
            config.provider,
            config.model
        );
        let client: Arc<dyn crate::llm::LLMClient> = match config.provider {
            GenerationProviderKind::OpenAI => Arc::new(OpenAIClient::for_generation(config)?),
            GenerationProviderKind::Ollama => Arc::new(OllamaClient::for_generation(config)?),
        };
        Ok(Arc::new(HttpGenerator::new(client)))
    }

    fn reranker(&self, config: &RerankConfig) -> Result<Arc<dyn Reranker>> {
        tracing::info!(
            "Using reranker: {:?} (model: {})",
            config.provider,
            config.model
        );
        let reranker: Arc<dyn Reranker> = match config.provider {
            RerankProviderKind::CrossEncoder => {
                Arc::new(CrossEncoderReranker::from_config(config)?)
            }
            RerankProviderKind::OpenAI => Arc::new(LlmReranker::new(Arc::new(
                OpenAIClient::for_generation(&config.as_generation())?,
            ))),
            RerankProviderKind::Ollama => Arc::new(LlmReranker::new(Arc::new(
                OllamaClient::for_generation(&config.as_generation())?,
            ))),
        };
        Ok(reranker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_embedder_selected() {
        let config = EmbeddingConfig {
            provider: EmbeddingProviderKind::Local,
            model: "hash-128".into(),
            url: None,
            api_key: None,
            dimensions: 128,
            timeout_secs: 5,
        };
        let embedder = DefaultProviderFactory.embedder(&config).unwrap();
        assert_eq!(embedder.dimensions(), 128);
        assert_eq!(embedder.model_name(), "hash-128");
    }

    #[test]
    fn test_generators_constructed_without_network() {
        for provider in [GenerationProviderKind::OpenAI, GenerationProviderKind::Ollama] {
            let config = GenerationConfig {
                provider,
                model: "m".into(),
                url: Some("http://127.0.0.1:9".into()),
                api_key: None,
                temperature: 0.0,
                max_tokens: 32,
                timeout_secs: 5,
            };
            let generator = DefaultProviderFactory.generator(&config).unwrap();
            assert_eq!(generator.model_name(), "m");
        }
    }

    #[test]
    fn test_every_reranker_kind_constructed_without_network() {
        for provider in [
            RerankProviderKind::CrossEncoder,
            RerankProviderKind::OpenAI,
            RerankProviderKind::Ollama,
        ] {
            let mut config = RerankConfig::new(provider, "scorer");
            config.url = Some("http://127.0.0.1:9".into());
            let reranker = DefaultProviderFactory.reranker(&config).unwrap();
            assert_eq!(reranker.model_name(), "scorer");
        }
    }
}
