//! LLM integration
//!
//! Provides traits and implementations for:
//! - Embedding generation via external services (OpenAI, Ollama, vLLM) or in-process
//! - Answer generation via chat-completion services
//! - Optional passage reranking (cross-encoder or LLM scorer)

mod cache;
mod client;
mod http_embedder;
mod http_generator;
mod local_embedder;
mod ollama;
mod reranker;
mod traits;

pub use cache::{embedding_cache_key, EmbeddingCache};
pub use client::{ChatMessage, LLMClient, OpenAIClient};
pub use http_embedder::HttpEmbedder;
pub use http_generator::HttpGenerator;
pub use local_embedder::LocalEmbedder;
pub use ollama::OllamaClient;
pub use reranker::{CrossEncoderReranker, LlmReranker};
pub use traits::*;
