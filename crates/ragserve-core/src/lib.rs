//! Ragserve Core Library
//!
//! Retrieval-augmented question answering over named document collections.
//!
//! # Features
//! - SQLite collection index with FTS5 keyword search and dense vectors
//! - Naive (vector) and hybrid (vector + keyword, RRF) retrieval strategies
//! - Optional reranking of hybrid candidates
//! - Pipeline cache keyed by collection, strategy and provider fingerprint
//! - OpenAI-compatible, Ollama and in-process embedding providers
//! - Ingestion from scraper output, Q&A CSV files and text directories

pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod llm;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod search;

pub use config::{
    Config, EmbeddingConfig, GenerationConfig, HybridConfig, ManagerConfig, ProviderConfig,
    ProviderFingerprint, RerankConfig, RerankProviderKind,
};
pub use db::{CollectionInfo, Database, NewPassage, WritePolicy, WriteStats};
pub use error::{Error, ErrorKind, RagError, Result, Stage};
pub use index::{ingest, load_documents, Document, IngestOptions, IngestReport};
pub use llm::{Embedder, Generator, HttpEmbedder, HttpGenerator, LocalEmbedder, Reranker};
pub use pipeline::{
    CacheStats, CollectionId, Confidence, Pipeline, PipelineKey, PipelineManager, PromptTemplate,
    Query, QueryResult,
};
pub use providers::{DefaultProviderFactory, ProviderFactory};
pub use retrieval::{RerankStage, Retriever, RetrieverBinding, StrategyId};
pub use search::{RetrievedPassage, SearchBackend, SqliteBackend};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "ragserve";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "ragserve";
