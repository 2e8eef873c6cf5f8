//! Shared fixtures: a seeded in-memory index and scriptable providers

#![allow(dead_code)]

use async_trait::async_trait;
use ragserve_core::config::{EmbeddingConfig, GenerationConfig, ManagerConfig, RerankConfig};
use ragserve_core::db::{Database, NewPassage};
use ragserve_core::error::{RagError, Result};
use ragserve_core::llm::{Embedder, Generator, RerankDocument, RerankResult, Reranker};
use ragserve_core::search::{RetrievedPassage, SearchBackend, SqliteBackend};
use ragserve_core::{HybridConfig, PipelineManager, PromptTemplate, ProviderFactory};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DIMS: usize = 3;

/// Five passages whose similarity to the "ownership" direction strictly
/// decreases from `ownership#0` to `futures#0`.
pub const DOCS_V1: &[(&str, &str, [f32; 3])] = &[
    ("ownership#0", "Each value in Rust has a single owner.", [1.0, 0.0, 0.0]),
    ("moves#0", "Assigning a value moves ownership to the new binding.", [0.9, 0.1, 0.0]),
    ("borrowing#0", "References borrow a value without taking ownership.", [0.7, 0.7, 0.0]),
    ("lifetimes#0", "Lifetimes describe how long a reference stays valid.", [0.2, 0.9, 0.1]),
    ("futures#0", "Futures are polled by an executor until they complete.", [0.05, 0.1, 1.0]),
];

pub fn seeded_database() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();

    db.create_collection("docs_v1", "table", DIMS).unwrap();
    for (source, body, vector) in DOCS_V1 {
        db.upsert_passage(
            "docs_v1",
            NewPassage {
                source: source.to_string(),
                title: String::new(),
                body: body.to_string(),
            },
            vector.to_vec(),
        )
        .unwrap();
    }

    db.create_collection("faq", "table", DIMS).unwrap();
    db.upsert_passage(
        "faq",
        NewPassage {
            source: "faq/install#0".into(),
            title: "Install".into(),
            body: "Install the toolchain with rustup.".into(),
        },
        vec![0.0, 1.0, 0.0],
    )
    .unwrap();

    db
}

pub fn seeded_backend() -> Arc<SqliteBackend> {
    Arc::new(SqliteBackend::new(seeded_database()))
}

/// Maps a question to a fixed direction; other questions embed to zero,
/// which matches nothing in vector search.
pub struct TableEmbedder;

#[async_trait]
impl Embedder for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        let vector = if text.contains("owner") {
            vec![1.0, 0.0, 0.0]
        } else if text.contains("install") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0; DIMS]
        };
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model_name(&self) -> &str {
        "table"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorMode {
    Echo,
    Slow,
    Failing,
}

/// Records prompts and answers according to its mode
pub struct ScriptedGenerator {
    mode: GeneratorMode,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.mode {
            GeneratorMode::Echo => Ok(format!("answer from {} prompt bytes", prompt.len())),
            GeneratorMode::Slow => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("too late".into())
            }
            GeneratorMode::Failing => Err(RagError::Provider("rate limited (HTTP 429)".into())),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Scores the passage named by its model highest and every other one low
pub struct PinReranker {
    pinned: String,
}

#[async_trait]
impl Reranker for PinReranker {
    async fn rerank(&self, _query: &str, documents: &[RerankDocument]) -> Result<Vec<RerankResult>> {
        Ok(documents
            .iter()
            .map(|d| RerankResult {
                id: d.id.clone(),
                score: if d.id == self.pinned { 1.0 } else { 0.1 },
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        &self.pinned
    }
}

/// Factory that counts builds and can be told to fail
pub struct MockFactory {
    generator: Arc<ScriptedGenerator>,
    embedder_builds: AtomicUsize,
    reranker_builds: AtomicUsize,
    pub unreachable: AtomicBool,
}

impl MockFactory {
    pub fn new(mode: GeneratorMode) -> Arc<Self> {
        Arc::new(Self {
            generator: Arc::new(ScriptedGenerator {
                mode,
                prompts: Mutex::new(Vec::new()),
            }),
            embedder_builds: AtomicUsize::new(0),
            reranker_builds: AtomicUsize::new(0),
            unreachable: AtomicBool::new(false),
        })
    }

    pub fn builds(&self) -> usize {
        self.embedder_builds.load(Ordering::SeqCst)
    }

    pub fn reranker_builds(&self) -> usize {
        self.reranker_builds.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.generator.prompts.lock().unwrap().clone()
    }
}

impl ProviderFactory for MockFactory {
    fn embedder(&self, _config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RagError::Provider("embedding service unreachable".into()));
        }
        self.embedder_builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(TableEmbedder))
    }

    fn generator(&self, _config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
        let generator: Arc<dyn Generator> = self.generator.clone();
        Ok(generator)
    }

    fn reranker(&self, config: &RerankConfig) -> Result<Arc<dyn Reranker>> {
        self.reranker_builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(PinReranker {
            pinned: config.model.clone(),
        }))
    }
}

/// Backend wrapper that delays existence checks and searches, and can
/// fail searches
pub struct FlakyBackend {
    pub inner: Arc<SqliteBackend>,
    pub build_delay: Duration,
    pub search_delay: Duration,
    pub search_offline: bool,
}

impl FlakyBackend {
    fn offline() -> RagError {
        RagError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "index offline",
        ))
    }
}

#[async_trait]
impl SearchBackend for FlakyBackend {
    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        tokio::time::sleep(self.build_delay).await;
        self.inner.collection_exists(collection).await
    }

    async fn vector_search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        tokio::time::sleep(self.search_delay).await;
        if self.search_offline {
            return Err(Self::offline());
        }
        self.inner.vector_search(collection, embedding, limit).await
    }

    async fn keyword_search(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        tokio::time::sleep(self.search_delay).await;
        if self.search_offline {
            return Err(Self::offline());
        }
        self.inner.keyword_search(collection, query, limit).await
    }
}

pub fn manager(
    backend: Arc<dyn SearchBackend>,
    factory: Arc<MockFactory>,
    config: ManagerConfig,
) -> PipelineManager {
    PipelineManager::new(
        backend,
        factory,
        config,
        HybridConfig::default(),
        PromptTemplate::default(),
    )
}
