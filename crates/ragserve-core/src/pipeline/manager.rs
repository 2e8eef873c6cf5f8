//! Pipeline manager
//!
//! Owns the pipeline cache and dispatches queries:
//! - cache hits never wait on a build
//! - concurrent misses for one key share a single build
//! - failed builds are never cached
//! - an optional bound evicts the least recently used pipeline
//! - invalidating a collection also discards builds that were in flight

use super::instance::Pipeline;
use super::key::{CollectionId, PipelineKey};
use super::prompt::PromptTemplate;
use super::query::{Confidence, Query, QueryResult};
use crate::config::{HybridConfig, ManagerConfig, ProviderConfig};
use crate::error::{RagError, Result, Stage};
use crate::providers::ProviderFactory;
use crate::retrieval::{RerankStage, RetrieverBinding, StrategyId};
use crate::search::SearchBackend;
use moka::future::Cache;
use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    build_failures: AtomicU64,
    evictions: AtomicU64,
}

/// Cache counters since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub build_failures: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Invalidation counters: one bumped by `clear`, one per collection
#[derive(Default)]
struct Epochs {
    all: u64,
    collections: HashMap<String, u64>,
}

/// Single entry point for answering questions against collections
pub struct PipelineManager {
    backend: Arc<dyn SearchBackend>,
    factory: Arc<dyn ProviderFactory>,
    hybrid: HybridConfig,
    prompt: PromptTemplate,
    retrieval_timeout: Duration,
    generation_timeout: Duration,
    cache: Cache<PipelineKey, Arc<Pipeline>>,
    epochs: Mutex<Epochs>,
    counters: Arc<Counters>,
}

impl PipelineManager {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        factory: Arc<dyn ProviderFactory>,
        config: ManagerConfig,
        hybrid: HybridConfig,
        prompt: PromptTemplate,
    ) -> Self {
        let counters = Arc::new(Counters::default());
        let listener_counters = Arc::clone(&counters);

        let mut builder = Cache::builder()
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(
                move |key: Arc<PipelineKey>, _pipeline: Arc<Pipeline>, cause: RemovalCause| {
                    if cause == RemovalCause::Size {
                        listener_counters.evictions.fetch_add(1, Ordering::Relaxed);
                        tracing::info!(key = %key, "evicted least recently used pipeline");
                    }
                },
            );
        if let Some(max) = config.max_pipelines {
            builder = builder.max_capacity(max.max(1) as u64);
        }

        Self {
            backend,
            factory,
            hybrid,
            prompt,
            retrieval_timeout: Duration::from_secs(config.retrieval_timeout_secs),
            generation_timeout: Duration::from_secs(config.generation_timeout_secs),
            cache: builder.build(),
            epochs: Mutex::new(Epochs::default()),
            counters,
        }
    }

    /// Override the per-stage time bounds
    pub fn with_stage_timeouts(mut self, retrieval: Duration, generation: Duration) -> Self {
        self.retrieval_timeout = retrieval;
        self.generation_timeout = generation;
        self
    }

    /// Return the cached pipeline for these inputs, building it on a miss
    pub async fn resolve(
        &self,
        collection: &str,
        strategy: StrategyId,
        providers: &ProviderConfig,
        collection_version: Option<&str>,
    ) -> Result<Arc<Pipeline>> {
        let key = PipelineKey::new(
            CollectionId::parse(collection)?,
            strategy,
            providers.fingerprint(),
            collection_version.map(str::to_string),
        );

        if let Some(pipeline) = self.cache.get(&key).await {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "pipeline cache hit");
            return Ok(pipeline);
        }

        let epoch = self.epoch(key.collection.as_str());
        let built_here = AtomicBool::new(false);
        let resolved = self
            .cache
            .try_get_with(key.clone(), async {
                built_here.store(true, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                let started = Instant::now();
                match self.build(&key, providers).await {
                    Ok(pipeline) => {
                        self.counters.builds.fetch_add(1, Ordering::Relaxed);
                        tracing::info!(
                            key = %key,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "built pipeline"
                        );
                        Ok(Arc::new(pipeline))
                    }
                    Err(e) => {
                        self.counters.build_failures.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(key = %key, error = %e, "pipeline build failed");
                        Err(e)
                    }
                }
            })
            .await;

        let pipeline = resolved.map_err(|shared| unshare(&key, &shared))?;
        if !built_here.load(Ordering::Relaxed) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "pipeline built by concurrent caller");
            return Ok(pipeline);
        }

        self.cache.run_pending_tasks().await;
        if self.epoch(key.collection.as_str()) != epoch {
            // Invalidated while building: serve this caller, keep it out of the cache.
            self.cache.invalidate(&key).await;
            self.cache.run_pending_tasks().await;
            tracing::info!(key = %key, "discarded pipeline invalidated during build");
        }
        Ok(pipeline)
    }

    /// Answer a question: resolve, retrieve, compose the prompt, generate
    pub async fn answer(&self, query: &Query, providers: &ProviderConfig) -> Result<QueryResult> {
        query.validate()?;
        let pipeline = self
            .resolve(
                &query.collection,
                query.strategy,
                providers,
                query.collection_version.as_deref(),
            )
            .await?;

        let started = Instant::now();
        let passages = bounded(
            Stage::Retrieval,
            self.retrieval_timeout,
            pipeline.retrieve(&query.question, query.top_k),
        )
        .await?;
        let retrieval_ms = started.elapsed().as_millis() as u64;

        let confidence = if passages.is_empty() {
            tracing::info!(
                collection = %pipeline.collection(),
                "no passages retrieved, generating with empty context"
            );
            Confidence::Low
        } else {
            Confidence::Grounded
        };

        let prompt = self.prompt.render(&query.question, &passages);
        let answer = bounded(
            Stage::Generation,
            self.generation_timeout,
            pipeline.generate(&prompt),
        )
        .await?;

        tracing::debug!(
            key = %pipeline.key(),
            passages = passages.len(),
            retrieval_ms,
            total_ms = started.elapsed().as_millis() as u64,
            "query answered"
        );

        Ok(QueryResult {
            answer,
            passages,
            confidence,
            strategy: pipeline.strategy(),
            collection: pipeline.collection().to_string(),
        })
    }

    /// Drop every cached pipeline bound to a collection.
    ///
    /// Builds for the collection still in flight complete for their callers
    /// but are not cached.
    pub async fn invalidate_collection(&self, collection: &str) -> usize {
        let collection = collection.trim();
        {
            let mut epochs = self.epochs.lock().unwrap_or_else(PoisonError::into_inner);
            *epochs.collections.entry(collection.to_string()).or_default() += 1;
        }

        let stale: Vec<Arc<PipelineKey>> = self
            .cache
            .iter()
            .filter(|(key, _)| key.collection.as_str() == collection)
            .map(|(key, _)| key)
            .collect();
        for key in &stale {
            self.cache.invalidate(&**key).await;
        }
        self.cache.run_pending_tasks().await;

        if !stale.is_empty() {
            tracing::info!(collection, removed = stale.len(), "invalidated pipelines");
        }
        stale.len()
    }

    /// Drop every cached pipeline
    pub async fn clear(&self) {
        self.epochs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .all += 1;
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    pub fn len(&self) -> usize {
        self.cache.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &PipelineKey) -> bool {
        self.cache.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            builds: self.counters.builds.load(Ordering::Relaxed),
            build_failures: self.counters.build_failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Release all cached pipelines. Queries already holding a pipeline
    /// finish normally.
    pub async fn shutdown(&self) {
        let stats = self.stats();
        self.clear().await;
        tracing::info!(
            hits = stats.hits,
            misses = stats.misses,
            builds = stats.builds,
            evictions = stats.evictions,
            "pipeline manager shut down"
        );
    }

    fn epoch(&self, collection: &str) -> (u64, u64) {
        let epochs = self.epochs.lock().unwrap_or_else(PoisonError::into_inner);
        (
            epochs.all,
            epochs.collections.get(collection).copied().unwrap_or(0),
        )
    }

    async fn build(&self, key: &PipelineKey, providers: &ProviderConfig) -> Result<Pipeline> {
        let collection = key.collection.as_str();
        match self.backend.collection_exists(collection).await {
            Ok(true) => {}
            Ok(false) => return Err(RagError::UnknownCollection(collection.to_string())),
            Err(e) => return Err(build_error(key, e)),
        }

        let embedder = self
            .factory
            .embedder(&providers.embedding)
            .map_err(|e| build_error(key, e))?;
        let generator = self
            .factory
            .generator(&providers.generation)
            .map_err(|e| build_error(key, e))?;
        let rerank = match (&providers.reranker, key.strategy) {
            (Some(config), StrategyId::Hybrid) => {
                let reranker = self
                    .factory
                    .reranker(config)
                    .map_err(|e| build_error(key, e))?;
                Some(RerankStage::new(reranker, config.max_candidates))
            }
            _ => None,
        };

        let retriever = key.strategy.instantiate(RetrieverBinding {
            collection: collection.to_string(),
            backend: Arc::clone(&self.backend),
            embedder: Arc::clone(&embedder),
            hybrid: self.hybrid.clone(),
            rerank,
        });

        Ok(Pipeline::new(
            key.clone(),
            retriever,
            generator,
            embedder.model_name(),
        ))
    }
}

fn build_error(key: &PipelineKey, err: RagError) -> RagError {
    match err {
        RagError::UnknownCollection(_) | RagError::PipelineBuild { .. } => err,
        other => RagError::PipelineBuild {
            key: key.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Owned copy of a build error shared by every caller waiting on the build
fn unshare(key: &PipelineKey, err: &RagError) -> RagError {
    match err {
        RagError::UnknownCollection(name) => RagError::UnknownCollection(name.clone()),
        RagError::PipelineBuild { key, reason } => RagError::PipelineBuild {
            key: key.clone(),
            reason: reason.clone(),
        },
        other => RagError::PipelineBuild {
            key: key.to_string(),
            reason: other.to_string(),
        },
    }
}

async fn bounded<T>(
    stage: Stage,
    after: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| RagError::Timeout { stage, after })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> PipelineKey {
        PipelineKey::new(
            CollectionId::parse("docs").unwrap(),
            StrategyId::Hybrid,
            ProviderConfig::default().fingerprint(),
            None,
        )
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let err = bounded::<()>(Stage::Generation, Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            RagError::Timeout {
                stage: Stage::Generation,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_bounded_passes_inner_error() {
        let err = bounded::<()>(Stage::Retrieval, Duration::from_secs(1), async {
            Err(RagError::Retrieval("index offline".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, RagError::Retrieval(_)));
    }

    #[test]
    fn test_build_error_wraps_provider_failures() {
        let err = build_error(&key(), RagError::Provider("refused".into()));
        assert!(matches!(err, RagError::PipelineBuild { .. }));
        let err = build_error(&key(), RagError::UnknownCollection("docs".into()));
        assert!(matches!(err, RagError::UnknownCollection(_)));
    }

    #[test]
    fn test_shared_build_errors_keep_their_kind() {
        let err = unshare(&key(), &RagError::UnknownCollection("docs".into()));
        assert!(matches!(err, RagError::UnknownCollection(ref name) if name == "docs"));

        let original = build_error(&key(), RagError::Provider("refused".into()));
        let err = unshare(&key(), &original);
        assert_eq!(err.to_string(), original.to_string());

        let err = unshare(&key(), &RagError::Config("bad".into()));
        assert!(matches!(err, RagError::PipelineBuild { .. }));
    }
}
