//! Configuration management

use crate::error::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Embedding and generation providers
    #[serde(default)]
    pub providers: ProviderConfig,

    /// Pipeline manager settings
    #[serde(default)]
    pub manager: ManagerConfig,

    /// Hybrid retrieval fusion settings
    #[serde(default)]
    pub hybrid: HybridConfig,

    /// Index database path (defaults to the cache directory)
    #[serde(default)]
    pub database: Option<PathBuf>,
}

/// Provider choices in effect for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Optional reranking of hybrid candidates (off when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reranker: Option<RerankConfig>,
}

impl ProviderConfig {
    /// Stable digest over every provider field.
    ///
    /// Any change to a model, endpoint, key or sampling parameter yields a
    /// different fingerprint.
    pub fn fingerprint(&self) -> ProviderFingerprint {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        ProviderFingerprint(*blake3::hash(&canonical).as_bytes())
    }

    /// Copy with API keys masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.embedding.api_key.is_some() {
            copy.embedding.api_key = Some("***".to_string());
        }
        if copy.generation.api_key.is_some() {
            copy.generation.api_key = Some("***".to_string());
        }
        if let Some(reranker) = copy.reranker.as_mut() {
            if reranker.api_key.is_some() {
                reranker.api_key = Some("***".to_string());
            }
        }
        copy
    }
}

/// Digest identifying a provider configuration
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderFingerprint([u8; 32]);

impl ProviderFingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex form used in logs
    pub fn short(&self) -> String {
        self.0[..6].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for ProviderFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short())
    }
}

impl std::fmt::Debug for ProviderFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProviderFingerprint({})", self.short())
    }
}

/// Embedding backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// OpenAI-compatible `/v1/embeddings` (OpenAI, vLLM, ...)
    OpenAI,
    /// Ollama `/api/embeddings`
    Ollama,
    /// In-process hashing embedder
    Local,
}

impl std::str::FromStr for EmbeddingProviderKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "local" => Ok(Self::Local),
            other => Err(RagError::Config(format!(
                "Unsupported embedding provider: {}",
                other
            ))),
        }
    }
}

/// Generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProviderKind {
    /// OpenAI-compatible `/v1/chat/completions`
    OpenAI,
    /// Ollama `/api/chat`
    Ollama,
}

impl std::str::FromStr for GenerationProviderKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(RagError::Config(format!(
                "Unsupported LLM provider: {}",
                other
            ))),
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,

    /// Model name sent to the service
    pub model: String,

    /// Base URL of the embeddings service (ignored by `local`)
    #[serde(default)]
    pub url: Option<String>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Embedding dimensions
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    /// Service URL, falling back to the provider's well-known endpoint
    pub fn base_url(&self) -> &str {
        match (&self.url, self.provider) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, EmbeddingProviderKind::OpenAI) => OPENAI_URL,
            (None, _) => OLLAMA_URL,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let provider = env_parse("RAGSERVE_EMBEDDING_PROVIDER")
            .unwrap_or(EmbeddingProviderKind::Local);
        let model = std::env::var("RAGSERVE_EMBEDDING_MODEL").unwrap_or_else(|_| match provider {
            EmbeddingProviderKind::OpenAI => "text-embedding-3-small".to_string(),
            EmbeddingProviderKind::Ollama => "nomic-embed-text".to_string(),
            EmbeddingProviderKind::Local => "local-hash".to_string(),
        });
        let dimensions = std::env::var("RAGSERVE_EMBEDDING_DIMS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(match provider {
                EmbeddingProviderKind::OpenAI => 1536,
                EmbeddingProviderKind::Ollama => 768,
                EmbeddingProviderKind::Local => default_dimensions(),
            });
        Self {
            provider,
            model,
            url: std::env::var("RAGSERVE_EMBEDDING_URL").ok(),
            api_key: match provider {
                EmbeddingProviderKind::OpenAI => std::env::var("OPENAI_API_KEY").ok(),
                _ => None,
            },
            dimensions,
            timeout_secs: default_timeout(),
        }
    }
}

/// Generation provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub provider: GenerationProviderKind,

    /// Model name for completions
    pub model: String,

    /// Base URL of the LLM service
    #[serde(default)]
    pub url: Option<String>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl GenerationConfig {
    /// Service URL, falling back to the provider's well-known endpoint
    pub fn base_url(&self) -> &str {
        match (&self.url, self.provider) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, GenerationProviderKind::OpenAI) => OPENAI_URL,
            (None, GenerationProviderKind::Ollama) => OLLAMA_URL,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let provider =
            env_parse("RAGSERVE_LLM_PROVIDER").unwrap_or(GenerationProviderKind::Ollama);
        let model = std::env::var("RAGSERVE_LLM_MODEL").unwrap_or_else(|_| match provider {
            GenerationProviderKind::OpenAI => "gpt-4o".to_string(),
            GenerationProviderKind::Ollama => "llama3".to_string(),
        });
        Self {
            provider,
            model,
            url: std::env::var("RAGSERVE_LLM_URL").ok(),
            api_key: match provider {
                GenerationProviderKind::OpenAI => std::env::var("OPENAI_API_KEY").ok(),
                GenerationProviderKind::Ollama => None,
            },
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Reranking backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankProviderKind {
    /// Cross-encoder behind a `/v1/rerank` endpoint (Jina, Cohere, vLLM, TEI)
    CrossEncoder,
    /// OpenAI-compatible chat model asked to score each passage
    #[serde(rename = "openai")]
    OpenAI,
    /// Ollama chat model asked to score each passage
    Ollama,
}

impl std::str::FromStr for RerankProviderKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "cross_encoder" => Ok(Self::CrossEncoder),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(RagError::Config(format!(
                "Unsupported reranker provider: {}",
                other
            ))),
        }
    }
}

/// Reranker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankConfig {
    pub provider: RerankProviderKind,

    /// Model name sent to the service
    #[serde(default = "default_rerank_model")]
    pub model: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Fused candidates sent to the reranker per query
    #[serde(default = "default_rerank_candidates")]
    pub max_candidates: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RerankConfig {
    pub fn new(provider: RerankProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            url: None,
            api_key: None,
            max_candidates: default_rerank_candidates(),
            timeout_secs: default_timeout(),
        }
    }

    pub fn base_url(&self) -> &str {
        match (&self.url, self.provider) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, RerankProviderKind::OpenAI) => OPENAI_URL,
            (None, RerankProviderKind::Ollama) => OLLAMA_URL,
            (None, RerankProviderKind::CrossEncoder) => RERANK_URL,
        }
    }

    /// Chat settings for the LLM scoring providers
    pub fn as_generation(&self) -> GenerationConfig {
        GenerationConfig {
            provider: match self.provider {
                RerankProviderKind::Ollama => GenerationProviderKind::Ollama,
                _ => GenerationProviderKind::OpenAI,
            },
            model: self.model.clone(),
            url: Some(self.base_url().to_string()),
            api_key: self.api_key.clone(),
            temperature: 0.0,
            max_tokens: 256,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Pipeline manager settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Upper bound on cached pipelines (unbounded when absent)
    #[serde(default)]
    pub max_pipelines: Option<usize>,

    #[serde(default = "default_retrieval_timeout")]
    pub retrieval_timeout_secs: u64,

    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,

    /// Prompt template file (uses the built-in template when absent)
    #[serde(default)]
    pub prompt_template: Option<PathBuf>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_pipelines: None,
            retrieval_timeout_secs: default_retrieval_timeout(),
            generation_timeout_secs: default_generation_timeout(),
            prompt_template: None,
        }
    }
}

/// Hybrid fusion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridConfig {
    /// RRF constant
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f64,

    #[serde(default = "default_weight")]
    pub vector_weight: f64,

    #[serde(default = "default_weight")]
    pub keyword_weight: f64,

    /// Candidates fetched per list, as a multiple of top_k
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            vector_weight: default_weight(),
            keyword_weight: default_weight(),
            candidate_multiplier: default_candidate_multiplier(),
        }
    }
}

const OPENAI_URL: &str = "https://api.openai.com";
const OLLAMA_URL: &str = "http://localhost:11434";
const RERANK_URL: &str = "http://localhost:8080";

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|v| v.parse().ok())
}

fn default_rerank_model() -> String {
    "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string()
}

fn default_rerank_candidates() -> usize {
    40
}

fn default_dimensions() -> usize {
    384
}

fn default_timeout() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    512
}

fn default_retrieval_timeout() -> u64 {
    15
}

fn default_generation_timeout() -> u64 {
    60
}

fn default_rrf_k() -> f64 {
    60.0
}

fn default_weight() -> f64 {
    1.0
}

fn default_candidate_multiplier() -> usize {
    3
}

impl Config {
    /// Load config from `RAGSERVE_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("RAGSERVE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from a path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Database path: `RAGSERVE_DB`, then config, then the cache directory
    pub fn database_path(&self) -> PathBuf {
        std::env::var("RAGSERVE_DB")
            .map(PathBuf::from)
            .ok()
            .or_else(|| self.database.clone())
            .unwrap_or_else(crate::db::Database::default_path)
    }

    fn validate(&self) -> Result<()> {
        if self.providers.embedding.dimensions == 0 {
            return Err(RagError::Config("embedding dimensions must be > 0".into()));
        }
        if self.hybrid.candidate_multiplier == 0 {
            return Err(RagError::Config(
                "hybrid candidate_multiplier must be >= 1".into(),
            ));
        }
        if self.manager.max_pipelines == Some(0) {
            return Err(RagError::Config("max_pipelines must be >= 1".into()));
        }
        if self.manager.retrieval_timeout_secs == 0 || self.manager.generation_timeout_secs == 0 {
            return Err(RagError::Config("stage timeouts must be >= 1 second".into()));
        }
        if !self.hybrid.rrf_k.is_finite() || self.hybrid.rrf_k < 0.0 {
            return Err(RagError::Config("hybrid rrf_k must be a finite value >= 0".into()));
        }
        for (name, weight) in [
            ("vector_weight", self.hybrid.vector_weight),
            ("keyword_weight", self.hybrid.keyword_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RagError::Config(format!(
                    "hybrid {} must be a finite value >= 0",
                    name
                )));
            }
        }
        if let Some(reranker) = &self.providers.reranker {
            if reranker.max_candidates == 0 {
                return Err(RagError::Config(
                    "reranker max_candidates must be >= 1".into(),
                ));
            }
        }
        Ok(())
    }
}
