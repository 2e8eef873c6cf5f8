//! HTTP client for OpenAI-compatible services (OpenAI, vLLM, etc.)

use super::cache::{embedding_cache_key, EmbeddingCache};
use crate::config::{EmbeddingConfig, GenerationConfig};
use crate::error::{RagError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for LLM service clients
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Generate embeddings for text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Provider("No embedding returned".to_string()))
    }

    /// Generate embeddings for multiple texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn embedding_dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// OpenAI-compatible client
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    embedding_dimensions: usize,
    cache: Arc<EmbeddingCache>,
}

impl OpenAIClient {
    /// Client for chat completions
    pub fn for_generation(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            embedding_dimensions: 0,
            cache: Arc::new(EmbeddingCache::new()),
        })
    }

    /// Client for embeddings
    pub fn for_embedding(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: 0.0,
            max_tokens: 0,
            embedding_dimensions: config.dimensions,
            cache: Arc::new(EmbeddingCache::new()),
        })
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref api_key) => req.header("Authorization", format!("Bearer {}", api_key)),
            None => req,
        }
    }
}

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(RagError::Http)
}

/// Turn a non-2xx response into a provider error
pub(crate) async fn check_status(
    response: reqwest::Response,
    service: &str,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(RagError::Provider(format!(
        "{} error (HTTP {}): {}",
        service, status, body
    )))
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessage,
        }

        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .authorized(self.http_client.post(&url).json(&request))
            .send()
            .await?;
        let response = check_status(response, "LLM service").await?;
        let chat_response: ChatResponse = response.json().await?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Provider("No response from LLM".to_string()))?
            .message
            .content;

        tracing::debug!(
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "chat completion finished"
        );

        Ok(content)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: Vec<String>,
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedData>,
        }

        #[derive(Deserialize)]
        struct EmbedData {
            embedding: Vec<f32>,
        }

        // Check cache for each text
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut uncached_texts = Vec::new();
        let mut uncached_indices = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match self.cache.get(&embedding_cache_key(&self.model, text)).await {
                Some(embedding) => results.push(Some(embedding)),
                None => {
                    results.push(None);
                    uncached_texts.push(text.clone());
                    uncached_indices.push(i);
                }
            }
        }

        if !uncached_texts.is_empty() {
            tracing::debug!(
                "Embedding batch: {} cached, {} to fetch",
                texts.len() - uncached_texts.len(),
                uncached_texts.len()
            );

            let request = EmbedRequest {
                model: &self.model,
                input: uncached_texts.clone(),
            };

            let url = format!("{}/v1/embeddings", self.base_url);
            let response = self
                .authorized(self.http_client.post(&url).json(&request))
                .send()
                .await?;
            let response = check_status(response, "Embedding service").await?;
            let embed_response: EmbedResponse = response.json().await?;

            if embed_response.data.len() != uncached_texts.len() {
                return Err(RagError::Provider(format!(
                    "Embedding service returned {} vectors for {} inputs",
                    embed_response.data.len(),
                    uncached_texts.len()
                )));
            }

            for (i, data) in embed_response.data.into_iter().enumerate() {
                self.cache
                    .insert(
                        embedding_cache_key(&self.model, &uncached_texts[i]),
                        data.embedding.clone(),
                    )
                    .await;
                results[uncached_indices[i]] = Some(data.embedding);
            }
        }

        Ok(results.into_iter().flatten().collect())
    }

    fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationProviderKind;

    #[test]
    fn test_chat_message_roles() {
        assert_eq!(ChatMessage::system("x").role, "system");
        assert_eq!(ChatMessage::user("y").role, "user");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let config = GenerationConfig {
            provider: GenerationProviderKind::OpenAI,
            model: "gpt-4o".into(),
            url: Some("http://127.0.0.1:9".into()),
            api_key: None,
            temperature: 0.0,
            max_tokens: 16,
            timeout_secs: 2,
        };
        let client = OpenAIClient::for_generation(&config).unwrap();
        let result = client.chat_completion(vec![ChatMessage::user("hi")]).await;
        assert!(matches!(result, Err(RagError::Http(_))));
    }
}
