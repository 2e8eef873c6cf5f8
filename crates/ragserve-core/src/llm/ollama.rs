//! Ollama HTTP client

use super::client::{build_http_client, check_status, ChatMessage, LLMClient};
use crate::config::{EmbeddingConfig, GenerationConfig};
use crate::error::{RagError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

/// Parallel embedding requests per batch (Ollama embeds one text per call)
const EMBED_CONCURRENCY: usize = 4;

/// Client for a local or remote Ollama server
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    embedding_dimensions: usize,
}

impl OllamaClient {
    pub fn for_generation(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            base_url: config.base_url().to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            embedding_dimensions: 0,
        })
    }

    pub fn for_embedding(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            base_url: config.base_url().to_string(),
            model: config.model.clone(),
            temperature: 0.0,
            max_tokens: 0,
            embedding_dimensions: config.dimensions,
        })
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await?;
        let response = check_status(response, "Ollama embeddings").await?;
        let body: EmbedResponse = response.json().await?;

        if body.embedding.is_empty() {
            return Err(RagError::Provider("Ollama returned an empty embedding".into()));
        }
        Ok(body.embedding)
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        #[derive(Serialize)]
        struct Options {
            temperature: f32,
            num_predict: u32,
        }

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            stream: bool,
            options: Options,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            message: ChatMessage,
        }

        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: Options {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self.http_client.post(&url).json(&request).send().await?;
        let response = check_status(response, "Ollama").await?;
        let body: ChatResponse = response.json().await?;
        Ok(body.message.content)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        stream::iter(texts.to_vec())
            .map(|text| async move { self.embed_one(&text).await })
            .buffered(EMBED_CONCURRENCY)
            .try_collect()
            .await
    }

    fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
