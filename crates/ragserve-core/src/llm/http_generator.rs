//! HTTP-based answer generator using external LLM service

use super::{ChatMessage, Generator, LLMClient};
use crate::error::{RagError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Generator that sends the composed prompt as a single user turn
pub struct HttpGenerator {
    client: Arc<dyn LLMClient>,
}

impl HttpGenerator {
    /// Create from LLM client
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let reply = self
            .client
            .chat_completion(vec![ChatMessage::user(prompt)])
            .await?;

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(RagError::Provider(format!(
                "{} returned an empty completion",
                self.client.model_name()
            )));
        }
        Ok(reply.to_string())
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }
}
