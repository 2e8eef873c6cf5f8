//! Passage rerankers
//!
//! Two backends score fused hybrid candidates against the question:
//! - [`CrossEncoderReranker`] calls a `/v1/rerank` endpoint (Jina, Cohere,
//!   vLLM and text-embeddings-inference all accept this shape)
//! - [`LlmReranker`] asks a chat model for a relevance score per passage

use super::client::{build_http_client, check_status};
use super::{ChatMessage, LLMClient, RerankDocument, RerankResult, Reranker};
use crate::config::RerankConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Characters of each passage shown to the LLM scorer
const LLM_SNIPPET_CHARS: usize = 400;

/// Score used when the LLM scorer gives no usable value
const NEUTRAL_SCORE: f64 = 0.5;

/// Cross-encoder served over HTTP
pub struct CrossEncoderReranker {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl CrossEncoderReranker {
    pub fn from_config(config: &RerankConfig) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Reranker for CrossEncoderReranker {
    async fn rerank(&self, query: &str, documents: &[RerankDocument]) -> Result<Vec<RerankResult>> {
        #[derive(Serialize)]
        struct RerankRequest<'a> {
            model: &'a str,
            query: &'a str,
            documents: Vec<&'a str>,
            return_documents: bool,
        }

        #[derive(Deserialize)]
        struct RerankResponse {
            results: Vec<Scored>,
        }

        #[derive(Deserialize)]
        struct Scored {
            index: usize,
            relevance_score: f64,
        }

        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let request = RerankRequest {
            model: &self.model,
            query,
            documents: documents.iter().map(|d| d.text.as_str()).collect(),
            return_documents: false,
        };
        let url = format!("{}/v1/rerank", self.base_url);
        let mut builder = self.http_client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = check_status(builder.send().await?, "Rerank service").await?;
        let body: RerankResponse = response.json().await?;

        Ok(body
            .results
            .into_iter()
            .filter_map(|scored| match documents.get(scored.index) {
                Some(doc) => Some(RerankResult {
                    id: doc.id.clone(),
                    score: scored.relevance_score,
                }),
                None => {
                    tracing::warn!(index = scored.index, "rerank service returned unknown index");
                    None
                }
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Chat model used as a relevance scorer
pub struct LlmReranker {
    client: Arc<dyn LLMClient>,
}

impl LlmReranker {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Reranker for LlmReranker {
    async fn rerank(&self, query: &str, documents: &[RerankDocument]) -> Result<Vec<RerankResult>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let messages = vec![
            ChatMessage::system(
                "Score how well each passage answers the question. \
                 Reply with JSON only: {\"scores\": [0.0-1.0, ...]} in passage order.",
            ),
            ChatMessage::user(scoring_prompt(query, documents)),
        ];
        let reply = self.client.chat_completion(messages).await?;
        Ok(parse_scores(&reply, documents))
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }
}

fn scoring_prompt(query: &str, documents: &[RerankDocument]) -> String {
    let mut prompt = format!("Question: {}\nPassages:\n", query.trim());
    for (i, doc) in documents.iter().enumerate() {
        let snippet: String = doc.text.chars().take(LLM_SNIPPET_CHARS).collect();
        prompt.push_str(&format!("[{}] {}\n", i, snippet.replace('\n', " ")));
    }
    prompt
}

/// Read `{"scores": [...]}` by position; unusable replies score neutrally
fn parse_scores(reply: &str, documents: &[RerankDocument]) -> Vec<RerankResult> {
    let scores = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<serde_json::Value>(&reply[start..=end])
                .ok()
                .and_then(|json| json["scores"].as_array().cloned())
        }
        _ => None,
    };
    if scores.is_none() {
        tracing::warn!("reranker reply had no scores, keeping fused order");
    }
    let scores = scores.unwrap_or_default();

    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| RerankResult {
            id: doc.id.clone(),
            score: scores
                .get(i)
                .and_then(|v| v.as_f64())
                .map(|s| s.clamp(0.0, 1.0))
                .unwrap_or(NEUTRAL_SCORE),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RerankProviderKind;

    fn docs(ids: &[&str]) -> Vec<RerankDocument> {
        ids.iter()
            .map(|id| RerankDocument {
                id: id.to_string(),
                text: format!("text of {}", id),
            })
            .collect()
    }

    #[test]
    fn test_parse_scores_by_position() {
        let reply = "Sure! {\"scores\": [0.2, 0.9, 1.7]}";
        let results = parse_scores(reply, &docs(&["a", "b", "c"]));
        assert_eq!(results[0].score, 0.2);
        assert_eq!(results[1].score, 0.9);
        assert_eq!(results[2].score, 1.0);
    }

    #[test]
    fn test_unparseable_reply_scores_neutrally() {
        let results = parse_scores("I cannot help with that", &docs(&["a", "b"]));
        assert!(results.iter().all(|r| r.score == NEUTRAL_SCORE));

        let results = parse_scores("{\"scores\": [0.3]}", &docs(&["a", "b"]));
        assert_eq!(results[0].score, 0.3);
        assert_eq!(results[1].score, NEUTRAL_SCORE);
    }

    #[test]
    fn test_scoring_prompt_truncates_on_char_boundaries() {
        let long = RerankDocument {
            id: "long".into(),
            text: "é".repeat(LLM_SNIPPET_CHARS + 50),
        };
        let prompt = scoring_prompt("q", &[long]);
        assert_eq!(prompt.matches('é').count(), LLM_SNIPPET_CHARS);
    }

    #[tokio::test]
    async fn test_cross_encoder_skips_empty_input_and_reports_unreachable_service() {
        let mut config = RerankConfig::new(RerankProviderKind::CrossEncoder, "bge-reranker-base");
        config.url = Some("http://127.0.0.1:9".into());
        config.timeout_secs = 2;
        let reranker = CrossEncoderReranker::from_config(&config).unwrap();

        assert!(reranker.rerank("q", &[]).await.unwrap().is_empty());
        assert!(reranker.rerank("q", &docs(&["a"])).await.is_err());
        assert_eq!(reranker.model_name(), "bge-reranker-base");
    }
}
