use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::models::{OllamaEmbeddingsRequest, OllamaEmbeddingsResponse};

/// Text → fixed-length vector. The same embedder instance must serve both
/// indexing and querying within a session; mixing models would silently
/// corrupt nearest-neighbor results.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn model_name(&self) -> &str;
}

/// Embeddings from a local Ollama instance via `POST /api/embeddings`.
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.ollama_url.clone(),
            model: config.embedding_model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = OllamaEmbeddingsRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Ollama embeddings error: {}", error_text));
        }

        let parsed: OllamaEmbeddingsResponse = response.json().await?;
        if parsed.embedding.is_empty() {
            return Err(anyhow!("Ollama returned an empty embedding"));
        }
        Ok(parsed.embedding)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
