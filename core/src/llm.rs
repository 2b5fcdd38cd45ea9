use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::models::{
    OllamaChatRequest, OllamaChatResponse, OllamaGenerateRequest, OllamaGenerateResponse,
    OllamaMessage, OllamaOptions,
};

/// Generative model boundary: one synchronous completion per call, no
/// streaming, no retry. Chat takes role-tagged turns; generate takes a
/// single instruction prompt.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn chat(&self, messages: &[OllamaMessage], temperature: f32) -> Result<String>;
    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String>;
}

/// Client for a locally hosted Ollama model. Every request is bounded by
/// the configured timeout on the underlying HTTP client.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.ollama_url.clone(),
            model: config.chat_model.clone(),
        })
    }
}

#[async_trait]
impl GenerativeModel for OllamaClient {
    async fn chat(&self, messages: &[OllamaMessage], temperature: f32) -> Result<String> {
        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            stream: false,
            options: OllamaOptions {
                temperature,
                num_predict: None,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Ollama chat error: {}", error_text));
        }

        let parsed: OllamaChatResponse = response.json().await?;
        Ok(parsed.message.content)
    }

    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String> {
        let request = OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature,
                num_predict: Some(max_tokens),
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Ollama generate error: {}", error_text));
        }

        let parsed: OllamaGenerateResponse = response.json().await?;
        Ok(parsed.response)
    }
}
