//! Completion-service boundary.
//!
//! The pipeline only ever needs one shape of call: prompt in, text out, with
//! a temperature and an output cap. Everything downstream is written against
//! the [`CompletionClient`] trait so tests can inject a stub and replay runs
//! without a live model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};

/// Per-call sampling options.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    /// Cap on generated tokens.
    pub max_tokens: u32,
}

impl CompletionOptions {
    /// Conversational agent replies.
    pub fn chat() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 600,
        }
    }

    /// Structure planning wants near-deterministic, short output.
    pub fn planning() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 800,
        }
    }

    /// File-content generation allows some creativity and long output.
    pub fn file_generation() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 3000,
        }
    }
}

/// Opaque text-completion service: prompt in, text out, fallible.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> ChatResult<String>;
}

/// Connection settings for the Ollama adapter.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    /// Bound on every completion call; exceeding it is an ordinary failure.
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:1b".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Completion client backed by a local Ollama server.
pub struct OllamaClient {
    config: CompletionConfig,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: CompletionConfig) -> ChatResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Completion(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> ChatResult<String> {
        let url = format!("{}/api/chat", self.config.base_url);

        let request = OllamaRequest {
            model: self.config.model.clone(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Completion(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Completion(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Completion(format!("Failed to parse response: {}", e)))?;

        if result.message.content.trim().is_empty() {
            return Err(ChatError::Completion("Empty completion output".to_string()));
        }

        Ok(result.message.content)
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}
