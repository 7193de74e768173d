//! Ollama provider implementation for Multichat
//!
//! This module implements the Provider trait for Ollama, connecting to a local
//! or remote Ollama server that serves the Llama family of models. Ollama
//! needs no API key.

use crate::config::OllamaConfig;
use crate::error::Result;
use crate::providers::base::{build_client, endpoint, non_empty, send_json};
use crate::providers::Provider;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Ollama API provider
///
/// # Examples
///
/// ```
/// use multichat::config::OllamaConfig;
/// use multichat::providers::{OllamaProvider, Provider};
///
/// let provider = OllamaProvider::new(OllamaConfig::default()).unwrap();
/// assert_eq!(provider.host(), "http://localhost:11434");
/// assert_eq!(provider.model(), "llama3.2:latest");
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

/// Message structure for Ollama API
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
}

/// Response structure from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = build_client(super::LLAMA, config.timeout_seconds)?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Get the configured Ollama host
    pub fn host(&self) -> &str {
        &self.config.host
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        super::LLAMA
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: &self.config.model,
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        };

        tracing::debug!(
            "Sending Ollama request: model={}, prompt_chars={}",
            self.config.model,
            prompt.len()
        );

        let response: OllamaResponse = send_json(
            super::LLAMA,
            self.client
                .post(endpoint(&self.config.host, "/api/chat"))
                .json(&request),
        )
        .await?;

        tracing::debug!(
            "Ollama response: done={}, prompt_tokens={}, completion_tokens={}",
            response.done,
            response.prompt_eval_count,
            response.eval_count
        );

        non_empty(super::LLAMA, Some(response.message.content))
    }
}
