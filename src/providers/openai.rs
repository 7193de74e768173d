//! OpenAI chat completions provider implementation for Multichat
//!
//! Registered under the `gpt` key.

use crate::config::ApiProviderConfig;
use crate::error::Result;
use crate::providers::base::{build_client, endpoint, non_empty, require_key, send_json};
use crate::providers::Provider;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// OpenAI chat completions provider
pub struct OpenAiProvider {
    client: Client,
    config: ApiProviderConfig,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: ApiProviderConfig) -> Result<Self> {
        let client = build_client(super::GPT, config.timeout_seconds)?;

        tracing::info!("Initialized OpenAI provider: model={}", config.model);

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        endpoint(
            self.config.api_base.as_deref().unwrap_or(DEFAULT_BASE_URL),
            COMPLETIONS_PATH,
        )
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        super::GPT
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = require_key(super::GPT, self.config.api_key.as_deref())?;

        let request = CompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(
            "Sending OpenAI request: model={}, prompt_chars={}",
            self.config.model,
            prompt.len()
        );

        let response: CompletionResponse = send_json(
            super::GPT,
            self.client
                .post(self.url())
                .bearer_auth(api_key)
                .json(&request),
        )
        .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        non_empty(super::GPT, text)
    }
}
