//! Anthropic Claude provider implementation for Multichat
//!
//! Talks to the Anthropic Messages API and unwraps the first text block of
//! the response.

use crate::config::ClaudeConfig;
use crate::error::Result;
use crate::providers::base::{build_client, endpoint, non_empty, require_key, send_json};
use crate::providers::Provider;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider
pub struct ClaudeProvider {
    client: Client,
    config: ClaudeConfig,
}

/// Messages API request payload
#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Minimal subset of the Messages API response
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ClaudeProvider {
    /// Create a new Claude provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use multichat::config::ClaudeConfig;
    /// use multichat::providers::{ClaudeProvider, Provider};
    ///
    /// let provider = ClaudeProvider::new(ClaudeConfig::default()).unwrap();
    /// assert_eq!(provider.name(), "claude");
    /// ```
    pub fn new(config: ClaudeConfig) -> Result<Self> {
        let client = build_client(super::CLAUDE, config.api.timeout_seconds)?;

        tracing::info!(
            "Initialized Claude provider: model={}, max_tokens={}",
            config.api.model,
            config.max_tokens
        );

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        endpoint(
            self.config.api.api_base.as_deref().unwrap_or(DEFAULT_BASE_URL),
            MESSAGES_PATH,
        )
    }

    fn unwrap_response(response: ClaudeResponse) -> Option<String> {
        response
            .content
            .into_iter()
            .find(|block| block.kind == "text" || block.kind.is_empty())
            .and_then(|block| block.text)
    }
}

#[async_trait]
impl Provider for ClaudeProvider {
    fn name(&self) -> &str {
        super::CLAUDE
    }

    fn model(&self) -> &str {
        &self.config.api.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = require_key(super::CLAUDE, self.config.api.api_key.as_deref())?;

        let request = ClaudeRequest {
            model: &self.config.api.model,
            max_tokens: self.config.max_tokens,
            messages: vec![ClaudeMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(
            "Sending Claude request: model={}, prompt_chars={}",
            request.model,
            prompt.len()
        );

        let response: ClaudeResponse = send_json(
            super::CLAUDE,
            self.client
                .post(self.url())
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_API_VERSION)
                .json(&request),
        )
        .await?;

        non_empty(super::CLAUDE, Self::unwrap_response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_response_picks_first_text_block() {
        let json = r#"{
            "id": "msg_1",
            "content": [
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "Hello there"},
                {"type": "text", "text": "ignored"}
            ]
        }"#;
        let response: ClaudeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            ClaudeProvider::unwrap_response(response),
            Some("Hello there".to_string())
        );
    }

    #[test]
    fn test_unwrap_response_empty_content() {
        let response: ClaudeResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert_eq!(ClaudeProvider::unwrap_response(response), None);
    }

    #[test]
    fn test_url_uses_override() {
        let mut config = ClaudeConfig::default();
        config.api.api_base = Some("http://127.0.0.1:9000/".to_string());
        let provider = ClaudeProvider::new(config).unwrap();
        assert_eq!(provider.url(), "http://127.0.0.1:9000/v1/messages");
    }

    #[test]
    fn test_request_shape() {
        let request = ClaudeRequest {
            model: "claude-3-sonnet-20240229",
            max_tokens: 1000,
            messages: vec![ClaudeMessage {
                role: "user",
                content: "Hi",
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["max_tokens"], 1000);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "Hi");
    }

    #[tokio::test]
    async fn test_generate_without_key_fails_before_network() {
        let mut config = ClaudeConfig::default();
        // Unroutable base; a request would error differently
        config.api.api_base = Some("http://127.0.0.1:1".to_string());
        let provider = ClaudeProvider::new(config).unwrap();
        let err = provider.generate("Hi").await.unwrap_err();
        assert!(err.to_string().contains("Missing credentials"));
    }
}
