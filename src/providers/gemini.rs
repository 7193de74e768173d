//! Google Gemini provider implementation for Multichat
//!
//! Calls the Generative Language API `generateContent` endpoint and joins
//! the text parts of the first candidate.

use crate::config::ApiProviderConfig;
use crate::error::Result;
use crate::providers::base::{build_client, endpoint, non_empty, require_key, send_json};
use crate::providers::Provider;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini API provider
pub struct GeminiProvider {
    client: Client,
    config: ApiProviderConfig,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiProvider {
    /// Create a new Gemini provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: ApiProviderConfig) -> Result<Self> {
        let client = build_client(super::GEMINI, config.timeout_seconds)?;

        tracing::info!("Initialized Gemini provider: model={}", config.model);

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        endpoint(
            self.config.api_base.as_deref().unwrap_or(DEFAULT_BASE_URL),
            &format!("/v1beta/models/{}:generateContent", self.config.model),
        )
    }

    /// Join the text parts of the first candidate
    fn unwrap_response(response: GeminiResponse) -> Option<String> {
        let parts = response.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        Some(text)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        super::GEMINI
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = require_key(super::GEMINI, self.config.api_key.as_deref())?;

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        tracing::debug!(
            "Sending Gemini request: model={}, prompt_chars={}",
            self.config.model,
            prompt.len()
        );

        let response: GeminiResponse = send_json(
            super::GEMINI,
            self.client
                .post(self.url())
                .header("x-goog-api-key", api_key)
                .json(&request),
        )
        .await?;

        non_empty(super::GEMINI, Self::unwrap_response(response))
    }
}
