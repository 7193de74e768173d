//! Base provider trait and shared HTTP plumbing for Multichat
//!
//! This module defines the Provider trait every LLM adapter implements,
//! along with helpers that turn transport and decoding failures into
//! [`ChatError::Upstream`].

use crate::error::{ChatError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Provider trait for LLM backends
///
/// An adapter hides its backend's authentication, request envelope and
/// response nesting behind one call. Adapters receive a fully assembled
/// prompt; they never resolve files or build prompts themselves.
///
/// # Examples
///
/// ```
/// use multichat::providers::Provider;
/// use multichat::error::Result;
/// use async_trait::async_trait;
///
/// struct Echo;
///
/// #[async_trait]
/// impl Provider for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn model(&self) -> &str {
///         "echo-1"
///     }
///
///     async fn generate(&self, prompt: &str) -> Result<String> {
///         Ok(prompt.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry key of this provider (e.g. "claude")
    fn name(&self) -> &str;

    /// Model identifier sent upstream
    fn model(&self) -> &str;

    /// Generate a completion for a single prompt
    ///
    /// One attempt is made; nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Upstream`] when the remote call errors, times
    /// out, or returns an unusable shape, and
    /// [`ChatError::MissingCredentials`] when no API key is configured.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Build the HTTP client an adapter owns
pub(crate) fn build_client(provider: &str, timeout_seconds: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("multichat/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            ChatError::upstream(provider, format!("Failed to create HTTP client: {}", e)).into()
        })
}

/// Join an API base and a path without doubling slashes
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Require an API key, failing before any request is sent
pub(crate) fn require_key<'a>(provider: &str, key: Option<&'a str>) -> Result<&'a str> {
    key.filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ChatError::MissingCredentials(provider.to_string()).into())
}

/// Send a prepared request and decode a successful JSON body
///
/// Transport errors, timeouts, non-2xx statuses and undecodable bodies all
/// become [`ChatError::Upstream`] for `provider`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request.send().await.map_err(|e| {
        tracing::error!("{} request failed: {}", provider, e);
        let detail = if e.is_timeout() {
            "request timed out".to_string()
        } else {
            format!("request failed: {}", e)
        };
        ChatError::upstream(provider, detail)
    })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!("{} returned error {}: {}", provider, status, error_text);
        return Err(ChatError::upstream(
            provider,
            format!("returned error {}: {}", status, error_text),
        )
        .into());
    }

    response.json::<T>().await.map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", provider, e);
        ChatError::upstream(provider, format!("unparseable response: {}", e)).into()
    })
}

/// Reject an empty completion
pub(crate) fn non_empty(provider: &str, text: Option<String>) -> Result<String> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ChatError::upstream(provider, "response contained no text").into()),
    }
}
