//! Provider module for Multichat
//!
//! This module contains the provider abstraction, one adapter per LLM
//! backend, and the dispatch registry that maps provider keys to adapters.

pub mod base;
pub mod claude;
pub mod gemini;
pub mod ollama;
pub mod openai;

pub use base::Provider;
pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::config::ProvidersConfig;
use crate::error::{ChatError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Provider key for Google Gemini
pub const GEMINI: &str = "gemini";
/// Provider key for Anthropic Claude
pub const CLAUDE: &str = "claude";
/// Provider key for OpenAI chat completions
pub const GPT: &str = "gpt";
/// Provider key for Llama models served by Ollama
pub const LLAMA: &str = "llama";

/// Every provider key with a built-in adapter
pub const KNOWN_PROVIDERS: &[&str] = &[GEMINI, CLAUDE, GPT, LLAMA];

/// Create a provider instance for a known key
///
/// # Arguments
///
/// * `key` - Provider key ("gemini", "claude", "gpt" or "llama")
/// * `config` - Provider configuration
///
/// # Errors
///
/// Returns error if the key is unknown or initialization fails
pub fn create_provider(key: &str, config: &ProvidersConfig) -> Result<Arc<dyn Provider>> {
    match key {
        GEMINI => Ok(Arc::new(GeminiProvider::new(config.gemini.clone())?)),
        CLAUDE => Ok(Arc::new(ClaudeProvider::new(config.claude.clone())?)),
        GPT => Ok(Arc::new(OpenAiProvider::new(config.gpt.clone())?)),
        LLAMA => Ok(Arc::new(OllamaProvider::new(config.llama.clone())?)),
        _ => Err(ChatError::UnknownProvider(key.to_string()).into()),
    }
}

/// Capability-indexed registry of provider adapters
///
/// Populated once at startup and read-only afterwards; share it as
/// `Arc<ProviderRegistry>`.
///
/// # Examples
///
/// ```
/// use multichat::config::ProvidersConfig;
/// use multichat::providers::ProviderRegistry;
///
/// let registry = ProviderRegistry::from_config(&ProvidersConfig::default()).unwrap();
/// assert!(registry.contains("claude"));
/// assert!(!registry.contains("not-a-real-provider"));
/// ```
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding every enabled provider
    ///
    /// # Errors
    ///
    /// Returns error if an adapter cannot be constructed
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let enabled = [
            (GEMINI, config.gemini.enabled),
            (CLAUDE, config.claude.api.enabled),
            (GPT, config.gpt.enabled),
            (LLAMA, config.llama.enabled),
        ];

        let mut registry = Self::new();
        for (key, _) in enabled.iter().filter(|(_, on)| *on) {
            registry.register(create_provider(key, config)?);
        }

        tracing::info!("Registered providers: {}", registry.keys().join(", "));
        Ok(registry)
    }

    /// Register an adapter under its own name, replacing any previous one
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let key = provider.name().to_string();
        if self.providers.insert(key.clone(), provider).is_some() {
            tracing::warn!("Replaced provider adapter for key '{}'", key);
        }
    }

    /// Check whether a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.providers.contains_key(key)
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.providers.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Look up the adapter for a key
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::UnknownProvider`] for an unregistered key
    pub fn get(&self, key: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .get(key)
            .cloned()
            .ok_or_else(|| ChatError::UnknownProvider(key.to_string()).into())
    }

    /// Route a prompt to the adapter registered under `key`
    ///
    /// Upstream errors from the adapter are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::UnknownProvider`] for an unregistered key, or
    /// whatever the adapter's `generate` fails with
    pub async fn dispatch(&self, key: &str, prompt: &str) -> Result<String> {
        let provider = self.get(key)?;

        tracing::info!(
            provider = key,
            model = provider.model(),
            "Dispatching prompt"
        );

        provider.generate(prompt).await
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.keys())
            .finish()
    }
}
