//! Configuration management for Multichat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Main configuration structure for Multichat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP binding settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Session and file storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Context assembly limits
    #[serde(default)]
    pub context: ContextConfig,
    /// Per-provider adapter settings
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path; the platform data directory is used when unset
    #[serde(default)]
    pub db_path: Option<String>,
}

/// Context assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum number of file references accepted per message
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_max_files() -> usize {
    20
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
        }
    }
}

/// Settings for every known provider adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Google Gemini
    #[serde(default = "default_gemini")]
    pub gemini: ApiProviderConfig,
    /// Anthropic Claude
    #[serde(default)]
    pub claude: ClaudeConfig,
    /// OpenAI chat completions
    #[serde(default = "default_gpt")]
    pub gpt: ApiProviderConfig,
    /// Llama models served by Ollama
    #[serde(default)]
    pub llama: OllamaConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            gemini: default_gemini(),
            claude: ClaudeConfig::default(),
            gpt: default_gpt(),
            llama: OllamaConfig::default(),
        }
    }
}

/// Configuration shared by key-authenticated HTTP providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiProviderConfig {
    /// Register this provider at startup
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Model identifier sent to the API
    pub model: String,

    /// API key; usually supplied through the environment
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Optional API base URL (useful for tests and local mocks)
    #[serde(default)]
    pub api_base: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_api_timeout() -> u64 {
    60
}

fn default_gemini() -> ApiProviderConfig {
    ApiProviderConfig {
        enabled: true,
        model: "gemini-pro".to_string(),
        api_key: None,
        api_base: None,
        timeout_seconds: default_api_timeout(),
    }
}

fn default_gpt() -> ApiProviderConfig {
    ApiProviderConfig {
        enabled: true,
        model: "gpt-4".to_string(),
        api_key: None,
        api_base: None,
        timeout_seconds: default_api_timeout(),
    }
}

/// Anthropic provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    /// Common API settings
    #[serde(flatten)]
    pub api: ApiProviderConfig,

    /// Upper bound on generated tokens
    #[serde(default = "default_claude_max_tokens")]
    pub max_tokens: u32,
}

fn default_claude_max_tokens() -> u32 {
    1000
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api: ApiProviderConfig {
                enabled: true,
                model: "claude-3-sonnet-20240229".to_string(),
                api_key: None,
                api_base: None,
                timeout_seconds: default_api_timeout(),
            },
            max_tokens: default_claude_max_tokens(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Register this provider at startup
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_ollama_timeout")]
    pub timeout_seconds: u64,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_timeout() -> u64 {
    120
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_ollama_host(),
            model: default_ollama_model(),
            timeout_seconds: default_ollama_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(bind) = std::env::var("MULTICHAT_BIND") {
            self.server.bind = bind;
        }

        if let Ok(db_path) = std::env::var("MULTICHAT_DB") {
            self.storage.db_path = Some(db_path);
        }

        // API keys keep the names the provider SDKs conventionally read
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.providers.gemini.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.providers.claude.api.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.providers.gpt.api_key = Some(key);
        }
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            self.providers.llama.host = host;
        }

        if let Ok(model) = std::env::var("MULTICHAT_GEMINI_MODEL") {
            tracing::debug!(model = %model, "Env override: MULTICHAT_GEMINI_MODEL");
            self.providers.gemini.model = model;
        }
        if let Ok(model) = std::env::var("MULTICHAT_CLAUDE_MODEL") {
            tracing::debug!(model = %model, "Env override: MULTICHAT_CLAUDE_MODEL");
            self.providers.claude.api.model = model;
        }
        if let Ok(model) = std::env::var("MULTICHAT_GPT_MODEL") {
            tracing::debug!(model = %model, "Env override: MULTICHAT_GPT_MODEL");
            self.providers.gpt.model = model;
        }
        if let Ok(model) = std::env::var("MULTICHAT_LLAMA_MODEL") {
            tracing::debug!(model = %model, "Env override: MULTICHAT_LLAMA_MODEL");
            self.providers.llama.model = model;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(db_path) = &cli.db {
            tracing::debug!("Using storage DB override from CLI: {}", db_path);
            self.storage.db_path = Some(db_path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a [`ChatError::Config`] describing the first failing check
    pub fn validate(&self) -> Result<()> {
        self.server.bind.parse::<SocketAddr>().map_err(|e| {
            ChatError::Config(format!("Invalid server.bind '{}': {}", self.server.bind, e))
        })?;

        if self.context.max_files == 0 {
            return Err(
                ChatError::Config("context.max_files must be greater than 0".to_string()).into(),
            );
        }

        let p = &self.providers;
        if !(p.gemini.enabled || p.claude.api.enabled || p.gpt.enabled || p.llama.enabled) {
            return Err(ChatError::Config("At least one provider must be enabled".to_string()).into());
        }

        validate_api_provider("gemini", &p.gemini)?;
        validate_api_provider("claude", &p.claude.api)?;
        validate_api_provider("gpt", &p.gpt)?;

        if p.claude.max_tokens == 0 {
            return Err(ChatError::Config(
                "providers.claude.max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if p.llama.timeout_seconds == 0 {
            return Err(ChatError::Config(
                "providers.llama.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }
        validate_url("providers.llama.host", &p.llama.host)?;

        Ok(())
    }
}

fn validate_api_provider(key: &str, config: &ApiProviderConfig) -> Result<()> {
    if config.model.trim().is_empty() {
        return Err(ChatError::Config(format!("providers.{}.model cannot be empty", key)).into());
    }
    if config.timeout_seconds == 0 {
        return Err(ChatError::Config(format!(
            "providers.{}.timeout_seconds must be greater than 0",
            key
        ))
        .into());
    }
    if let Some(base) = &config.api_base {
        validate_url(&format!("providers.{}.api_base", key), base)?;
    }
    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ChatError::Config(format!("Invalid {} '{}': {}", field, value, e)).into())
}
