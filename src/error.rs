//! Error types for Multichat
//!
//! This module defines the error taxonomy used across the chat core,
//! using `thiserror` for the typed variants and `anyhow` for propagation.
//! Callers that need to tell "your input was bad" apart from "the system
//! failed" downcast to [`ChatError`] and inspect [`ChatError::kind`].

use serde::Serialize;
use thiserror::Error;

/// Main error type for Multichat operations
#[derive(Error, Debug)]
pub enum ChatError {
    /// Missing or malformed caller input; nothing was touched
    #[error("Validation error: {0}")]
    Validation(String),

    /// Provider key not present in the dispatch registry
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Provider call failed, timed out, or returned an unusable payload
    #[error("Upstream error from {provider}: {detail}")]
    Upstream {
        /// Provider key that failed
        provider: String,
        /// What went wrong
        detail: String,
    },

    /// Provider is registered but has no API key configured
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Session identifier did not resolve
    #[error("Chat session not found: {0}")]
    SessionNotFound(String),

    /// File identifier did not resolve in the file store
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Session or file store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification of a failure, stable across error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    UnknownProvider,
    /// Soft: some attached files could not be resolved
    ContextPartialFailure,
    Upstream,
    SessionNotFound,
    FileNotFound,
    Storage,
    Config,
    Internal,
}

impl ErrorKind {
    /// Snake-case name used in wire payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::UnknownProvider => "unknown_provider",
            Self::ContextPartialFailure => "context_partial_failure",
            Self::Upstream => "upstream",
            Self::SessionNotFound => "session_not_found",
            Self::FileNotFound => "file_not_found",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }

    /// Whether the failure was caused by the caller rather than the system
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Validation | Self::UnknownProvider | Self::SessionNotFound | Self::FileNotFound
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ChatError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::UnknownProvider(_) => ErrorKind::UnknownProvider,
            Self::Upstream { .. } | Self::MissingCredentials(_) | Self::Http(_) => {
                ErrorKind::Upstream
            }
            Self::SessionNotFound(_) => ErrorKind::SessionNotFound,
            Self::FileNotFound(_) => ErrorKind::FileNotFound,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Config(_) | Self::Yaml(_) => ErrorKind::Config,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for building an [`ChatError::Upstream`]
    pub fn upstream(provider: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            detail: detail.into(),
        }
    }
}

/// Classify an arbitrary propagated error
///
/// Errors that are not a [`ChatError`] anywhere in their chain are
/// reported as [`ErrorKind::Internal`].
pub fn classify(error: &anyhow::Error) -> ErrorKind {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ChatError>())
        .map(ChatError::kind)
        .unwrap_or(ErrorKind::Internal)
}

/// Result type alias for Multichat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
