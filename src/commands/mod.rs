/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `serve`   runs the HTTP API
- `session` creates, shows and sends to sessions
- `history` prints the session table
- `files`   uploads, lists and deletes context files

All handlers go through the same [`Backend`] so the CLI and the HTTP API
share one code path into the chat core.
*/

use crate::config::Config;
use crate::error::Result;
use crate::providers::ProviderRegistry;
use crate::session::ChatService;
use crate::storage::{FileContentStore, FileStore, MemoryStorage, SessionStore, SqliteStorage};
use colored::Colorize;
use prettytable::{format, Table};
use std::sync::Arc;

pub mod files;
pub mod history;
pub mod serve;
pub mod session;

/// The chat service plus the file store it resolves context from
#[derive(Clone)]
pub struct Backend {
    pub service: ChatService,
    pub files: Arc<dyn FileStore>,
}

impl Backend {
    /// Wire providers and storage from configuration
    ///
    /// With `ephemeral` set, sessions and files live in memory and are lost
    /// on exit; otherwise the SQLite database from `storage.db_path` (or
    /// the platform data directory) is used.
    ///
    /// # Errors
    ///
    /// Returns error if a provider cannot be built or the database cannot
    /// be opened
    pub fn from_config(config: &Config, ephemeral: bool) -> Result<Self> {
        let registry = Arc::new(ProviderRegistry::from_config(&config.providers)?);

        let (files, contents, sessions): (
            Arc<dyn FileStore>,
            Arc<dyn FileContentStore>,
            Arc<dyn SessionStore>,
        ) = if ephemeral {
            tracing::warn!("Using in-memory storage; nothing will be persisted");
            let storage = Arc::new(MemoryStorage::new());
            (storage.clone(), storage.clone(), storage)
        } else {
            let storage = Arc::new(SqliteStorage::open(&config.storage)?);
            tracing::info!("Using SQLite storage at {}", storage.db_path().display());
            (storage.clone(), storage.clone(), storage)
        };

        let service =
            ChatService::new(registry, contents, sessions).with_max_files(config.context.max_files);

        Ok(Self { service, files })
    }
}

/// Print the registered providers and their models
pub fn list_providers(config: &Config) -> Result<()> {
    let registry = ProviderRegistry::from_config(&config.providers)?;

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row!["Provider".bold(), "Model".bold()]);

    for key in registry.keys() {
        let provider = registry.get(&key)?;
        table.add_row(prettytable::row![key.cyan(), provider.model()]);
    }

    table.printstd();
    Ok(())
}

/// Shorten `text` to at most `max` characters, marking the cut with "..."
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long session title", 10), "a long ...");
        assert_eq!(truncate("ééééééééééé", 5), "éé...");
    }

    #[tokio::test]
    async fn test_backend_ephemeral_roundtrip() {
        let backend = Backend::from_config(&Config::default(), true).unwrap();
        let session = backend.service.create_session(None, None).await.unwrap();
        let loaded = backend.service.get_history(&session.id).await.unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(
            backend.service.providers(),
            vec!["claude", "gemini", "gpt", "llama"]
        );
    }

    #[tokio::test]
    async fn test_backend_sqlite_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.db_path = Some(dir.path().join("chat.db").to_string_lossy().into_owned());

        let backend = Backend::from_config(&config, false).unwrap();
        backend.files.put_file("a.txt", "alpha").await.unwrap();
        assert!(dir.path().join("chat.db").exists());
    }
}
