use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use multichat::config::ClaudeConfig;
use multichat::providers::{ClaudeProvider, ProviderRegistry};
use multichat::storage::SqliteStorage;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("chat.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Claude adapter pointed at a stub server
#[allow(dead_code)]
pub fn claude_at(base: &str) -> ClaudeProvider {
    let mut config = ClaudeConfig::default();
    config.api.api_base = Some(base.to_string());
    config.api.api_key = Some("test-key".to_string());
    config.api.timeout_seconds = 5;
    ClaudeProvider::new(config).expect("failed to build claude provider")
}

/// Registry holding only a stubbed Claude adapter
#[allow(dead_code)]
pub fn claude_registry(base: &str) -> Arc<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(claude_at(base)));
    Arc::new(registry)
}
