//! Session and file stores
//!
//! The chat core only sees the [`SessionStore`] and [`FileContentStore`]
//! traits. [`SqliteStorage`] is the durable implementation and
//! [`MemoryStorage`] backs tests and ephemeral servers.

use crate::config::StorageConfig;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod memory;
pub mod types;

pub use memory::MemoryStorage;
pub use types::{
    is_valid_identifier, Message, Role, Session, SessionSummary, StoredFile, DEFAULT_TITLE,
    DEFAULT_USER_ID,
};

/// Read access to already-decoded file text
#[async_trait]
pub trait FileContentStore: Send + Sync {
    /// Fetch the text content of a file
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::FileNotFound`] when the identifier does not
    /// resolve, or [`ChatError::Storage`] when the store is unavailable.
    async fn get_content(&self, file_id: &str) -> Result<String>;
}

/// Upload, list and delete surface of the file store
#[async_trait]
pub trait FileStore: FileContentStore {
    /// Store a new file and return its metadata
    async fn put_file(&self, name: &str, content: &str) -> Result<StoredFile>;

    /// List stored files, newest first
    async fn list_files(&self) -> Result<Vec<StoredFile>>;

    /// Delete a file; returns false when nothing matched
    async fn delete_file(&self, file_id: &str) -> Result<bool>;
}

/// Persistence of whole session documents
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session by its exact identifier
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Insert or fully replace a session document in one write
    async fn save(&self, session: &Session) -> Result<()>;

    /// Append a (user, assistant) pair to a stored session atomically
    ///
    /// The read, the append and the write happen as one step, so
    /// concurrent appends to the same session never overwrite each other.
    /// Returns `None` without writing when the session does not exist.
    async fn append_turn(
        &self,
        session_id: &str,
        user: Message,
        assistant: Message,
    ) -> Result<Option<Session>>;

    /// List session summaries, most recently updated first
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;
}

fn storage_err(action: &str, e: impl std::fmt::Display) -> ChatError {
    ChatError::Storage(format!("{}: {}", action, e))
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(value: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// SQLite-backed session and file store
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Create a storage instance in the user's data directory
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "multichat", "multichat")
            .ok_or_else(|| ChatError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("multichat.db"))
    }

    /// Create a storage instance from configuration
    ///
    /// Uses `storage.db_path` when set, the platform data directory otherwise.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        match &config.db_path {
            Some(path) => Self::new_with_path(path),
            None => Self::new(),
        }
    }

    /// Create a storage instance that uses the specified database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use multichat::storage::SqliteStorage;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("chat.db")).unwrap();
    /// assert!(storage.db_path().ends_with("chat.db"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| storage_err("Failed to create parent directory for database", e))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        tracing::debug!("Opened SQLite storage at {}", storage.db_path.display());
        Ok(storage)
    }

    /// Path of the backing database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn init(&self) -> Result<()> {
        let conn = open_connection(&self.db_path)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                messages JSON NOT NULL
            );
            CREATE TABLE IF NOT EXISTS files (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                content TEXT NOT NULL,
                size INTEGER NOT NULL,
                uploaded_at TEXT NOT NULL
            );",
        )
        .map_err(|e| storage_err("Failed to create tables", e))?;

        Ok(())
    }

    /// Run a blocking database operation off the async executor
    async fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || op(open_connection(&db_path)?))
            .await
            .map_err(|e| storage_err("Storage task failed", e))?
    }
}

fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn =
        Connection::open(db_path).map_err(|e| storage_err("Failed to open database", e))?;
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(|e| storage_err("Failed to set busy timeout", e))?;
    Ok(conn)
}

fn read_session(conn: &Connection, session_id: &str) -> Result<Option<Session>> {
    let row = conn
        .query_row(
            "SELECT id, user_id, title, created_at, updated_at, messages
            FROM sessions WHERE id = ?",
            params![session_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()
        .map_err(|e| storage_err("Failed to query session", e))?;

    let Some((id, user_id, title, created_at, updated_at, messages_json)) = row else {
        return Ok(None);
    };

    let messages: Vec<Message> = serde_json::from_str(&messages_json)
        .map_err(|e| storage_err("Failed to deserialize messages", e))?;
    let created_at = parse_ts(&created_at).map_err(|e| storage_err("Corrupt created_at", e))?;
    let updated_at = parse_ts(&updated_at).map_err(|e| storage_err("Corrupt updated_at", e))?;

    Ok(Some(Session {
        id,
        user_id,
        title,
        messages,
        created_at,
        updated_at,
    }))
}

/// Insert or replace a whole session row; the caller owns the transaction
fn write_session(conn: &Connection, session: &Session) -> Result<()> {
    let messages_json = serde_json::to_string(&session.messages)
        .map_err(|e| storage_err("Failed to serialize messages", e))?;

    let exists = conn
        .query_row(
            "SELECT 1 FROM sessions WHERE id = ?",
            params![session.id],
            |_| Ok(true),
        )
        .optional()
        .map_err(|e| storage_err("Failed to query session", e))?
        .unwrap_or(false);

    if exists {
        conn.execute(
            "UPDATE sessions SET
                user_id = ?,
                title = ?,
                updated_at = ?,
                messages = ?
            WHERE id = ?",
            params![
                session.user_id,
                session.title,
                format_ts(&session.updated_at),
                messages_json,
                session.id
            ],
        )
        .map_err(|e| storage_err("Failed to update session", e))?;
    } else {
        conn.execute(
            "INSERT INTO sessions (id, user_id, title, created_at, updated_at, messages)
            VALUES (?, ?, ?, ?, ?, ?)",
            params![
                session.id,
                session.user_id,
                session.title,
                format_ts(&session.created_at),
                format_ts(&session.updated_at),
                messages_json
            ],
        )
        .map_err(|e| storage_err("Failed to insert session", e))?;
    }

    Ok(())
}

#[async_trait]
impl SessionStore for SqliteStorage {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        let id = session_id.to_string();
        self.with_connection(move |conn| read_session(&conn, &id)).await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let session = session.clone();

        self.with_connection(move |mut conn| {
            let tx = conn
                .transaction()
                .map_err(|e| storage_err("Failed to start transaction", e))?;
            write_session(&tx, &session)?;
            tx.commit()
                .map_err(|e| storage_err("Failed to commit transaction", e))?;
            Ok(())
        })
        .await
    }

    async fn append_turn(
        &self,
        session_id: &str,
        user: Message,
        assistant: Message,
    ) -> Result<Option<Session>> {
        let id = session_id.to_string();

        self.with_connection(move |mut conn| {
            // IMMEDIATE takes the write lock before the read
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| storage_err("Failed to start transaction", e))?;

            let Some(mut session) = read_session(&tx, &id)? else {
                return Ok(None);
            };
            session.append_turn(user, assistant);
            write_session(&tx, &session)?;

            tx.commit()
                .map_err(|e| storage_err("Failed to commit transaction", e))?;
            Ok(Some(session))
        })
        .await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, title, created_at, updated_at, json_array_length(messages)
                    FROM sessions
                    ORDER BY updated_at DESC",
                )
                .map_err(|e| storage_err("Failed to prepare statement", e))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                })
                .map_err(|e| storage_err("Failed to query sessions", e))?;

            let mut summaries = Vec::new();
            for row in rows {
                let (id, user_id, title, created_at, updated_at, message_count) =
                    row.map_err(|e| storage_err("Failed to read session row", e))?;
                summaries.push(SessionSummary {
                    message_count: usize::try_from(message_count)
                        .map_err(|e| storage_err("Corrupt message count", e))?,
                    created_at: parse_ts(&created_at)
                        .map_err(|e| storage_err("Corrupt created_at", e))?,
                    updated_at: parse_ts(&updated_at)
                        .map_err(|e| storage_err("Corrupt updated_at", e))?,
                    id,
                    user_id,
                    title,
                });
            }
            Ok(summaries)
        })
        .await
    }
}

#[async_trait]
impl FileContentStore for SqliteStorage {
    async fn get_content(&self, file_id: &str) -> Result<String> {
        let id = file_id.to_string();
        self.with_connection(move |conn| {
            conn.query_row(
                "SELECT content FROM files WHERE id = ?",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| storage_err("Failed to query file", e))?
            .ok_or_else(|| ChatError::FileNotFound(id).into())
        })
        .await
    }
}

#[async_trait]
impl FileStore for SqliteStorage {
    async fn put_file(&self, name: &str, content: &str) -> Result<StoredFile> {
        let file = StoredFile {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            size: content.len(),
            uploaded_at: Utc::now(),
        };
        let content = content.to_string();

        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO files (id, name, content, size, uploaded_at) VALUES (?, ?, ?, ?, ?)",
                params![
                    file.id,
                    file.name,
                    content,
                    file.size as i64,
                    format_ts(&file.uploaded_at)
                ],
            )
            .map_err(|e| storage_err("Failed to insert file", e))?;
            Ok(file)
        })
        .await
    }

    async fn list_files(&self) -> Result<Vec<StoredFile>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, size, uploaded_at FROM files ORDER BY uploaded_at DESC")
                .map_err(|e| storage_err("Failed to prepare statement", e))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })
                .map_err(|e| storage_err("Failed to query files", e))?;

            let mut files = Vec::new();
            for row in rows {
                let (id, name, size, uploaded_at) =
                    row.map_err(|e| storage_err("Failed to read file row", e))?;
                files.push(StoredFile {
                    id,
                    name,
                    size: usize::try_from(size).map_err(|e| storage_err("Corrupt file size", e))?,
                    uploaded_at: parse_ts(&uploaded_at)
                        .map_err(|e| storage_err("Corrupt uploaded_at", e))?,
                });
            }
            Ok(files)
        })
        .await
    }

    async fn delete_file(&self, file_id: &str) -> Result<bool> {
        let id = file_id.to_string();
        self.with_connection(move |conn| {
            let deleted = conn
                .execute("DELETE FROM files WHERE id = ?", params![id])
                .map_err(|e| storage_err("Failed to delete file", e))?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{classify, ErrorKind};
    use tempfile::tempdir;

    /// Helper: create a temporary storage instance backed by a temp directory.
    ///
    /// Returns both the `SqliteStorage` and the `TempDir` so the caller keeps
    /// ownership of the directory (preventing it from being removed).
    fn create_test_storage() -> (SqliteStorage, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let storage = SqliteStorage::new_with_path(dir.path().join("chat.db"))
            .expect("failed to create storage");
        (storage, dir)
    }

    #[test]
    fn test_sqlite_storage_init_creates_tables() {
        let (storage, _dir) = create_test_storage();
        let conn = Connection::open(storage.db_path()).expect("open connection");
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name IN ('sessions', 'files')",
                [],
                |r| r.get(0),
            )
            .expect("query row");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_save_and_find_session() {
        let (storage, _dir) = create_test_storage();
        let mut session = Session::new(Some("u1"), Some("Design review"));
        session.append_turn(
            Message::user("Q", "claude", vec!["f1".to_string()]),
            Message::assistant("A", "claude"),
        );

        storage.save(&session).await.expect("save failed");
        let loaded = storage
            .find_by_id(&session.id)
            .await
            .expect("load failed")
            .expect("session present");

        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn test_find_missing_session_returns_none() {
        let (storage, _dir) = create_test_storage();
        let loaded = storage.find_by_id("missing").await.expect("load failed");
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_document_and_preserves_created_at() {
        let (storage, _dir) = create_test_storage();
        let mut session = Session::new(None, None);
        storage.save(&session).await.unwrap();

        let created_at = session.created_at;
        session.append_turn(
            Message::user("Q", "gpt", vec![]),
            Message::assistant("A", "gpt"),
        );
        storage.save(&session).await.unwrap();

        let loaded = storage.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.created_at, created_at);
        assert!(loaded.updated_at > created_at);
    }

    #[tokio::test]
    async fn test_append_turn_missing_session_writes_nothing() {
        let (storage, _dir) = create_test_storage();
        let appended = storage
            .append_turn(
                "missing",
                Message::user("Q", "claude", vec![]),
                Message::assistant("A", "claude"),
            )
            .await
            .unwrap();
        assert!(appended.is_none());
        assert!(storage.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_append_turn_keeps_every_pair() {
        let (storage, _dir) = create_test_storage();
        let storage = std::sync::Arc::new(storage);
        let session = Session::new(None, None);
        storage.save(&session).await.unwrap();

        let appends = (0..8).map(|i| {
            let storage = storage.clone();
            let id = session.id.clone();
            async move {
                storage
                    .append_turn(
                        &id,
                        Message::user(format!("u{}", i), "claude", vec![]),
                        Message::assistant(format!("a{}", i), "claude"),
                    )
                    .await
            }
        });
        for result in futures::future::join_all(appends).await {
            assert!(result.unwrap().is_some());
        }

        let stored = storage.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 16);
        for pair in stored.messages.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[0].content[1..], pair[1].content[1..]);
        }
    }

    #[tokio::test]
    async fn test_list_reports_corrupt_rows() {
        let (storage, _dir) = create_test_storage();
        storage.save(&Session::new(None, None)).await.unwrap();
        storage.put_file("a.txt", "a").await.unwrap();

        let conn = Connection::open(storage.db_path()).unwrap();
        conn.execute("UPDATE sessions SET updated_at = 'yesterday'", [])
            .unwrap();
        conn.execute("UPDATE files SET size = -1", []).unwrap();

        let err = storage.list_sessions().await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Storage);
        assert!(err.to_string().contains("Corrupt updated_at"));

        let err = storage.list_files().await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Storage);
        assert!(err.to_string().contains("Corrupt file size"));
    }

    #[tokio::test]
    async fn test_list_sessions_orders_by_updated_at() {
        let (storage, _dir) = create_test_storage();
        let older = Session::new(None, Some("older"));
        let mut newer = Session::new(None, Some("newer"));
        storage.save(&older).await.unwrap();
        newer.append_turn(
            Message::user("Q", "gemini", vec![]),
            Message::assistant("A", "gemini"),
        );
        storage.save(&newer).await.unwrap();

        let sessions = storage.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].title, "newer");
        assert_eq!(sessions[0].message_count, 2);
        assert_eq!(sessions[1].message_count, 0);
    }

    #[tokio::test]
    async fn test_file_put_get_list_delete() {
        let (storage, _dir) = create_test_storage();
        let file = storage.put_file("notes.txt", "hello").await.unwrap();
        assert_eq!(file.size, 5);

        assert_eq!(storage.get_content(&file.id).await.unwrap(), "hello");
        assert_eq!(storage.list_files().await.unwrap().len(), 1);

        assert!(storage.delete_file(&file.id).await.unwrap());
        assert!(!storage.delete_file(&file.id).await.unwrap());
        assert!(storage.list_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_file_is_file_not_found() {
        let (storage, _dir) = create_test_storage();
        let err = storage.get_content("nope").await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::FileNotFound);
    }

    #[test]
    fn test_open_with_configured_path() {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            db_path: Some(dir.path().join("nested/db.sqlite").display().to_string()),
        };
        let storage = SqliteStorage::open(&config).unwrap();
        assert!(storage.db_path().exists());
    }
}
