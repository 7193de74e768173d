//! In-memory session and file storage.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    FileContentStore, FileStore, Message, Session, SessionStore, SessionSummary, StoredFile,
};
use crate::error::{ChatError, Result};

/// In-memory storage for testing and ephemeral servers.
#[derive(Default)]
pub struct MemoryStorage {
    sessions: RwLock<HashMap<String, Session>>,
    files: RwLock<HashMap<String, (StoredFile, String)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStorage {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        debug!("Saved session {} to memory", session.id);
        Ok(())
    }

    async fn append_turn(
        &self,
        session_id: &str,
        user: Message,
        assistant: Message,
    ) -> Result<Option<Session>> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(session_id) else {
            return Ok(None);
        };
        session.append_turn(user, assistant);
        Ok(Some(session.clone()))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> = sessions.values().map(Session::summary).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}

#[async_trait]
impl FileContentStore for MemoryStorage {
    async fn get_content(&self, file_id: &str) -> Result<String> {
        let files = self.files.read().await;
        files
            .get(file_id)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| ChatError::FileNotFound(file_id.to_string()).into())
    }
}

#[async_trait]
impl FileStore for MemoryStorage {
    async fn put_file(&self, name: &str, content: &str) -> Result<StoredFile> {
        let file = StoredFile {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            size: content.len(),
            uploaded_at: Utc::now(),
        };
        let mut files = self.files.write().await;
        files.insert(file.id.clone(), (file.clone(), content.to_string()));
        Ok(file)
    }

    async fn list_files(&self) -> Result<Vec<StoredFile>> {
        let files = self.files.read().await;
        let mut listed: Vec<StoredFile> = files.values().map(|(meta, _)| meta.clone()).collect();
        listed.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(listed)
    }

    async fn delete_file(&self, file_id: &str) -> Result<bool> {
        let mut files = self.files.write().await;
        Ok(files.remove(file_id).is_some())
    }
}
