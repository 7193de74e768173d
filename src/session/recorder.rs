//! Conversation recording
//!
//! Appends a (user, assistant) pair to a stored session as one atomic
//! store operation, so readers see either both turns or neither and
//! concurrent sends never drop each other's pairs.

use crate::error::{classify, ChatError, ErrorKind, Result};
use crate::storage::{Message, Session, SessionStore};
use std::sync::Arc;

/// Appends matched turn pairs to sessions held by a [`SessionStore`]
#[derive(Clone)]
pub struct ConversationRecorder {
    sessions: Arc<dyn SessionStore>,
}

impl ConversationRecorder {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    /// Record a user turn and its assistant reply
    ///
    /// The store appends both turns in a single atomic step. Nothing is
    /// written when the session does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::SessionNotFound`] for an unknown session and
    /// [`ChatError::Storage`] when the store fails.
    pub async fn record(
        &self,
        session_id: &str,
        user: Message,
        assistant: Message,
    ) -> Result<Session> {
        let session = self
            .sessions
            .append_turn(session_id, user, assistant)
            .await
            .map_err(as_storage)?
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))?;

        tracing::debug!(
            session_id = %session.id,
            messages = session.messages.len(),
            "Recorded conversation turn"
        );

        Ok(session)
    }
}

/// Store failures must reach the caller as storage errors
fn as_storage(error: anyhow::Error) -> anyhow::Error {
    if classify(&error) == ErrorKind::Internal {
        ChatError::Storage(format!("{:#}", error)).into()
    } else {
        error
    }
}
