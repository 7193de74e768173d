use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Default session title when the caller supplies none
pub const DEFAULT_TITLE: &str = "New Chat";

/// Default owning user when the caller supplies none
pub const DEFAULT_USER_ID: &str = "anonymous";

/// Author of a turn in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn in a session transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Who produced the turn
    pub role: Role,
    /// Text of the turn
    pub content: String,
    /// Provider key used to produce or consume the turn
    #[serde(rename = "llmProvider")]
    pub provider: String,
    /// When the turn was created
    pub timestamp: DateTime<Utc>,
    /// Attached file identifiers (user turns only)
    #[serde(default)]
    pub file_references: Vec<String>,
}

impl Message {
    /// Creates a user turn carrying its attached file references
    ///
    /// # Examples
    ///
    /// ```
    /// use multichat::storage::{Message, Role};
    ///
    /// let msg = Message::user("Summarize this", "claude", vec!["f1".to_string()]);
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.file_references, vec!["f1".to_string()]);
    /// ```
    pub fn user(
        content: impl Into<String>,
        provider: impl Into<String>,
        file_references: Vec<String>,
    ) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            provider: provider.into(),
            timestamp: Utc::now(),
            file_references,
        }
    }

    /// Creates an assistant turn
    ///
    /// # Examples
    ///
    /// ```
    /// use multichat::storage::{Message, Role};
    ///
    /// let msg = Message::assistant("Here is a summary", "claude");
    /// assert_eq!(msg.role, Role::Assistant);
    /// assert!(msg.file_references.is_empty());
    /// ```
    pub fn assistant(content: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            provider: provider.into(),
            timestamp: Utc::now(),
            file_references: Vec::new(),
        }
    }
}

/// A conversation session and its full transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique identifier for the session
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// User-friendly title
    pub title: String,
    /// Transcript in insertion order
    #[serde(default)]
    pub messages: Vec<Message>,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// When the session was last updated
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates an empty session with a fresh identifier
    ///
    /// Blank user ids and titles fall back to [`DEFAULT_USER_ID`] and
    /// [`DEFAULT_TITLE`].
    pub fn new(user_id: Option<&str>, title: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: non_blank(user_id).unwrap_or(DEFAULT_USER_ID).to_string(),
            title: non_blank(title).unwrap_or(DEFAULT_TITLE).to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a matched (user, assistant) pair and advances `updated_at`
    ///
    /// This is the only way the transcript grows. The new `updated_at` is
    /// strictly later than the previous one even when the clock has not
    /// moved.
    pub fn append_turn(&mut self, user: Message, assistant: Message) {
        debug_assert_eq!(user.role, Role::User);
        debug_assert_eq!(assistant.role, Role::Assistant);
        self.messages.push(user);
        self.messages.push(assistant);
        self.touch();
    }

    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }

    /// Builds the list-view summary of this session
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            title: self.title.clone(),
            message_count: self.messages.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Metadata for a stored session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata for an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    /// Content length in bytes
    pub size: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Returns true for a well-formed session or file identifier
///
/// Identifiers are opaque to the chat core; only their outer shape is
/// checked: 1 to 128 characters from `[A-Za-z0-9_.:-]`, starting
/// alphanumeric.
///
/// # Examples
///
/// ```
/// use multichat::storage::is_valid_identifier;
///
/// assert!(is_valid_identifier("65a1f0c2e4b0a1b2c3d4e5f6"));
/// assert!(!is_valid_identifier(""));
/// assert!(!is_valid_identifier("../etc/passwd"));
/// ```
pub fn is_valid_identifier(id: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:\-]{0,127}$").expect("identifier regex is valid")
        })
        .is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults() {
        let session = Session::new(None, Some("   "));
        assert_eq!(session.user_id, DEFAULT_USER_ID);
        assert_eq!(session.title, DEFAULT_TITLE);
        assert!(session.messages.is_empty());
        assert_eq!(session.created_at, session.updated_at);
        assert!(is_valid_identifier(&session.id));
    }

    #[test]
    fn test_append_turn_orders_pair_and_advances_timestamp() {
        let mut session = Session::new(Some("u1"), Some("Plans"));
        let before = session.updated_at;

        session.append_turn(
            Message::user("Hi", "gpt", vec![]),
            Message::assistant("Hello", "gpt"),
        );

        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, Role::User);
        assert_eq!(session.messages[1].role, Role::Assistant);
        assert!(session.updated_at > before);
    }

    #[test]
    fn test_touch_is_strict_even_with_future_timestamp() {
        let mut session = Session::new(None, None);
        let future = Utc::now() + Duration::hours(1);
        session.updated_at = future;

        session.append_turn(
            Message::user("a", "gemini", vec![]),
            Message::assistant("b", "gemini"),
        );

        assert!(session.updated_at > future);
    }

    #[test]
    fn test_message_wire_format() {
        let msg = Message::user("Q", "claude", vec!["f1".to_string()]);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["llmProvider"], "claude");
        assert_eq!(value["fileReferences"][0], "f1");
    }

    #[test]
    fn test_session_roundtrips_through_json() {
        let mut session = Session::new(Some("u1"), Some("T"));
        session.append_turn(
            Message::user("Q", "llama", vec![]),
            Message::assistant("A", "llama"),
        );
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"userId\":\"u1\""));
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("abc-123"));
        assert!(is_valid_identifier("6f9619ff-8b86-d011-b42d-00c04fc964ff"));
        assert!(!is_valid_identifier("-leading-dash"));
        assert!(!is_valid_identifier("has space"));
        assert!(!is_valid_identifier("slash/inside"));
        assert!(!is_valid_identifier(&"a".repeat(129)));
    }
}
