//! Session orchestration
//!
//! [`ChatService`] is the surface the HTTP binding and the CLI call. A
//! message send runs strictly in this order and stops at the first
//! failure:
//!
//! 1. validate input and the provider key
//! 2. resolve attached files into context
//! 3. assemble the prompt
//! 4. dispatch to the provider
//! 5. locate the session and record both turns
//!
//! Nothing is written before step 5, so a failed dispatch leaves the
//! session untouched.

use crate::context::{ContextFailure, ContextResolver};
use crate::error::{ChatError, Result};
use crate::prompts;
use crate::providers::ProviderRegistry;
use crate::session::ConversationRecorder;
use crate::storage::{
    is_valid_identifier, FileContentStore, Message, Session, SessionStore, SessionSummary,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default cap on file references per message
pub const DEFAULT_MAX_FILES: usize = 20;

/// A request to send one user message
///
/// Absent fields deserialize as empty so that validation, not the decoder,
/// reports what is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Target session
    pub session_id: String,
    /// The user's message
    pub message: String,
    /// Provider key to dispatch to
    #[serde(rename = "llmProvider")]
    pub provider: String,
    /// Files to attach as context, in order
    pub file_ids: Vec<String>,
}

/// Result of a successful message send
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// The provider's reply
    pub assistant_text: String,
    /// The session after both turns were recorded
    pub session: Session,
    /// Files that could not be included in the context
    pub warnings: Vec<ContextFailure>,
}

impl SendOutcome {
    /// True when the reply was generated from incomplete context
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Coordinates context resolution, dispatch and recording
#[derive(Clone)]
pub struct ChatService {
    registry: Arc<ProviderRegistry>,
    resolver: ContextResolver,
    recorder: ConversationRecorder,
    sessions: Arc<dyn SessionStore>,
    max_files: usize,
}

impl ChatService {
    /// Create a service over the given registry and stores
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use multichat::providers::ProviderRegistry;
    /// use multichat::session::ChatService;
    /// use multichat::storage::MemoryStorage;
    ///
    /// let storage = Arc::new(MemoryStorage::new());
    /// let service = ChatService::new(
    ///     Arc::new(ProviderRegistry::new()),
    ///     storage.clone(),
    ///     storage,
    /// );
    /// assert!(service.providers().is_empty());
    /// ```
    pub fn new(
        registry: Arc<ProviderRegistry>,
        files: Arc<dyn FileContentStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            registry,
            resolver: ContextResolver::new(files),
            recorder: ConversationRecorder::new(sessions.clone()),
            sessions,
            max_files: DEFAULT_MAX_FILES,
        }
    }

    /// Override the per-message file reference cap
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Registered provider keys, sorted
    pub fn providers(&self) -> Vec<String> {
        self.registry.keys()
    }

    /// Create and persist an empty session
    ///
    /// # Errors
    ///
    /// Returns error if the session store fails
    pub async fn create_session(&self, user_id: Option<&str>, title: Option<&str>) -> Result<Session> {
        let session = Session::new(user_id, title);
        self.sessions.save(&session).await?;

        tracing::info!(
            session_id = %session.id,
            user_id = %session.user_id,
            "Created chat session"
        );

        Ok(session)
    }

    /// Fetch a session with its full transcript
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::SessionNotFound`] for an unknown identifier
    pub async fn get_history(&self, session_id: &str) -> Result<Session> {
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()).into())
    }

    /// Summaries of all stored sessions, most recent first
    ///
    /// # Errors
    ///
    /// Returns error if the session store fails
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        self.sessions.list_sessions().await
    }

    /// Send a message and record the exchange
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] or [`ChatError::UnknownProvider`]
    /// before any I/O, [`ChatError::Upstream`] when generation fails,
    /// [`ChatError::SessionNotFound`] when the session is missing, and
    /// [`ChatError::Storage`] when recording fails.
    pub async fn send_message(&self, request: SendMessageRequest) -> Result<SendOutcome> {
        self.validate(&request)?;

        let SendMessageRequest {
            session_id,
            message,
            provider,
            file_ids,
        } = request;

        let user_turn = Message::user(message.as_str(), provider.as_str(), file_ids.clone());

        let context = self.resolver.resolve(&file_ids).await;
        if context.is_degraded() {
            tracing::warn!(
                session_id = %session_id,
                failed = context.failures.len(),
                requested = file_ids.len(),
                "Proceeding with partial file context"
            );
        }

        let prompt = prompts::assemble(&message, &context.text);
        tracing::debug!(prompt_chars = prompt.len(), "Prompt assembled");

        let assistant_text = self.registry.dispatch(&provider, &prompt).await?;
        tracing::debug!(reply_chars = assistant_text.len(), "Provider replied");

        let assistant_turn = Message::assistant(assistant_text.as_str(), provider.as_str());
        let session = self
            .recorder
            .record(&session_id, user_turn, assistant_turn)
            .await?;

        tracing::info!(
            session_id = %session.id,
            provider = %provider,
            files = file_ids.len(),
            "Message exchange recorded"
        );

        Ok(SendOutcome {
            assistant_text,
            session,
            warnings: context.failures,
        })
    }

    fn validate(&self, request: &SendMessageRequest) -> Result<()> {
        if request.session_id.trim().is_empty() {
            return Err(ChatError::Validation("sessionId is required".to_string()).into());
        }
        if !is_valid_identifier(&request.session_id) {
            return Err(ChatError::Validation(format!(
                "sessionId '{}' is not a valid identifier",
                request.session_id
            ))
            .into());
        }
        if request.message.trim().is_empty() {
            return Err(ChatError::Validation("message is required".to_string()).into());
        }
        if request.provider.trim().is_empty() {
            return Err(ChatError::Validation("llmProvider is required".to_string()).into());
        }
        if request.file_ids.len() > self.max_files {
            return Err(ChatError::Validation(format!(
                "too many files attached: {} (max {})",
                request.file_ids.len(),
                self.max_files
            ))
            .into());
        }
        if !self.registry.contains(&request.provider) {
            return Err(ChatError::UnknownProvider(request.provider.clone()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{classify, ErrorKind};
    use crate::providers::Provider;
    use crate::storage::{FileStore, MemoryStorage, Role};
    use async_trait::async_trait;
    use mockall::mock;
    use std::sync::Mutex;

    mock! {
        Files {}

        #[async_trait]
        impl FileContentStore for Files {
            async fn get_content(&self, file_id: &str) -> Result<String>;
        }
    }

    mock! {
        Sessions {}

        #[async_trait]
        impl SessionStore for Sessions {
            async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;
            async fn save(&self, session: &Session) -> Result<()>;
            async fn append_turn(
                &self,
                session_id: &str,
                user: Message,
                assistant: Message,
            ) -> Result<Option<Session>>;
            async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;
        }
    }

    /// Provider double that records the prompts it receives
    struct Scripted {
        key: &'static str,
        reply: Option<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn ok(key: &'static str, reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                key,
                reply: Some(reply),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(key: &'static str) -> Arc<Self> {
            Arc::new(Self {
                key,
                reply: None,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for Scripted {
        fn name(&self) -> &str {
            self.key
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.reply {
                Some(text) => Ok(text.to_string()),
                None => Err(ChatError::upstream(self.key, "request timed out").into()),
            }
        }
    }

    fn registry_with(provider: Arc<Scripted>) -> Arc<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        registry.register(provider);
        Arc::new(registry)
    }

    fn service(storage: &Arc<MemoryStorage>, provider: Arc<Scripted>) -> ChatService {
        ChatService::new(registry_with(provider), storage.clone(), storage.clone())
    }

    fn request(session_id: &str, provider: &str, file_ids: &[&str]) -> SendMessageRequest {
        SendMessageRequest {
            session_id: session_id.to_string(),
            message: "Hi".to_string(),
            provider: provider.to_string(),
            file_ids: file_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_send_message_appends_pair_and_advances_timestamp() {
        let storage = Arc::new(MemoryStorage::new());
        let svc = service(&storage, Scripted::ok("claude", "Hello!"));
        let session = svc.create_session(None, None).await.unwrap();

        let outcome = svc
            .send_message(request(&session.id, "claude", &[]))
            .await
            .unwrap();

        assert_eq!(outcome.assistant_text, "Hello!");
        assert!(!outcome.is_degraded());
        let messages = &outcome.session.messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hi");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hello!");
        assert_eq!(messages[0].provider, messages[1].provider);
        assert!(outcome.session.updated_at > session.updated_at);
    }

    #[tokio::test]
    async fn test_second_send_appends_after_first() {
        let storage = Arc::new(MemoryStorage::new());
        let svc = service(&storage, Scripted::ok("gpt", "ack"));
        let session = svc.create_session(Some("u1"), Some("Notes")).await.unwrap();

        let first = svc.send_message(request(&session.id, "gpt", &[])).await.unwrap();
        let mut next = request(&session.id, "gpt", &[]);
        next.message = "Again".to_string();
        let second = svc.send_message(next).await.unwrap();

        assert_eq!(second.session.messages.len(), 4);
        assert_eq!(second.session.messages[..2], first.session.messages[..]);
        assert_eq!(second.session.messages[2].content, "Again");
        assert!(second.session.updated_at > first.session.updated_at);
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_session_unchanged() {
        let storage = Arc::new(MemoryStorage::new());
        let svc = service(&storage, Scripted::failing("gemini"));
        let session = svc.create_session(None, None).await.unwrap();

        let err = svc
            .send_message(request(&session.id, "gemini", &[]))
            .await
            .unwrap_err();

        assert_eq!(classify(&err), ErrorKind::Upstream);
        let after = svc.get_history(&session.id).await.unwrap();
        assert_eq!(after, session);
    }

    #[tokio::test]
    async fn test_unknown_provider_touches_no_collaborator() {
        let mut files = MockFiles::new();
        files.expect_get_content().times(0);
        let mut sessions = MockSessions::new();
        sessions.expect_find_by_id().times(0);
        sessions.expect_save().times(0);
        sessions.expect_append_turn().times(0);

        let provider = Scripted::ok("claude", "unused");
        let svc = ChatService::new(
            registry_with(provider.clone()),
            Arc::new(files),
            Arc::new(sessions),
        );

        let err = svc
            .send_message(request("s1", "not-a-real-provider", &["f1", "f2"]))
            .await
            .unwrap_err();

        assert_eq!(classify(&err), ErrorKind::UnknownProvider);
        assert!(provider.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_input() {
        let storage = Arc::new(MemoryStorage::new());
        let svc = service(&storage, Scripted::ok("claude", "x")).with_max_files(2);

        let mut blank = request("s1", "claude", &[]);
        blank.message = "   ".to_string();
        let cases = vec![
            request("", "claude", &[]),
            request("bad id!", "claude", &[]),
            blank,
            request("s1", "", &[]),
            request("s1", "claude", &["a", "b", "c"]),
        ];

        for case in cases {
            let err = svc.send_message(case.clone()).await.unwrap_err();
            assert_eq!(classify(&err), ErrorKind::Validation, "case: {:?}", case);
        }
    }

    #[tokio::test]
    async fn test_missing_session_after_dispatch() {
        let storage = Arc::new(MemoryStorage::new());
        let svc = service(&storage, Scripted::ok("claude", "OK"));

        let err = svc
            .send_message(request("no-such-session", "claude", &[]))
            .await
            .unwrap_err();

        assert_eq!(classify(&err), ErrorKind::SessionNotFound);
        assert!(storage.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_context_reaches_provider_and_refs_are_recorded() {
        let storage = Arc::new(MemoryStorage::new());
        let a = storage.put_file("a.txt", "alpha").await.unwrap();
        let b = storage.put_file("b.txt", "beta").await.unwrap();

        let provider = Scripted::ok("claude", "OK");
        let svc = service(&storage, provider.clone());
        let session = svc.create_session(None, None).await.unwrap();

        let outcome = svc
            .send_message(request(&session.id, "claude", &[&a.id, &b.id]))
            .await
            .unwrap();

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        let prompt = &prompts[0];
        assert!(prompt.starts_with("Context:\n"));
        assert!(prompt.ends_with("Question:\nHi"));
        assert!(prompt.find("alpha").unwrap() < prompt.find("beta").unwrap());

        assert_eq!(
            outcome.session.messages[0].file_references,
            vec![a.id.clone(), b.id.clone()]
        );
    }

    #[tokio::test]
    async fn test_partial_context_is_reported_as_warning() {
        let storage = Arc::new(MemoryStorage::new());
        let a = storage.put_file("a.txt", "alpha").await.unwrap();

        let svc = service(&storage, Scripted::ok("llama", "fine"));
        let session = svc.create_session(None, None).await.unwrap();

        let outcome = svc
            .send_message(request(&session.id, "llama", &[&a.id, "gone"]))
            .await
            .unwrap();

        assert!(outcome.is_degraded());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].file_id, "gone");
        assert_eq!(outcome.session.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_get_history_not_found() {
        let storage = Arc::new(MemoryStorage::new());
        let svc = service(&storage, Scripted::ok("claude", "x"));
        let err = svc.get_history("nope").await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::SessionNotFound);
    }

    #[test]
    fn test_request_wire_names() {
        let json = r#"{"sessionId":"s1","message":"Hi","llmProvider":"gpt","fileIds":["f1"]}"#;
        let request: SendMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.provider, "gpt");
        assert_eq!(request.file_ids, vec!["f1"]);

        let minimal = r#"{"sessionId":"s1","message":"Hi","llmProvider":"gpt"}"#;
        let request: SendMessageRequest = serde_json::from_str(minimal).unwrap();
        assert!(request.file_ids.is_empty());
    }

    #[tokio::test]
    async fn test_request_missing_fields_fail_validation() {
        let storage = Arc::new(MemoryStorage::new());
        let svc = service(&storage, Scripted::ok("claude", "x"));

        let request: SendMessageRequest =
            serde_json::from_str(r#"{"message":"Hi","llmProvider":"claude"}"#).unwrap();
        assert!(request.session_id.is_empty());

        let err = svc.send_message(request).await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Validation);
        assert!(err.to_string().contains("sessionId is required"));
    }
}
