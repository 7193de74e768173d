//! Conversation recording and message-send orchestration

pub mod recorder;
pub mod service;

pub use recorder::ConversationRecorder;
pub use service::{ChatService, SendMessageRequest, SendOutcome, DEFAULT_MAX_FILES};
