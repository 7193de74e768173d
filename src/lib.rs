//! Multichat - multi-provider LLM chat backend library
//!
//! This library provides the chat core: sessions with an append-only
//! transcript, file context resolution, prompt assembly, and dispatch to
//! one of several LLM providers behind a uniform adapter contract.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `context`: Resolves file identifiers into delimited context text
//! - `prompts`: Merges context and the user's message into one prompt
//! - `providers`: Provider adapters (Gemini, Claude, GPT, Llama) and the dispatch registry
//! - `session`: Conversation recorder and the message-send orchestrator
//! - `storage`: Session and file stores (SQLite and in-memory)
//! - `server`: JSON HTTP binding
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use multichat::{ChatService, Config, ProviderRegistry, SendMessageRequest};
//! use multichat::storage::MemoryStorage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let registry = Arc::new(ProviderRegistry::from_config(&config.providers)?);
//!     let storage = Arc::new(MemoryStorage::new());
//!     let service = ChatService::new(registry, storage.clone(), storage);
//!
//!     let session = service.create_session(None, None).await?;
//!     let outcome = service
//!         .send_message(SendMessageRequest {
//!             session_id: session.id,
//!             message: "Hello".to_string(),
//!             provider: "claude".to_string(),
//!             file_ids: vec![],
//!         })
//!         .await?;
//!     println!("{}", outcome.assistant_text);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod server;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use context::{ContextResolver, ResolvedContext};
pub use error::{ChatError, ErrorKind, Result};
pub use providers::{Provider, ProviderRegistry};
pub use session::{ChatService, ConversationRecorder, SendMessageRequest, SendOutcome};
pub use storage::{Message, Role, Session};
