//! Context resolution for attached files
//!
//! Turns an ordered list of file identifiers into one block of text that
//! can be prepended to a prompt. Individual lookups may fail; the resolver
//! keeps going and reports each failure next to the text it did produce.

use crate::error::{classify, ErrorKind};
use crate::storage::{is_valid_identifier, FileContentStore};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;

/// A file that could not contribute to the context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextFailure {
    /// Identifier as supplied by the caller
    pub file_id: String,
    /// Why it was skipped
    pub cause: String,
}

/// Outcome of resolving a list of file identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedContext {
    /// Delimited file contents in request order; empty when nothing resolved
    pub text: String,
    /// One entry per identifier that did not resolve
    pub failures: Vec<ContextFailure>,
}

impl ResolvedContext {
    /// True when at least one requested file is missing from `text`
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Wrap one file's content in a block that names its source
///
/// # Examples
///
/// ```
/// use multichat::context::file_block;
///
/// let block = file_block("f1", "hello");
/// assert_eq!(block, "--- BEGIN FILE f1 ---\nhello\n--- END FILE f1 ---");
/// ```
pub fn file_block(file_id: &str, content: &str) -> String {
    format!(
        "--- BEGIN FILE {id} ---\n{content}\n--- END FILE {id} ---",
        id = file_id,
        content = content.trim_end_matches('\n')
    )
}

/// Resolves file identifiers against a [`FileContentStore`]
#[derive(Clone)]
pub struct ContextResolver {
    files: Arc<dyn FileContentStore>,
}

impl ContextResolver {
    pub fn new(files: Arc<dyn FileContentStore>) -> Self {
        Self { files }
    }

    /// Resolve `file_ids` into context text
    ///
    /// Lookups run concurrently; the concatenation follows the order of
    /// `file_ids`. This never fails: malformed identifiers, missing files
    /// and storage errors are reported in [`ResolvedContext::failures`].
    pub async fn resolve(&self, file_ids: &[String]) -> ResolvedContext {
        if file_ids.is_empty() {
            return ResolvedContext::default();
        }

        let lookups = file_ids.iter().map(|id| async move {
            if !is_valid_identifier(id) {
                return Err("malformed file identifier".to_string());
            }
            self.files.get_content(id).await.map_err(|e| match classify(&e) {
                ErrorKind::FileNotFound => "file not found".to_string(),
                _ => format!("{:#}", e),
            })
        });
        let results = join_all(lookups).await;

        let mut blocks = Vec::with_capacity(file_ids.len());
        let mut failures = Vec::new();
        for (file_id, result) in file_ids.iter().zip(results) {
            match result {
                Ok(content) => blocks.push(file_block(file_id, &content)),
                Err(cause) => {
                    tracing::warn!(file_id = %file_id, cause = %cause, "Could not resolve file context");
                    failures.push(ContextFailure {
                        file_id: file_id.clone(),
                        cause,
                    });
                }
            }
        }

        tracing::debug!(
            "Resolved {} of {} files into context",
            blocks.len(),
            file_ids.len()
        );

        ResolvedContext {
            text: blocks.join("\n\n"),
            failures,
        }
    }
}
