//! Prompt assembly
//!
//! This module merges resolved file context with the user's message into
//! the single prompt string every provider adapter receives. The layout is
//! fixed so evaluations and regression tests can assert on it byte for byte.

/// Label that opens the context section
pub const CONTEXT_LABEL: &str = "Context:";

/// Label that opens the question section
pub const QUESTION_LABEL: &str = "Question:";

/// Builds the provider-ready prompt
///
/// With no context (empty or whitespace only) the message is returned
/// unchanged. Otherwise the result is:
///
/// ```text
/// Context:
/// <context>
///
/// Question:
/// <message>
/// ```
///
/// # Arguments
///
/// * `message` - The user's message
/// * `context` - Resolved file context, possibly empty
///
/// # Examples
///
/// ```
/// use multichat::prompts::assemble;
///
/// assert_eq!(assemble("Hi", ""), "Hi");
/// assert_eq!(assemble("Hi", "ctx"), "Context:\nctx\n\nQuestion:\nHi");
/// ```
pub fn assemble(message: &str, context: &str) -> String {
    if context.trim().is_empty() {
        return message.to_string();
    }

    format!(
        "{}\n{}\n\n{}\n{}",
        CONTEXT_LABEL, context, QUESTION_LABEL, message
    )
}
