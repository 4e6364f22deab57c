//! The external completion-service seam.
//!
//! The engine never talks to a model endpoint directly. Conductors,
//! participants, and composition generators hold an `Arc<dyn Completion>`
//! and send role-tagged turns; retries, backoff, and transport belong to
//! the implementation behind the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role in a completion conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (instructions).
    System,
    /// User message.
    User,
    /// Assistant (model) message.
    Assistant,
}

/// One role-tagged turn sent to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// The role of the turn's author.
    pub role: Role,
    /// The turn text.
    pub content: String,
}

impl ChatTurn {
    /// A system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Description of a tool that may be offered to the completion service
/// alongside the conversation turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input.
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    /// Create a tool definition with an open input schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({ "type": "object" }),
        }
    }

    /// Replace the input schema.
    pub fn with_input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Errors from completion services.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP or network request failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The service rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// Authentication/authorization failed.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// Could not parse the service's response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl CompletionError {
    /// Whether retrying this request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::RateLimited | CompletionError::RequestFailed(_)
        )
    }
}

/// External chat-completion capability.
///
/// Given an ordered sequence of role-tagged turns (and optional tool
/// definitions), produce generated text. The engine treats the call as a
/// single suspension point; any retry policy lives behind this trait.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Generate text for the given turns.
    async fn complete(
        &self,
        turns: &[ChatTurn],
        tools: &[ToolDefinition],
    ) -> Result<String, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_error_retryable() {
        assert!(CompletionError::RateLimited.is_retryable());
        assert!(CompletionError::RequestFailed("timeout".into()).is_retryable());
        assert!(!CompletionError::AuthFailed("bad key".into()).is_retryable());
        assert!(!CompletionError::InvalidResponse("x".into()).is_retryable());
    }

    #[test]
    fn chat_turn_constructors() {
        assert_eq!(ChatTurn::system("s").role, Role::System);
        assert_eq!(ChatTurn::user("u").role, Role::User);
        assert_eq!(ChatTurn::assistant("a").role, Role::Assistant);
    }

    #[test]
    fn role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }
}
