//! Client module for the local language-model server.
//!
//! Provides a trait-based abstraction over completion endpoints, with the
//! LM Studio local API as the primary implementation. The enhancement
//! pipeline only depends on the [`CompletionClient`] trait so tests can
//! substitute a scripted client.

mod error;
mod lmstudio;

pub use error::LlmError;
pub use lmstudio::{LmStudioClient, LmStudioHealth};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        ChatMessage {
            role,
            content: content.into(),
        }
    }
}

/// Result of a completion request.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Generated text, trimmed.
    pub text: String,
    /// Total tokens consumed, if the server reported usage.
    pub total_tokens: u64,
}

/// Trait for completion clients.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send a plain text-completion request.
    async fn text_completion(&self, prompt: &str) -> Result<Completion, LlmError>;

    /// Send a chat-completion request.
    async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError>;
}
