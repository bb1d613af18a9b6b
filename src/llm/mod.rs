//! LLM access: conversation types and the chat-completion client.

mod client;
mod types;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::tools::ToolSpec;

pub use client::OpenAiCompatibleClient;
pub use types::{ChatMessage, CompletionResult, FunctionCall, Role, ToolCall};

/// Failures talking to the completion service.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion service rejected credentials: {0}")]
    Auth(String),

    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),

    #[error("completion service error: {0}")]
    Service(String),
}

/// A chat-completion backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the conversation and tool declarations; return the model's reply.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<CompletionResult, LlmError>;
}
