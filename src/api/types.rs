//! API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::TurnOutcome;
use crate::llm::ChatMessage;
use crate::tools::ToolSpec;

/// Request to send a user message to a session.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    /// The user's message text
    pub content: String,
}

/// The agent's answer to one user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    /// Final answer text shown to the user
    pub reply: String,

    /// Whether the model answered or the turn limit was hit
    pub outcome: TurnOutcome,

    /// Completion requests made for this message
    pub model_calls: usize,

    /// Tool invocations made for this message
    pub tool_calls: usize,
}

/// Full message history of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub id: Uuid,
    pub messages: Vec<ChatMessage>,
}

/// Tools available to every session.
#[derive(Debug, Clone, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolSpec>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Error body returned with every non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
