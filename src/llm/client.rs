//! Client for OpenAI-compatible chat-completion endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChatMessage, CompletionClient, CompletionResult, LlmError, ToolCall};
use crate::config::Config;
use crate::tools::ToolSpec;

/// Error bodies are cut to this many characters before they reach logs or callers.
const MAX_ERROR_BODY: usize = 500;

/// Non-streaming client for `POST {base_url}/chat/completions`.
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSchema<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ToolSchema<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionSchema<'a>,
}

#[derive(Serialize)]
struct FunctionSchema<'a> {
    name: &'a str,
    description: &'a str,
    parameters: Value,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

impl OpenAiCompatibleClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Service(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Self::new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.default_model.clone(),
            config.request_timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Service(format!("request failed: {}", err))
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatibleClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<CompletionResult, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            tools: tools
                .iter()
                .map(|spec| ToolSchema {
                    kind: "function",
                    function: FunctionSchema {
                        name: &spec.name,
                        description: &spec.description,
                        parameters: spec.parameters_schema(),
                    },
                })
                .collect(),
            stream: false,
        };

        tracing::debug!(
            model = %self.model,
            url = %url,
            messages = messages.len(),
            tools = tools.len(),
            "Calling completion service"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(&text, MAX_ERROR_BODY)
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Auth(detail),
                _ => LlmError::Service(detail),
            });
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            LlmError::Service(format!(
                "malformed response ({}): {}",
                e,
                truncate(&text, MAX_ERROR_BODY)
            ))
        })?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| LlmError::Service("response contained no choices".to_string()))?;

        match message.tool_calls {
            Some(calls) if !calls.is_empty() => Ok(CompletionResult::ToolCall {
                content: message.content.filter(|c| !c.trim().is_empty()),
                calls,
            }),
            _ => message
                .content
                .map(CompletionResult::FinalAnswer)
                .ok_or_else(|| LlmError::Service("LLM returned empty response".to_string())),
        }
    }
}

/// Truncate a string for error reporting.
fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}... [truncated]", &s[..idx]),
        None => s.to_string(),
    }
}
