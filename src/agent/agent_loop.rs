//! Core agent loop implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{Config, DEFAULT_MAX_TURNS};
use crate::llm::{ChatMessage, CompletionClient, CompletionResult, LlmError, ToolCall};
use crate::tools::{ToolRegistry, ToolSpec};

use super::conversation::Conversation;
use super::prompt::build_system_prompt;

/// Answer returned when the model keeps requesting tools past the turn limit.
pub const MAX_TURNS_MESSAGE: &str = "unable to complete the request";

/// Where the agent is within a user turn.
///
/// `Done` marks a finished turn; the next [`Agent::run_turn`] passes back
/// through `AwaitingInput` before its first model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    AwaitingInput,
    ModelCall,
    ToolExecution,
    Done,
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The model produced a final answer
    Answered,
    /// The round-trip limit was reached first
    MaxTurnsExceeded,
}

/// Result of one user turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReport {
    pub answer: String,
    pub outcome: TurnOutcome,
    /// Completion requests made during the turn
    pub model_calls: usize,
    /// Tool invocations attempted during the turn, failed ones included
    pub tool_calls: usize,
}

/// A conversational agent owning one session's history.
pub struct Agent {
    llm: Arc<dyn CompletionClient>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_turns: usize,
    history: Conversation,
    state: AgentState,
}

impl Agent {
    /// Create an agent with an empty history, the default system prompt and
    /// the default turn limit.
    pub fn new(llm: Arc<dyn CompletionClient>, tools: Arc<ToolRegistry>) -> Self {
        let system_prompt = build_system_prompt(&tools.specs());
        Self {
            llm,
            tools,
            system_prompt,
            max_turns: DEFAULT_MAX_TURNS,
            history: Conversation::new(),
            state: AgentState::AwaitingInput,
        }
    }

    /// Create an agent using the turn limit and prompt override from `config`.
    pub fn from_config(
        config: &Config,
        llm: Arc<dyn CompletionClient>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let agent = Self::new(llm, tools).with_max_turns(config.max_turns);
        match &config.system_prompt {
            Some(prompt) => agent.with_system_prompt(prompt.clone()),
            None => agent,
        }
    }

    /// Limit model/tool round-trips per turn. Values below 1 are raised to 1.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn history(&self) -> &[ChatMessage] {
        self.history.messages()
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Answer one user message, returning only the text.
    pub async fn get_completion(&mut self, prompt: &str) -> Result<String, LlmError> {
        self.run_turn(prompt).await.map(|report| report.answer)
    }

    /// Answer one user message.
    ///
    /// Tool failures are fed back to the model as tool messages. Errors from
    /// the completion service end the turn and are returned to the caller;
    /// messages appended before the failure stay in the history.
    pub async fn run_turn(&mut self, prompt: &str) -> Result<TurnReport, LlmError> {
        self.state = AgentState::AwaitingInput;
        self.history.push(ChatMessage::user(prompt));
        let tool_specs = self.tools.specs();

        let mut model_calls = 0;
        let mut tool_calls = 0;

        for round in 0..self.max_turns {
            self.state = AgentState::ModelCall;
            tracing::debug!("Agent round {} of {}", round + 1, self.max_turns);

            let result = match self.call_model(&tool_specs).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Completion request failed: {}", e);
                    self.state = AgentState::AwaitingInput;
                    return Err(e);
                }
            };
            model_calls += 1;

            match result {
                CompletionResult::FinalAnswer(answer) => {
                    self.history.push(ChatMessage::assistant(answer.clone()));
                    self.state = AgentState::Done;
                    return Ok(TurnReport {
                        answer,
                        outcome: TurnOutcome::Answered,
                        model_calls,
                        tool_calls,
                    });
                }
                CompletionResult::ToolCall { content, calls } => {
                    self.state = AgentState::ToolExecution;
                    self.history
                        .push(ChatMessage::assistant_tool_calls(content, calls.clone()));

                    for call in &calls {
                        let output = self.execute_tool_call(call).await;
                        self.history.push(ChatMessage::tool(call.id.clone(), output));
                        tool_calls += 1;
                    }
                }
            }
        }

        tracing::warn!(
            "Max turns ({}) reached without a final answer",
            self.max_turns
        );
        self.history.push(ChatMessage::assistant(MAX_TURNS_MESSAGE));
        self.state = AgentState::Done;

        Ok(TurnReport {
            answer: MAX_TURNS_MESSAGE.to_string(),
            outcome: TurnOutcome::MaxTurnsExceeded,
            model_calls,
            tool_calls,
        })
    }

    async fn call_model(&self, tool_specs: &[ToolSpec]) -> Result<CompletionResult, LlmError> {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend_from_slice(self.history.messages());

        self.llm.complete(&messages, tool_specs).await
    }

    /// Execute a single tool call, rendering failures as text for the model.
    async fn execute_tool_call(&self, call: &ToolCall) -> String {
        tracing::info!(
            "Calling tool: {} with args: {}",
            call.name(),
            call.function.arguments
        );

        match self.tools.invoke(call.name(), &call.parsed_arguments()).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Tool call failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::tools::{ParamType, Tool, ToolArgs};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays canned replies and records every request it sees.
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<CompletionResult, LlmError>>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<CompletionResult, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolSpec],
        ) -> Result<CompletionResult, LlmError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Service("script exhausted".to_string())))
        }
    }

    /// Requests the same tool call forever.
    struct LoopingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for LoopingClient {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolSpec],
        ) -> Result<CompletionResult, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(tool_call(&format!("call_{n}"), "add", json!({"a": 1, "b": 1})))
        }
    }

    struct IntAdd {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for IntAdd {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new("add", "Add two integers")
                .param("a", ParamType::Integer, "first")
                .param("b", ParamType::Integer, "second")
        }

        async fn execute(&self, args: &ToolArgs) -> anyhow::Result<String> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok((args.integer("a")? + args.integer("b")?).to_string())
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl Tool for FailingLookup {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new("lookup", "Look something up")
        }

        async fn execute(&self, _args: &ToolArgs) -> anyhow::Result<String> {
            anyhow::bail!("index unavailable")
        }
    }

    fn tool_call(id: &str, name: &str, args: serde_json::Value) -> CompletionResult {
        CompletionResult::ToolCall {
            content: None,
            calls: vec![ToolCall::new(id, name, &args)],
        }
    }

    fn answer(text: &str) -> Result<CompletionResult, LlmError> {
        Ok(CompletionResult::FinalAnswer(text.to_string()))
    }

    fn registry() -> (Arc<ToolRegistry>, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry
            .register(IntAdd {
                runs: Arc::clone(&runs),
            })
            .unwrap();
        (Arc::new(registry), runs)
    }

    #[tokio::test]
    async fn final_answer_appends_user_and_assistant() {
        let (tools, _) = registry();
        let client = ScriptedClient::new(vec![answer("Hello there")]);
        let mut agent = Agent::new(client.clone(), tools);

        let reply = agent.get_completion("Hi").await.unwrap();

        assert_eq!(reply, "Hello there");
        assert_eq!(agent.history().len(), 2);
        assert_eq!(agent.history()[0], ChatMessage::user("Hi"));
        assert_eq!(agent.history()[1], ChatMessage::assistant("Hello there"));
        assert_eq!(agent.state(), AgentState::Done);
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn tool_call_then_answer() {
        let (tools, runs) = registry();
        let client = ScriptedClient::new(vec![
            Ok(tool_call("call_1", "add", json!({"a": 2, "b": 3}))),
            answer("5"),
        ]);
        let mut agent = Agent::new(client.clone(), tools);

        let report = agent.run_turn("what is 2+3?").await.unwrap();

        assert_eq!(report.answer, "5");
        assert_eq!(report.outcome, TurnOutcome::Answered);
        assert_eq!(report.model_calls, 2);
        assert_eq!(report.tool_calls, 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let history = agent.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].tool_calls.as_ref().map(Vec::len), Some(1));
        assert_eq!(history[2], ChatMessage::tool("call_1", "5"));
        assert_eq!(history[3], ChatMessage::assistant("5"));

        // The second request carries the tool result back to the model.
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[1].last(), Some(&ChatMessage::tool("call_1", "5")));
    }

    #[tokio::test]
    async fn looping_model_stops_at_turn_limit() {
        let (tools, runs) = registry();
        let client = Arc::new(LoopingClient {
            calls: AtomicUsize::new(0),
        });
        let mut agent = Agent::new(client.clone(), tools).with_max_turns(3);

        let report = agent.run_turn("loop forever").await.unwrap();

        assert_eq!(report.outcome, TurnOutcome::MaxTurnsExceeded);
        assert_eq!(report.answer, MAX_TURNS_MESSAGE);
        assert_eq!(report.model_calls, 3);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(
            agent.history().last(),
            Some(&ChatMessage::assistant(MAX_TURNS_MESSAGE))
        );
        // user + 3 * (assistant tool call + tool result) + final assistant
        assert_eq!(agent.history().len(), 8);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_message() {
        let (tools, _) = registry();
        let client = ScriptedClient::new(vec![
            Ok(tool_call("call_x", "unknown_tool", json!({}))),
            answer("I could not use that tool."),
        ]);
        let mut agent = Agent::new(client, tools);

        let reply = agent.get_completion("do something").await.unwrap();

        assert_eq!(reply, "I could not use that tool.");
        let tool_msg = &agent.history()[2];
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_x"));
        assert_eq!(tool_msg.text_content(), "Error: unknown tool 'unknown_tool'");
    }

    #[tokio::test]
    async fn invalid_arguments_are_reported_without_running_tool() {
        let (tools, runs) = registry();
        let client = ScriptedClient::new(vec![
            Ok(tool_call("call_1", "add", json!({"a": "two", "b": 3}))),
            answer("retrying is pointless"),
        ]);
        let mut agent = Agent::new(client, tools);

        agent.get_completion("what is two plus 3?").await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(agent.history()[2]
            .text_content()
            .starts_with("Error: invalid arguments for 'add'"));
    }

    #[tokio::test]
    async fn failing_tool_body_is_reported_and_turn_continues() {
        let mut registry = ToolRegistry::new();
        registry.register(FailingLookup).unwrap();
        let client = ScriptedClient::new(vec![
            Ok(tool_call("call_1", "lookup", json!({}))),
            answer("The lookup service is down."),
        ]);
        let mut agent = Agent::new(client.clone(), Arc::new(registry));

        let report = agent.run_turn("look it up").await.unwrap();

        assert_eq!(report.outcome, TurnOutcome::Answered);
        assert_eq!(report.answer, "The lookup service is down.");
        assert_eq!(report.tool_calls, 1);
        let tool_msg = &agent.history()[2];
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(
            tool_msg.text_content(),
            "Error: tool 'lookup' failed: index unavailable"
        );
        // The model saw the failure before answering.
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[1].last(), Some(tool_msg));
    }

    #[tokio::test]
    async fn multiple_tool_calls_run_in_order() {
        let (tools, runs) = registry();
        let client = ScriptedClient::new(vec![
            Ok(CompletionResult::ToolCall {
                content: Some("Let me add both.".to_string()),
                calls: vec![
                    ToolCall::new("c1", "add", &json!({"a": 1, "b": 2})),
                    ToolCall::new("c2", "add", &json!({"a": 10, "b": 20})),
                ],
            }),
            answer("3 and 30"),
        ]);
        let mut agent = Agent::new(client, tools);

        let report = agent.run_turn("add things").await.unwrap();

        assert_eq!(report.tool_calls, 2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        let history = agent.history();
        assert_eq!(history[1].text_content(), "Let me add both.");
        assert_eq!(history[2], ChatMessage::tool("c1", "3"));
        assert_eq!(history[3], ChatMessage::tool("c2", "30"));
    }

    #[tokio::test]
    async fn service_errors_propagate_and_keep_history() {
        let (tools, _) = registry();
        let client = ScriptedClient::new(vec![Err(LlmError::Auth("HTTP 401".to_string()))]);
        let mut agent = Agent::new(client, tools);

        let err = agent.get_completion("Hi").await.unwrap_err();

        assert!(matches!(err, LlmError::Auth(_)));
        assert_eq!(agent.history(), &[ChatMessage::user("Hi")]);
        assert_eq!(agent.state(), AgentState::AwaitingInput);
    }

    #[tokio::test]
    async fn state_returns_to_awaiting_input_between_turns() {
        let (tools, _) = registry();
        let client = ScriptedClient::new(vec![
            answer("first"),
            Err(LlmError::Service("HTTP 503".to_string())),
            answer("third"),
        ]);
        let mut agent = Agent::new(client, tools);

        agent.get_completion("one").await.unwrap();
        assert_eq!(agent.state(), AgentState::Done);

        agent.get_completion("two").await.unwrap_err();
        assert_eq!(agent.state(), AgentState::AwaitingInput);

        assert_eq!(agent.get_completion("three").await.unwrap(), "third");
        assert_eq!(agent.state(), AgentState::Done);
        // one + first, two (failed), three + third
        assert_eq!(agent.history().len(), 5);
    }

    #[tokio::test]
    async fn system_prompt_leads_every_request_but_is_not_stored() {
        let (tools, _) = registry();
        let client = ScriptedClient::new(vec![answer("one"), answer("two")]);
        let mut agent = Agent::new(client.clone(), tools).with_system_prompt("Be brief.");

        agent.get_completion("first").await.unwrap();
        agent.get_completion("second").await.unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        for request in requests.iter() {
            assert_eq!(request[0], ChatMessage::system("Be brief."));
        }
        // Second request sees the whole first exchange.
        assert_eq!(requests[1].len(), 4);
        assert!(agent.history().iter().all(|m| m.role != Role::System));
    }

    #[test]
    fn from_config_applies_turn_limit_and_prompt() {
        let (tools, _) = registry();
        let mut config = Config::new("key".to_string(), "model".to_string());
        config.max_turns = 4;
        config.system_prompt = Some("Custom prompt".to_string());

        let agent = Agent::from_config(&config, ScriptedClient::new(vec![]), tools);

        assert_eq!(agent.max_turns(), 4);
        assert_eq!(agent.system_prompt, "Custom prompt");
        assert_eq!(agent.state(), AgentState::AwaitingInput);
    }
}
