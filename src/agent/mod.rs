//! Agent module - the single-turn tool-calling loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Append the user's message to the session history
//! 2. Call the completion service with the history and available tools
//! 3. If the model requests tool calls, execute them and feed the results back
//! 4. Repeat until the model produces a final answer or the turn limit is hit

mod agent_loop;
mod conversation;
mod prompt;

pub use agent_loop::{Agent, AgentState, TurnOutcome, TurnReport, MAX_TURNS_MESSAGE};
pub use conversation::Conversation;
pub use prompt::build_system_prompt;
