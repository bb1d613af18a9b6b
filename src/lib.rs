//! # Tiny Agent
//!
//! A chat service backed by a single-turn, tool-calling LLM agent.
//!
//! This library provides:
//! - A registry of schema-validated tools (arithmetic, letter counting,
//!   date lookup, comparison, Wikipedia search)
//! - A client for OpenAI-compatible chat-completion services
//! - An agent loop that resolves tool calls until the model answers
//! - Per-session conversation state and an HTTP API for a chat front end
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a user message for a session
//! 2. Send the system prompt, session history and tool schemas to the model
//! 3. Execute any requested tool calls and append their results
//! 4. Repeat until the model answers or the turn limit is reached
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tiny_agent::{agent::Agent, config::Config, llm::OpenAiCompatibleClient, tools};
//!
//! let config = Config::from_env()?;
//! let llm = Arc::new(OpenAiCompatibleClient::from_config(&config)?);
//! let tools = Arc::new(tools::default_registry(&config)?);
//! let mut agent = Agent::from_config(&config, llm, tools);
//! let reply = agent.get_completion("What time is it?").await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod session;
pub mod tools;

pub use config::Config;
