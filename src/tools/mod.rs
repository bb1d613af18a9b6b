//! Tool system.
//!
//! Tools are named, schema-described capabilities the model may ask the agent
//! to run. Every tool declares its parameters up front; the registry checks a
//! call's arguments against that declaration before the tool body ever runs.
//!
//! Built-in tools:
//! - `add`: sum of two numbers
//! - `compare`: which of two numbers is larger
//! - `count_letter_in_string`: case-insensitive letter count
//! - `get_current_datetime`: local date and time
//! - `search_wikipedia`: page summaries for a search query

mod math;
mod text;
mod time;
mod wikipedia;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::Config;

pub use math::{Add, Compare};
pub use text::CountLetterInString;
pub use time::CurrentDateTime;
pub use wikipedia::WikipediaSearch;

/// Failures raised by the registry.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool '{0}' is already registered")]
    DuplicateName(String),

    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {reason}")]
    ArgumentValidation { tool: String, reason: String },

    #[error("tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },
}

/// Semantic type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    Number,
    String,
    Boolean,
}

impl ParamType {
    fn json_type(self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::Integer => value.is_i64(),
            ParamType::Number => value.is_number(),
            ParamType::String => value.is_string(),
            ParamType::Boolean => value.is_boolean(),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
}

/// Name, description and ordered parameter list of a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Declare a required parameter.
    pub fn param(self, name: &str, kind: ParamType, description: &str) -> Self {
        self.push_param(name, kind, description, true)
    }

    /// Declare a parameter the caller may omit.
    pub fn optional_param(self, name: &str, kind: ParamType, description: &str) -> Self {
        self.push_param(name, kind, description, false)
    }

    fn push_param(
        mut self,
        name: &str,
        kind: ParamType,
        description: &str,
        required: bool,
    ) -> Self {
        self.parameters.push(ParamSpec {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required,
        });
        self
    }

    /// JSON Schema object describing the parameters, as sent to the model.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind.json_type(),
                    "description": param.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check `arguments` against the declared parameters.
    ///
    /// Arguments must be an object; every required parameter must be present
    /// and non-null, no undeclared key may appear, and each value must match
    /// its declared type.
    pub fn validate(&self, arguments: &Value) -> Result<ToolArgs, String> {
        let object = arguments.as_object().ok_or_else(|| {
            format!(
                "arguments must be a JSON object, got {}",
                value_kind(arguments)
            )
        })?;

        for param in &self.parameters {
            match object.get(&param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(format!("missing required argument '{}'", param.name));
                    }
                }
                Some(value) if !param.kind.accepts(value) => {
                    return Err(format!(
                        "argument '{}' must be {} {}, got {}",
                        param.name,
                        article(param.kind.json_type()),
                        param.kind.json_type(),
                        value_kind(value)
                    ));
                }
                Some(_) => {}
            }
        }

        if let Some(extra) = object
            .keys()
            .find(|key| !self.parameters.iter().any(|p| &p.name == *key))
        {
            return Err(format!("unexpected argument '{}'", extra));
        }

        Ok(ToolArgs(object.clone()))
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() => "integer",
        // Larger than i64::MAX; tools read integers as i64.
        Value::Number(n) if n.is_u64() => "integer out of range",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn article(word: &str) -> &'static str {
    if matches!(word.chars().next(), Some('a' | 'e' | 'i' | 'o' | 'u')) {
        "an"
    } else {
        "a"
    }
}

/// Arguments that passed validation against a tool's spec.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn integer(&self, name: &str) -> anyhow::Result<i64> {
        self.get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", name))
    }

    pub fn number(&self, name: &str) -> anyhow::Result<f64> {
        self.get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", name))
    }

    pub fn string(&self, name: &str) -> anyhow::Result<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", name))
    }

    pub fn boolean(&self, name: &str) -> anyhow::Result<bool> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", name))
    }
}

/// A callable the model can request by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declared name, description and parameters.
    fn spec(&self) -> ToolSpec;

    /// Run the tool on arguments that already match `spec()`.
    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<String>;
}

struct RegisteredTool {
    spec: ToolSpec,
    tool: Arc<dyn Tool>,
}

/// Fixed set of tools, looked up by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name from its spec.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), ToolError> {
        let spec = tool.spec();
        if self.by_name.contains_key(&spec.name) {
            return Err(ToolError::DuplicateName(spec.name));
        }
        self.by_name.insert(spec.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            spec,
            tool: Arc::new(tool),
        });
        Ok(())
    }

    /// Specs of all tools in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `arguments` and run the named tool.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> Result<String, ToolError> {
        let entry = self
            .by_name
            .get(name)
            .map(|&idx| &self.tools[idx])
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let args = entry
            .spec
            .validate(arguments)
            .map_err(|reason| ToolError::ArgumentValidation {
                tool: name.to_string(),
                reason,
            })?;

        tracing::debug!(tool = name, "Executing tool");

        entry
            .tool
            .execute(&args)
            .await
            .map_err(|e| ToolError::ToolExecution {
                tool: name.to_string(),
                message: format!("{:#}", e),
            })
    }
}

/// Registry with every built-in tool.
pub fn default_registry(config: &Config) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(CurrentDateTime)?;
    registry.register(Add)?;
    registry.register(Compare)?;
    registry.register(CountLetterInString)?;
    registry.register(WikipediaSearch::new(
        config.wikipedia_url.clone(),
        config.request_timeout,
    ))?;
    Ok(registry)
}
