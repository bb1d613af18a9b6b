//! System prompt templates for the agent.

use crate::tools::ToolSpec;

/// Build the default system prompt with tool descriptions.
pub fn build_system_prompt(tools: &[ToolSpec]) -> String {
    let tool_descriptions = if tools.is_empty() {
        "(no tools available)".to_string()
    } else {
        tools
            .iter()
            .map(|t| format!("- **{}**: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are Tiny Agent, a helpful AI assistant. Always reply in the same language the user writes in.

## Tools

When answering a question requires one of the following tools, call the appropriate tool instead of guessing:
{tool_descriptions}

## Rules

1. **Use tools for facts you cannot know** - the current date and time, arithmetic on large or precise numbers, letter counts and encyclopedic lookups should go through a tool.

2. **Read tool results carefully** - if a tool reports an error, fix the arguments and try again, or explain the problem to the user.

3. **Be concise** - once you have what you need, answer directly."#,
        tool_descriptions = tool_descriptions
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ParamType;

    #[test]
    fn lists_every_tool() {
        let tools = vec![
            ToolSpec::new("add", "Add two numbers."),
            ToolSpec::new("compare", "Compare two numbers.")
                .param("a", ParamType::Number, "first")
                .param("b", ParamType::Number, "second"),
        ];
        let prompt = build_system_prompt(&tools);
        assert!(prompt.contains("- **add**: Add two numbers."));
        assert!(prompt.contains("- **compare**: Compare two numbers."));
    }

    #[test]
    fn handles_empty_tool_list() {
        assert!(build_system_prompt(&[]).contains("(no tools available)"));
    }
}
