//! String inspection tools.

use async_trait::async_trait;

use super::{ParamType, Tool, ToolArgs, ToolSpec};

/// Count how often a letter occurs in a string, ignoring case.
pub struct CountLetterInString;

#[async_trait]
impl Tool for CountLetterInString {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "count_letter_in_string",
            "Count the occurrences of a letter in a string (case-insensitive).",
        )
        .param("a", ParamType::String, "The string to search in")
        .param("b", ParamType::String, "The letter to count")
    }

    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<String> {
        let haystack = args.string("a")?.to_lowercase();
        let letter = args.string("b")?.to_lowercase();
        if letter.is_empty() {
            anyhow::bail!("The letter to count must not be empty");
        }

        let count = haystack.matches(letter.as_str()).count();
        Ok(format!(
            "The letter '{}' appears {} times in the string.",
            letter, count
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn counts_case_insensitively() {
        let tool = CountLetterInString;
        let args = tool
            .spec()
            .validate(&json!({"a": "Strawberry", "b": "R"}))
            .unwrap();
        let out = tool.execute(&args).await.unwrap();
        assert_eq!(out, "The letter 'r' appears 3 times in the string.");
    }

    #[tokio::test]
    async fn empty_letter_is_an_error() {
        let tool = CountLetterInString;
        let args = tool.spec().validate(&json!({"a": "abc", "b": ""})).unwrap();
        assert!(tool.execute(&args).await.is_err());
    }
}
