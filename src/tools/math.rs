//! Arithmetic tools: addition and comparison.

use async_trait::async_trait;

use super::{ParamType, Tool, ToolArgs, ToolSpec};

/// Add two numbers.
pub struct Add;

#[async_trait]
impl Tool for Add {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("add", "Add two numbers and return their sum.")
            .param("a", ParamType::Number, "The first number")
            .param("b", ParamType::Number, "The second number")
    }

    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<String> {
        let sum = args.number("a")? + args.number("b")?;
        if !sum.is_finite() {
            anyhow::bail!("Result is not a finite number");
        }
        Ok(format_number(sum))
    }
}

/// Compare two numbers.
pub struct Compare;

#[async_trait]
impl Tool for Compare {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "compare",
            "Compare two numbers and report which one is larger.",
        )
        .param("a", ParamType::Number, "The first number")
        .param("b", ParamType::Number, "The second number")
    }

    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<String> {
        let a = args.number("a")?;
        let b = args.number("b")?;
        let (a_str, b_str) = (format_number(a), format_number(b));

        Ok(if a > b {
            format!("{} is greater than {}", a_str, b_str)
        } else if a < b {
            format!("{} is greater than {}", b_str, a_str)
        } else {
            format!("{} is equal to {}", a_str, b_str)
        })
    }
}

/// Render integral values without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
