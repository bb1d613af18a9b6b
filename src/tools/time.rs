//! Clock tool.

use async_trait::async_trait;
use chrono::Local;

use super::{Tool, ToolArgs, ToolSpec};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Report the current local date and time.
pub struct CurrentDateTime;

#[async_trait]
impl Tool for CurrentDateTime {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_current_datetime",
            "Get the current local date and time, formatted as YYYY-MM-DD HH:MM:SS.",
        )
    }

    async fn execute(&self, _args: &ToolArgs) -> anyhow::Result<String> {
        Ok(Local::now().format(DATETIME_FORMAT).to_string())
    }
}
