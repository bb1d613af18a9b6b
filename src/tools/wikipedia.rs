//! Wikipedia search tool.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ParamType, Tool, ToolArgs, ToolSpec};

/// Number of result pages summarized per search.
const MAX_PAGES: usize = 3;

/// Search Wikipedia and return summaries of the top pages.
pub struct WikipediaSearch {
    base_url: String,
    timeout: Duration,
}

impl WikipediaSearch {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    extract: String,
}

#[async_trait]
impl Tool for WikipediaSearch {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "search_wikipedia",
            "Search Wikipedia and return summaries of the most relevant pages. Use for factual or encyclopedic questions.",
        )
        .param("query", ParamType::String, "The search query")
    }

    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<String> {
        let query = args.string("query")?;

        let client = reqwest::Client::builder()
            .user_agent("TinyAgent/0.1 (chat demo)")
            .timeout(self.timeout)
            .build()?;

        let limit = MAX_PAGES.to_string();
        let response = client
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("Wikipedia search failed: HTTP {}", status));
        }

        let titles: Vec<String> = response
            .json::<SearchResponse>()
            .await?
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default();

        let mut summaries = Vec::new();
        for title in titles.iter().take(MAX_PAGES) {
            match fetch_summary(&client, &self.base_url, title).await {
                Ok(Some(extract)) => {
                    summaries.push(format!("Page: {}\nSummary: {}", title, extract));
                }
                Ok(None) => {}
                Err(e) => {
                    // Missing or disambiguation pages are skipped, not fatal.
                    tracing::warn!(page = %title, "Skipping Wikipedia page: {}", e);
                }
            }
        }

        if summaries.is_empty() {
            Ok(format!("No Wikipedia results found for: {}", query))
        } else {
            Ok(summaries.join("\n\n"))
        }
    }
}

async fn fetch_summary(
    client: &reqwest::Client,
    base_url: &str,
    title: &str,
) -> anyhow::Result<Option<String>> {
    let slug = urlencoding::encode(&title.replace(' ', "_")).into_owned();
    let url = format!("{}/api/rest_v1/page/summary/{}", base_url, slug);

    let response = client.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow::anyhow!("HTTP {}", status));
    }

    let summary: PageSummary = response.json().await?;
    let extract = summary.extract.trim();
    Ok((!extract.is_empty()).then(|| extract.to_string()))
}
