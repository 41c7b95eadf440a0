//! Web search tool backed by the DuckDuckGo HTML endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use super::Tool;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const MAX_RESULTS: usize = 10;

/// Search the web (no API key needed).
pub struct WebSearch {
    client: reqwest::Client,
}

impl WebSearch {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; ToolAgent/0.1)")
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for WebSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct SearchHit {
    title: String,
    snippet: String,
    url: String,
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns result titles, snippets and URLs."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;
        let limit = (args["num_results"].as_u64().unwrap_or(5) as usize).clamp(1, MAX_RESULTS);

        let url = format!("{}?q={}", SEARCH_URL, urlencoding::encode(query));
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("HTTP error: {}", status));
        }
        let html = response.text().await?;

        let hits = extract_ddg_results(&html, limit);
        if hits.is_empty() {
            Ok(json!(format!("No results found for: {}", query)))
        } else {
            Ok(serde_json::to_value(hits)?)
        }
    }
}

/// Pull result blocks out of the DuckDuckGo HTML page.
fn extract_ddg_results(html: &str, limit: usize) -> Vec<SearchHit> {
    html.split("class=\"result__body\"")
        .skip(1)
        .filter_map(|chunk| {
            let title = tag_text(chunk, "class=\"result__a\"")?;
            if title.is_empty() {
                return None;
            }
            Some(SearchHit {
                title: html_decode(title),
                snippet: html_decode(tag_text(chunk, "class=\"result__snippet\"").unwrap_or("")),
                url: tag_text(chunk, "class=\"result__url\"")
                    .unwrap_or("")
                    .trim()
                    .to_string(),
            })
        })
        .take(limit)
        .collect()
}

/// Text between the `>` following `marker` and the next `<`.
fn tag_text<'a>(chunk: &'a str, marker: &str) -> Option<&'a str> {
    chunk
        .split(marker)
        .nth(1)
        .and_then(|s| s.split('>').nth(1))
        .and_then(|s| s.split('<').next())
        .map(str::trim)
}

fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
