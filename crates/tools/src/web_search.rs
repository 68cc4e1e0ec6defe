//! Web search through the Google Custom Search JSON API.
//!
//! Needs an API key and a programmable search engine id (`cx`). Without them
//! the tool still registers, but every call reports it is not configured so
//! the model can fall back to other tools.

use crate::http::fetch_json;
use async_trait::async_trait;
use henrybot_core::error::ToolError;
use henrybot_core::tool::{Tool, ToolResult, parse_arguments};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const NAME: &str = "search_web";

const DEFAULT_RESULTS: u8 = 5;
const MAX_RESULTS: u8 = 10;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    query: String,
    #[serde(default)]
    num_results: Option<u8>,
}

#[derive(Clone)]
pub struct GoogleCredentials {
    pub api_key: String,
    pub cse_id: String,
}

pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
    credentials: Option<GoogleCredentials>,
}

impl WebSearchTool {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        credentials: Option<GoogleCredentials>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            credentials,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SearchItem {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Search the web with Google. Returns a JSON list of results with title, link and snippet. \
         Useful for current events and for finding pages to browse."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "How many results to return (1-10, default 5)",
                    "minimum": 1,
                    "maximum": MAX_RESULTS
                }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_arguments(arguments)?;
        if args.query.trim().is_empty() {
            return Err(ToolError::InvalidArguments("'query' must not be empty".into()));
        }
        let num = args.num_results.unwrap_or(DEFAULT_RESULTS).clamp(1, MAX_RESULTS);

        let credentials = self.credentials.as_ref().ok_or_else(|| ToolError::NotConfigured {
            tool_name: NAME.into(),
            reason: "set GOOGLE_API_KEY and GOOGLE_CSE_ID to enable web search".into(),
        })?;

        let num_param = num.to_string();
        let request = self.client.get(&self.endpoint).query(&[
            ("key", credentials.api_key.as_str()),
            ("cx", credentials.cse_id.as_str()),
            ("q", args.query.as_str()),
            ("num", num_param.as_str()),
        ]);

        let response: SearchResponse = fetch_json(NAME, request).await?;
        debug!(query = %args.query, results = response.items.len(), "Web search complete");

        if response.items.is_empty() {
            return Ok(ToolResult::text("No good Google Search result was found"));
        }

        let items: Vec<SearchItem> = response.items.into_iter().take(num as usize).collect();
        let output = serde_json::to_string(&items)
            .map_err(|e| ToolError::failed(NAME, format!("could not encode results: {e}")))?;
        Ok(ToolResult::text(output))
    }
}
