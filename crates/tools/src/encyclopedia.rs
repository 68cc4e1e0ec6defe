//! Encyclopedia lookup through the MediaWiki API (Wikipedia by default).
//!
//! One search request, then one extract request per hit. Results are capped
//! in count and each extract is cut to a fixed number of characters.

use crate::http::{fetch_json, truncate_chars};
use async_trait::async_trait;
use henrybot_core::error::ToolError;
use henrybot_core::tool::{Tool, ToolResult, parse_arguments};
use serde::Deserialize;
use tracing::{debug, warn};

pub const NAME: &str = "lookup_encyclopedia";

const NO_RESULT: &str = "No good Wikipedia search result was found";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    query: String,
}

pub struct EncyclopediaTool {
    client: reqwest::Client,
    endpoint: String,
    top_k: usize,
    max_chars: usize,
}

impl EncyclopediaTool {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            top_k: 3,
            max_chars: 4000,
        }
    }

    pub fn with_limits(mut self, top_k: usize, max_chars: usize) -> Self {
        self.top_k = top_k.max(1);
        self.max_chars = max_chars.max(1);
        self
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let limit = self.top_k.to_string();
        let request = self.client.get(&self.endpoint).query(&[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", limit.as_str()),
            ("format", "json"),
            ("formatversion", "2"),
        ]);
        let response: SearchResponse = fetch_json(NAME, request).await?;
        Ok(response
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn page_extract(&self, title: &str) -> Result<Option<String>, ToolError> {
        let request = self.client.get(&self.endpoint).query(&[
            ("action", "query"),
            ("prop", "extracts"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("titles", title),
            ("format", "json"),
            ("formatversion", "2"),
        ]);
        let response: ExtractResponse = fetch_json(NAME, request).await?;
        Ok(response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .and_then(|page| page.extract)
            .filter(|text| !text.trim().is_empty()))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
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
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    extract: Option<String>,
}

#[async_trait]
impl Tool for EncyclopediaTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Look up a topic on Wikipedia. Returns the best matching pages with a plain-text summary of each."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Topic to look up, e.g. an artist or album name"
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

        let titles = self.search_titles(&args.query).await?;
        let mut summaries = Vec::new();

        for title in titles.iter().take(self.top_k) {
            match self.page_extract(title).await {
                Ok(Some(text)) => summaries.push(format!(
                    "Page: {title}\nSummary: {}",
                    truncate_chars(&text, self.max_chars)
                )),
                Ok(None) => debug!(%title, "Page has no extract"),
                // One bad page should not sink the others
                Err(e) => warn!(%title, error = %e, "Could not fetch page"),
            }
        }

        if summaries.is_empty() {
            return Ok(ToolResult::text(NO_RESULT));
        }
        Ok(ToolResult::text(summaries.join("\n\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::time::Duration;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/w/api.php")
    }

    async fn wiki(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        if params.get("list").map(String::as_str) == Some("search") {
            if params["srsearch"] == "nothing" {
                return Json(serde_json::json!({"query": {"search": []}}));
            }
            return Json(serde_json::json!({
                "query": {"search": [
                    {"title": "Band A"},
                    {"title": "Band A discography"},
                    {"title": "Band A (album)"},
                    {"title": "Band A tribute"}
                ]}
            }));
        }
        let title = params["titles"].clone();
        let extract = if title == "Band A" {
            "x".repeat(5000)
        } else {
            format!("{title} is related to Band A.")
        };
        Json(serde_json::json!({"query": {"pages": [{"title": title, "extract": extract}]}}))
    }

    fn tool(endpoint: String) -> EncyclopediaTool {
        EncyclopediaTool::new(crate::http::client(Duration::from_secs(5)), endpoint)
    }

    #[tokio::test]
    async fn caps_results_and_truncates_each() {
        let endpoint = serve(Router::new().route("/w/api.php", get(wiki))).await;

        let result = tool(endpoint)
            .execute(serde_json::json!({"query": "Band A"}))
            .await
            .unwrap();

        let pages: Vec<&str> = result.output.split("\n\n").collect();
        assert_eq!(pages.len(), 3);
        assert!(pages[0].starts_with("Page: Band A\nSummary: "));
        assert_eq!(pages[0].matches('x').count(), 4000);
        assert!(pages[2].contains("Band A (album)"));
        assert!(!result.output.contains("tribute"));
    }

    #[tokio::test]
    async fn no_hits_is_reported_as_text() {
        let endpoint = serve(Router::new().route("/w/api.php", get(wiki))).await;

        let result = tool(endpoint)
            .execute(serde_json::json!({"query": "nothing"}))
            .await
            .unwrap();
        assert_eq!(result.output, NO_RESULT);
    }

    #[tokio::test]
    async fn unknown_argument_is_rejected() {
        let err = tool("http://127.0.0.1:9/w/api.php".into())
            .execute(serde_json::json!({"query": "Band A", "lang": "de"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
