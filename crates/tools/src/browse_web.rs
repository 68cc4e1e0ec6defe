//! Fetch a web page and have the chat model summarize it.
//!
//! The page is reduced to visible text and cut into overlapping windows.
//! With a task, the windows closest to the task (by embedding similarity)
//! are summarized; without one, the leading windows are. Links found on the
//! page are appended so the model can browse further.

use crate::html::{HtmlCleaner, Link};
use crate::http::{fetch_text, truncate_chars};
use async_trait::async_trait;
use henrybot_core::error::ToolError;
use henrybot_core::message::Message;
use henrybot_core::provider::{Provider, ProviderRequest};
use henrybot_core::tool::{Tool, ToolResult, parse_arguments};
use henrybot_core::Embedder;
use henrybot_memory::cosine_similarity;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "browse_web";

const WINDOW_CHARS: usize = 2000;
const WINDOW_OVERLAP: usize = 200;
const RELEVANT_WINDOWS: usize = 4;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    url: String,
    #[serde(default)]
    task: Option<String>,
}

/// The chat model used for one-shot summaries, outside the agent loop.
#[derive(Clone)]
pub struct ChatModel {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ChatModel {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    async fn summarize(&self, text: &str, task: Option<&str>) -> Result<String, ToolError> {
        let wanted = task.unwrap_or("a summary");
        let prompt = format!(
            "{text}\n\n---\n\nI need {wanted} from the above text. Answer briefly and keep every \
             fact, name, date and number that matters. If the text does not cover it, summarize \
             the text instead."
        );
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: 0.0,
            max_tokens: None,
            top_p: None,
            tools: Vec::new(),
        };
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| ToolError::failed(NAME, format!("summary failed: {e}")))?;
        Ok(response.message.content.trim().to_string())
    }
}

pub struct BrowseWebTool {
    client: reqwest::Client,
    cleaner: HtmlCleaner,
    embedder: Arc<dyn Embedder>,
    chat: ChatModel,
    max_chars: usize,
    max_links: usize,
}

impl BrowseWebTool {
    pub fn new(
        client: reqwest::Client,
        embedder: Arc<dyn Embedder>,
        chat: ChatModel,
    ) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            client,
            cleaner: HtmlCleaner::new()?,
            embedder,
            chat,
            max_chars: 12_000,
            max_links: 5,
        })
    }

    pub fn with_limits(mut self, max_chars: usize, max_links: usize) -> Self {
        self.max_chars = max_chars.max(WINDOW_CHARS);
        self.max_links = max_links;
        self
    }

    /// The text handed to the summarizer, at most `max_chars` long.
    async fn select_text(&self, text: &str, task: Option<&str>) -> Result<String, ToolError> {
        let windows = windows(text, WINDOW_CHARS, WINDOW_OVERLAP);
        let chosen: Vec<&str> = match task {
            Some(task) if windows.len() > RELEVANT_WINDOWS => {
                self.most_relevant(&windows, task).await?
            }
            _ => windows.iter().map(String::as_str).collect(),
        };
        Ok(truncate_chars(&chosen.join("\n\n"), self.max_chars))
    }

    async fn most_relevant<'a>(
        &self,
        windows: &'a [String],
        task: &str,
    ) -> Result<Vec<&'a str>, ToolError> {
        let embeddings = self
            .embedder
            .embed_documents(windows)
            .await
            .map_err(|e| ToolError::failed(NAME, e))?;
        let query = self
            .embedder
            .embed_query(task)
            .await
            .map_err(|e| ToolError::failed(NAME, e))?;

        let mut scored: Vec<(usize, f32)> = embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(&query, e)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        // Best first, so the length cap trims the least relevant text
        scored.truncate(RELEVANT_WINDOWS);

        debug!(windows = windows.len(), picked = scored.len(), "Ranked page windows");
        Ok(scored.into_iter().map(|(i, _)| windows[i].as_str()).collect())
    }
}

/// Overlapping character windows over `text`.
fn windows(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = size.saturating_sub(overlap).max(1);
    let mut out = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        out.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    out
}

fn render_links(links: &[Link]) -> String {
    links
        .iter()
        .map(|l| format!("- [{}]({})", l.text, l.url))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Tool for BrowseWebTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Open a web page and summarize it. Give a task to focus the summary on what you need, \
         e.g. 'the band members and their instruments'. Also lists links found on the page."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http(s) URL of the page"
                },
                "task": {
                    "type": "string",
                    "description": "What you want to learn from the page"
                }
            },
            "required": ["url"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_arguments(arguments)?;
        let url = reqwest::Url::parse(args.url.trim())
            .map_err(|e| ToolError::InvalidArguments(format!("'url' is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ToolError::InvalidArguments("'url' must be http or https".into()));
        }
        let task = args.task.as_deref().map(str::trim).filter(|t| !t.is_empty());

        let html = fetch_text(NAME, self.client.get(url.clone())).await?;
        let text = self.cleaner.to_text(&html);
        if text.is_empty() {
            return Ok(ToolResult::text(format!("The page at {url} has no readable text.")));
        }

        let selected = self.select_text(&text, task).await?;
        let summary = self.chat.summarize(&selected, task).await?;

        let links: Vec<Link> = self
            .cleaner
            .links(&html, &url)
            .into_iter()
            .take(self.max_links)
            .collect();
        debug!(%url, text_chars = text.chars().count(), links = links.len(), "Browsed page");

        if links.is_empty() {
            return Ok(ToolResult::text(summary));
        }
        Ok(ToolResult::text(format!(
            "{summary}\n\nRelevant Links:\n{}",
            render_links(&links)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::response::Html;
    use axum::routing::get;
    use henrybot_core::error::ProviderError;
    use henrybot_core::provider::ProviderResponse;
    use henrybot_memory::HashingEmbedder;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers every request with a fixed text and keeps the prompts it saw.
    struct RecordingProvider {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            assert!(request.tools.is_empty());
            let prompt = request.messages[0].content.clone();
            self.prompts.lock().unwrap().push(prompt);
            Ok(ProviderResponse {
                message: Message::assistant("Band A formed in 1987."),
                usage: None,
                model: request.model,
            })
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn tool(provider: Arc<RecordingProvider>) -> BrowseWebTool {
        BrowseWebTool::new(
            crate::http::client(Duration::from_secs(5)),
            Arc::new(HashingEmbedder::default()),
            ChatModel::new(provider, "test-model"),
        )
        .unwrap()
    }

    fn recorder() -> Arc<RecordingProvider> {
        Arc::new(RecordingProvider {
            prompts: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn summarizes_page_and_lists_links() {
        let page = r#"<html><body><h1>Band A</h1><p>Band A formed in 1987 in Oakland.</p>
            <a href="/discography">Discography</a>
            <a href="https://www.metal-archives.com/bands/Band_A">Metal Archives</a></body></html>"#;
        let base = serve(Router::new().route("/band-a", get(move || async move { Html(page) }))).await;
        let provider = recorder();

        let result = tool(provider.clone())
            .execute(serde_json::json!({"url": format!("{base}/band-a"), "task": "when the band formed"}))
            .await
            .unwrap();

        assert!(result.output.starts_with("Band A formed in 1987."));
        assert!(result.output.contains("Relevant Links:"));
        assert!(result.output.contains(&format!("- [Discography]({base}/discography)")));

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("formed in 1987 in Oakland"));
        assert!(prompts[0].contains("I need when the band formed"));
        assert!(!prompts[0].contains("<p>"));
    }

    #[tokio::test]
    async fn task_picks_the_relevant_window() {
        let filler = "Lorem ipsum dolor sit amet consectetur. ".repeat(300);
        let page = format!(
            "<html><body><p>{filler}</p><p>The drummer of Band A is John Roe who joined in 1990.</p><p>{filler}</p></body></html>"
        );
        let base = serve(Router::new().route("/long", get(move || async move { Html(page) }))).await;
        let provider = recorder();

        tool(provider.clone())
            .with_limits(2000, 5)
            .execute(serde_json::json!({"url": format!("{base}/long"), "task": "drummer of Band A John Roe"}))
            .await
            .unwrap();

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("John Roe"));
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let err = tool(recorder())
            .execute(serde_json::json!({"url": "ftp://example.org/file"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));

        let err = tool(recorder())
            .execute(serde_json::json!({"url": "not a url"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn windows_overlap_and_cover_everything() {
        let text: String = ('a'..='z').cycle().take(4500).collect();
        let w = windows(&text, 2000, 200);
        assert_eq!(w.len(), 3);
        assert_eq!(w[0].chars().count(), 2000);
        assert_eq!(&w[0][1800..], &w[1][..200]);
        assert!(text.ends_with(w[2].as_str()));
        assert!(windows("", 2000, 200).is_empty());
    }
}
