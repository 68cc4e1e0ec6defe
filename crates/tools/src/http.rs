//! Shared HTTP plumbing for tools that call out to the web.

use henrybot_core::error::ToolError;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client used by every outbound tool. Carries the per-request timeout.
pub fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("HenryBot/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Send `request` and read the body as text, failing on non-2xx.
pub async fn fetch_text(tool: &str, request: reqwest::RequestBuilder) -> Result<String, ToolError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ToolError::failed(tool, "request timed out")
        } else {
            ToolError::failed(tool, format!("request failed: {e}"))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let preview: String = body.chars().take(200).collect();
        return Err(ToolError::failed(tool, format!("upstream returned {status}: {preview}")));
    }

    response
        .text()
        .await
        .map_err(|e| ToolError::failed(tool, format!("could not read body: {e}")))
}

pub async fn fetch_json<T: DeserializeOwned>(
    tool: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, ToolError> {
    let body = fetch_text(tool, request).await?;
    serde_json::from_str(&body).map_err(|e| ToolError::failed(tool, format!("unexpected response: {e}")))
}

/// Keep the first `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("Motörhead", 4), "Motö");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
