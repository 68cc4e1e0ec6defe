//! Discord channel adapter.
//!
//! Outbound traffic (replies, typing indicator, message history) goes
//! through the Discord REST API with a bot token. Inbound events come from
//! whatever drives the gateway connection, which hands each message to
//! [`DiscordChannel::inject_message`] (or [`DiscordChannel::inject_event`]
//! with the raw `MESSAGE_CREATE` payload).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use henrybot_config::DiscordConfig;
use henrybot_core::channel::{Channel, ChannelId, ContentKind, InboundMessage, Origin};
use henrybot_core::error::ChannelError;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Discord refuses history pages larger than this.
const MAX_PAGE: usize = 100;

/// A message object as Discord serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordMessage {
    pub id: String,
    pub channel_id: String,
    pub author: DiscordUser,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
    #[serde(default)]
    pub embeds: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl From<DiscordMessage> for InboundMessage {
    fn from(msg: DiscordMessage) -> Self {
        let kind = if msg.attachments.is_empty() && msg.embeds.is_empty() {
            ContentKind::Text
        } else {
            ContentKind::Other
        };
        Self {
            id: msg.id,
            channel_id: ChannelId(msg.channel_id),
            author_name: msg.author.global_name.unwrap_or(msg.author.username),
            author_id: msg.author.id,
            content: msg.content,
            origin: if msg.author.bot { Origin::Bot } else { Origin::Human },
            kind,
            timestamp: msg.timestamp,
        }
    }
}

type InboundSender = mpsc::Sender<Result<InboundMessage, ChannelError>>;

pub struct DiscordChannel {
    client: reqwest::Client,
    api_url: String,
    token: String,
    inject_tx: tokio::sync::Mutex<Option<InboundSender>>,
}

impl DiscordChannel {
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("DiscordBot (henrybot, ", env!("CARGO_PKG_VERSION"), ")"))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            inject_tx: tokio::sync::Mutex::new(None),
        }
    }

    pub fn from_config(config: &DiscordConfig) -> Result<Self, ChannelError> {
        let token = config
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChannelError::NotConfigured("discord token is missing".into()))?;
        Ok(Self::new(token, &config.api_url))
    }

    /// Feed a message into the inbound stream.
    pub async fn inject_message(&self, msg: InboundMessage) -> Result<(), ChannelError> {
        let guard = self.inject_tx.lock().await;
        match guard.as_ref() {
            Some(tx) => tx
                .send(Ok(msg))
                .await
                .map_err(|_| ChannelError::ConnectionLost("Message channel closed".into())),
            None => Err(ChannelError::ConnectionLost("Channel not started".into())),
        }
    }

    /// Feed a raw `MESSAGE_CREATE` payload into the inbound stream.
    pub async fn inject_event(&self, payload: serde_json::Value) -> Result<(), ChannelError> {
        let msg: DiscordMessage = serde_json::from_value(payload)
            .map_err(|e| ChannelError::InvalidPayload(format!("MESSAGE_CREATE: {e}")))?;
        self.inject_message(msg.into()).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
    }

    async fn deliver(
        &self,
        channel_id: &ChannelId,
        request: reqwest::RequestBuilder,
    ) -> Result<(), ChannelError> {
        let failed = |reason: String| ChannelError::DeliveryFailed {
            channel: channel_id.to_string(),
            reason,
        };
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!("{status}: {body}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<InboundMessage, ChannelError>>, ChannelError> {
        info!(api = %self.api_url, "Discord channel starting");
        let (tx, rx) = mpsc::channel(64);
        *self.inject_tx.lock().await = Some(tx);
        Ok(rx)
    }

    async fn send(
        &self,
        channel_id: &ChannelId,
        content: &str,
        reply_to: Option<&str>,
    ) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({ "content": content });
        if let Some(message_id) = reply_to {
            body["message_reference"] = serde_json::json!({
                "message_id": message_id,
                "fail_if_not_exists": false
            });
        }

        let request = self
            .client
            .post(self.url(&format!("/channels/{channel_id}/messages")))
            .json(&body);
        self.deliver(channel_id, request).await?;
        debug!(channel = %channel_id, reply_to = ?reply_to, chars = content.chars().count(), "Discord message sent");
        Ok(())
    }

    async fn send_typing(&self, channel_id: &ChannelId) -> Result<(), ChannelError> {
        let request = self
            .client
            .post(self.url(&format!("/channels/{channel_id}/typing")));
        self.deliver(channel_id, request).await
    }

    async fn recent_messages(
        &self,
        channel_id: &ChannelId,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<InboundMessage>, ChannelError> {
        let unavailable = |reason: String| ChannelError::HistoryUnavailable {
            channel: channel_id.to_string(),
            reason,
        };

        let mut query = vec![("limit", limit.clamp(1, MAX_PAGE).to_string())];
        if let Some(id) = before {
            query.push(("before", id.to_string()));
        }
        let response = self
            .authorized(
                self.client
                    .get(self.url(&format!("/channels/{channel_id}/messages")))
                    .query(&query),
            )
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("Discord returned {status}")));
        }
        let messages: Vec<DiscordMessage> = response
            .json()
            .await
            .map_err(|e| unavailable(format!("unexpected payload: {e}")))?;
        Ok(messages.into_iter().map(InboundMessage::from).collect())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Discord channel stopping");
        *self.inject_tx.lock().await = None;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        let response = self
            .authorized(self.client.get(self.url("/users/@me")))
            .send()
            .await
            .map_err(|e| ChannelError::ConnectionLost(e.to_string()))?;
        Ok(response.status().is_success())
    }
}
