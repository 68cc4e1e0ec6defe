//! Channel trait: the abstraction over the chat platform.
//!
//! A [`Channel`] is a platform adapter (Discord, a test double, ...). It
//! yields [`InboundMessage`]s, sends replies, and exposes the recent message
//! log of a chat channel so history can be rebuilt per event.
//!
//! Note the two meanings of "channel": the adapter implements [`Channel`],
//! while [`ChannelId`] names the chat channel a message was posted in.

use crate::error::ChannelError;
use crate::message::Message;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the chat channel a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    #[default]
    Human,
    Bot,
}

/// What kind of payload a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Plain text only
    #[default]
    Text,
    /// Attachments, embeds, stickers or anything else besides text
    Other,
}

/// A message received from the chat platform. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Platform message id
    pub id: String,

    pub channel_id: ChannelId,

    /// Platform user id of the author
    pub author_id: String,

    /// Display name of the author
    pub author_name: String,

    pub content: String,

    #[serde(default)]
    pub origin: Origin,

    #[serde(default)]
    pub kind: ContentKind,

    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    /// A plain text message from a human, stamped now.
    pub fn text(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: ChannelId(channel_id.into()),
            author_id: author_id.into(),
            author_name: author_name.into(),
            content: content.into(),
            origin: Origin::Human,
            kind: ContentKind::Text,
            timestamp: Utc::now(),
        }
    }

    /// True when the message is text-only and has non-blank text.
    pub fn is_plain_text(&self) -> bool {
        self.kind == ContentKind::Text && !self.content.trim().is_empty()
    }
}

/// Recent messages of one chat channel, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    entries: Vec<InboundMessage>,
}

impl ConversationHistory {
    /// Build a history from entries that are already in chronological order.
    pub fn new(entries: Vec<InboundMessage>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[InboundMessage] {
        &self.entries
    }

    /// Convert to model turns.
    ///
    /// Messages written by `bot_id` become assistant turns; everything else is
    /// a user turn prefixed with the author's display name, since several
    /// people can talk in one channel.
    pub fn to_messages(&self, bot_id: &str) -> Vec<Message> {
        self.entries
            .iter()
            .map(|entry| {
                if entry.author_id == bot_id {
                    Message::assistant(&entry.content)
                } else {
                    Message::user(format!("{}: {}", entry.author_name, entry.content))
                }
            })
            .collect()
    }
}

/// The platform adapter trait.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable adapter name (e.g., "discord").
    fn name(&self) -> &str;

    /// Start listening; returns the stream of inbound events.
    async fn start(
        &self,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<InboundMessage, ChannelError>>, ChannelError>;

    /// Send `content` to a chat channel, optionally as a reply to a message.
    async fn send(
        &self,
        channel_id: &ChannelId,
        content: &str,
        reply_to: Option<&str>,
    ) -> Result<(), ChannelError>;

    /// Show a typing indicator (if the platform supports it).
    async fn send_typing(&self, _channel_id: &ChannelId) -> Result<(), ChannelError> {
        Ok(())
    }

    /// Up to `limit` messages of the channel posted before `before`
    /// (or the latest ones when `None`), in any order.
    async fn recent_messages(
        &self,
        channel_id: &ChannelId,
        _before: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<InboundMessage>, ChannelError> {
        Err(ChannelError::HistoryUnavailable {
            channel: channel_id.to_string(),
            reason: format!("{} does not keep a message log", self.name()),
        })
    }

    /// Stop the channel gracefully.
    async fn stop(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    /// Health check: is the channel connected and operational?
    async fn health_check(&self) -> Result<bool, ChannelError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn plain_text_detection() {
        let msg = InboundMessage::text("1", "music", "u1", "alice", "hello");
        assert!(msg.is_plain_text());

        let blank = InboundMessage::text("2", "music", "u1", "alice", "   ");
        assert!(!blank.is_plain_text());

        let mut attachment = InboundMessage::text("3", "music", "u1", "alice", "look");
        attachment.kind = ContentKind::Other;
        assert!(!attachment.is_plain_text());
    }

    #[test]
    fn history_maps_roles_by_author() {
        let history = ConversationHistory::new(vec![
            InboundMessage::text("1", "music", "u1", "alice", "who is in Band A?"),
            InboundMessage::text("2", "music", "bot", "Henry", "Band A is a trio."),
        ]);
        let turns = history.to_messages("bot");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "alice: who is in Band A?");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].content, "Band A is a trio.");
    }

    #[test]
    fn inbound_message_serialization() {
        let msg = InboundMessage::text("1", "music", "u1", "alice", "hi");
        let json = serde_json::to_string(&msg).unwrap();
        let back: InboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
