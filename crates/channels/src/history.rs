//! Recent conversation context for an admitted message.

use henrybot_core::channel::{Channel, ConversationHistory, InboundMessage};
use tracing::{debug, warn};

/// Up to `limit` text messages posted in the channel before `msg`, oldest
/// first. An unavailable log yields an empty history.
pub async fn collect_history(
    channel: &dyn Channel,
    msg: &InboundMessage,
    limit: usize,
) -> ConversationHistory {
    if limit == 0 {
        return ConversationHistory::empty();
    }

    let mut entries = match channel
        .recent_messages(&msg.channel_id, Some(&msg.id), limit)
        .await
    {
        Ok(entries) => entries,
        Err(e) => {
            warn!(channel = %msg.channel_id, error = %e, "History unavailable, answering without it");
            return ConversationHistory::empty();
        }
    };

    let fetched = entries.len();
    entries.retain(|entry| entry.id != msg.id && entry.is_plain_text());
    entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    if entries.len() > limit {
        entries.drain(..entries.len() - limit);
    }

    debug!(channel = %msg.channel_id, fetched, kept = entries.len(), "Collected history");
    ConversationHistory::new(entries)
}
