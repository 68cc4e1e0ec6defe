//! Per-message control flow: guard, history, agent, delivery.

use chrono::Utc;
use henrybot_agent::ChatOrchestrator;
use henrybot_channels::{Admission, GuardChain, collect_history, split_response};
use henrybot_config::DiscordConfig;
use henrybot_core::channel::{Channel, InboundMessage};
use henrybot_core::event::{DomainEvent, EventBus};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct MessagePipeline {
    channel: Arc<dyn Channel>,
    orchestrator: Arc<ChatOrchestrator>,
    guards: GuardChain,
    bot_id: String,
    history_limit: usize,
    message_limit: usize,
    events: EventBus,
}

impl MessagePipeline {
    pub fn new(
        channel: Arc<dyn Channel>,
        orchestrator: Arc<ChatOrchestrator>,
        config: &DiscordConfig,
        events: EventBus,
    ) -> Self {
        Self {
            channel,
            orchestrator,
            guards: GuardChain::from_config(config),
            bot_id: config.bot_id.clone(),
            history_limit: config.history_limit,
            message_limit: config.message_limit.max(1),
            events,
        }
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    /// Handle one inbound message.
    ///
    /// Returns the answer when it fits in a single platform message; the
    /// caller sends it as a reply. Longer answers are delivered here as
    /// fragments and `None` is returned, as it is for rejected messages,
    /// empty answers and model failures.
    pub async fn on_message(&self, msg: &InboundMessage) -> Option<String> {
        if let Admission::Rejected(guard) = self.guards.check(msg) {
            debug!(message = %msg.id, %guard, "Message ignored");
            return None;
        }

        info!(message = %msg.id, channel = %msg.channel_id, author = %msg.author_id, "Message admitted");
        self.events.publish(DomainEvent::MessageAdmitted {
            channel_id: msg.channel_id.to_string(),
            message_id: msg.id.clone(),
            author_id: msg.author_id.clone(),
            timestamp: Utc::now(),
        });

        if let Err(e) = self.channel.send_typing(&msg.channel_id).await {
            debug!(error = %e, "Typing indicator failed");
        }

        let history = collect_history(self.channel.as_ref(), msg, self.history_limit).await;

        let run = match self.orchestrator.run(&msg.content, history, &self.bot_id).await {
            Ok(run) => run,
            Err(e) => {
                error!(message = %msg.id, error = %e, "Agent run failed, not replying");
                self.events.publish(DomainEvent::ErrorOccurred {
                    context: format!("message {}", msg.id),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                return None;
            }
        };
        info!(
            message = %msg.id,
            steps = run.steps.len(),
            model_calls = run.model_calls,
            forced = run.was_forced(),
            "Agent run complete"
        );

        let Some(answer) = run.answer() else {
            warn!(message = %msg.id, "Agent produced an empty answer");
            return None;
        };

        if answer.chars().count() < self.message_limit {
            return Some(answer.to_string());
        }

        self.deliver_fragments(msg, answer).await;
        None
    }

    /// Send a single-message answer as a reply to `msg`.
    pub async fn reply(&self, msg: &InboundMessage, answer: &str) {
        match self.channel.send(&msg.channel_id, answer, Some(&msg.id)).await {
            Ok(()) => self.delivered(msg, 1),
            Err(e) => error!(message = %msg.id, error = %e, "Could not send reply"),
        }
    }

    async fn deliver_fragments(&self, msg: &InboundMessage, answer: &str) {
        let fragments = split_response(answer, self.message_limit);
        debug!(message = %msg.id, fragments = fragments.len(), "Answer split for delivery");

        for (i, fragment) in fragments.iter().enumerate() {
            let reply_to = (i == 0).then_some(msg.id.as_str());
            if let Err(e) = self.channel.send(&msg.channel_id, fragment, reply_to).await {
                error!(message = %msg.id, fragment = i, error = %e, "Could not send fragment, dropping the rest");
                return;
            }
        }
        self.delivered(msg, fragments.len());
    }

    fn delivered(&self, msg: &InboundMessage, fragments: usize) {
        self.events.publish(DomainEvent::ResponseDelivered {
            channel_id: msg.channel_id.to_string(),
            fragments,
            timestamp: Utc::now(),
        });
    }
}
