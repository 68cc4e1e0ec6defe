//! The chat orchestrator: a bounded tool-calling loop.
//!
//! Each run builds the prompt from the system persona, the conversation
//! history and the new input, then alternates between asking the model and
//! running the tools it requested. Tool results go back to the model through
//! the scratchpad until it answers in plain text or the iteration cap is hit.
//!
//! A run makes at most `max_iterations + 1` model calls. Only a model
//! failure aborts it; tool problems are reported to the model as text.

use crate::prompt::system_prompt;
use chrono::Utc;
use henrybot_config::AppConfig;
use henrybot_core::agent::{AgentRun, EarlyStopping, StopReason};
use henrybot_core::channel::ConversationHistory;
use henrybot_core::error::ProviderError;
use henrybot_core::event::{DomainEvent, EventBus};
use henrybot_core::message::Message;
use henrybot_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
use henrybot_core::tool::{ToolInvocation, ToolRegistry};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Returned when the iteration cap is reached and no answer could be produced.
pub const STOP_MESSAGE: &str =
    "Sorry, I ran out of steps before I could put together a good answer. Try asking again, maybe a bit more specifically.";

const FINAL_ANSWER_INSTRUCTION: &str = "You cannot use any more tools. Using only the information \
gathered above, give your best final answer to the original question now, with sources.";

pub struct ChatOrchestrator {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    top_p: Option<f32>,
    max_iterations: u32,
    early_stopping: EarlyStopping,
    events: Option<EventBus>,
}

impl ChatOrchestrator {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, model: impl Into<String>) -> Self {
        Self {
            provider,
            tools,
            system_prompt: system_prompt(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            top_p: None,
            max_iterations: 10,
            early_stopping: EarlyStopping::default(),
            events: None,
        }
    }

    /// Model knobs, loop limits and the prompt override from configuration.
    pub fn from_config(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, config: &AppConfig) -> Self {
        let mut orchestrator = Self::new(provider, tools, &config.model.name)
            .with_temperature(config.model.temperature)
            .with_max_iterations(config.agent.max_iterations)
            .with_early_stopping(config.agent.early_stopping);
        if let Some(max) = config.model.max_tokens {
            orchestrator = orchestrator.with_max_tokens(max);
        }
        if let Some(top_p) = config.model.top_p {
            orchestrator = orchestrator.with_top_p(top_p);
        }
        if let Some(prompt) = &config.agent.system_prompt_override {
            orchestrator = orchestrator.with_system_prompt(prompt.as_str());
        }
        orchestrator
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_early_stopping(mut self, policy: EarlyStopping) -> Self {
        self.early_stopping = policy;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    /// Answer `input` given the channel's `history`. `bot_id` marks which
    /// history entries were the bot's own replies.
    pub async fn run(
        &self,
        input: &str,
        history: ConversationHistory,
        bot_id: &str,
    ) -> Result<AgentRun, ProviderError> {
        let mut prompt = Vec::with_capacity(history.len() + 2);
        prompt.push(Message::system(&self.system_prompt));
        prompt.extend(history.to_messages(bot_id));
        prompt.push(Message::user(input));

        let definitions = self.tools.definitions();
        let mut scratchpad: Vec<Message> = Vec::new();
        let mut steps: Vec<ToolInvocation> = Vec::new();
        let mut model_calls = 0u32;

        info!(
            model = %self.model,
            history = history.len(),
            tools = definitions.len(),
            max_iterations = self.max_iterations,
            "Agent run starting"
        );

        for iteration in 1..=self.max_iterations {
            let response = self.decide(&prompt, &scratchpad, &definitions).await?;
            model_calls += 1;

            if response.message.tool_calls.is_empty() {
                info!(iteration, steps = steps.len(), "Agent run finished");
                return Ok(AgentRun {
                    input: input.to_string(),
                    history,
                    steps,
                    output: Some(response.message.content),
                    stop_reason: StopReason::Finished,
                    model_calls,
                });
            }

            debug!(iteration, calls = response.message.tool_calls.len(), "Model requested tools");
            let calls = response.message.tool_calls.clone();
            scratchpad.push(response.message);

            for call in &calls {
                let start = Instant::now();
                let invocation = self.tools.invoke(call).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                self.publish(DomainEvent::ToolInvoked {
                    tool_name: invocation.tool_name.clone(),
                    success: invocation.succeeded(),
                    duration_ms,
                    timestamp: Utc::now(),
                });
                scratchpad.push(Message::tool_result(&call.id, &invocation.output));
                steps.push(invocation);
            }
        }

        warn!(iterations = self.max_iterations, policy = ?self.early_stopping, "Iteration limit reached");
        self.publish(DomainEvent::IterationLimitReached {
            iterations: self.max_iterations,
            timestamp: Utc::now(),
        });

        let output = match self.early_stopping {
            EarlyStopping::Force => STOP_MESSAGE.to_string(),
            EarlyStopping::Generate => {
                scratchpad.push(Message::user(FINAL_ANSWER_INSTRUCTION));
                let response = self.decide(&prompt, &scratchpad, &[]).await?;
                model_calls += 1;
                let text = response.message.content.trim();
                if text.is_empty() {
                    STOP_MESSAGE.to_string()
                } else {
                    text.to_string()
                }
            }
        };

        Ok(AgentRun {
            input: input.to_string(),
            history,
            steps,
            output: Some(output),
            stop_reason: StopReason::IterationLimit,
            model_calls,
        })
    }

    async fn decide(
        &self,
        prompt: &[Message],
        scratchpad: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ProviderResponse, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: prompt.iter().chain(scratchpad).cloned().collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            tools: tools.to_vec(),
        };

        let response = self.provider.complete(request).await.inspect_err(|e| {
            warn!(provider = self.provider.name(), error = %e, "Model call failed");
        })?;

        self.publish(DomainEvent::ModelResponded {
            model: response.model.clone(),
            tool_calls: response.message.tool_calls.len(),
            tokens_used: response.usage.as_ref().map_or(0, |u| u.total_tokens),
            timestamp: Utc::now(),
        });
        Ok(response)
    }
}
