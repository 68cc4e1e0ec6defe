//! The record of one agent run.

use crate::channel::ConversationHistory;
use crate::tool::ToolInvocation;
use serde::{Deserialize, Serialize};

/// What the orchestrator does when the iteration cap is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarlyStopping {
    /// Ask the model once more, without tools, for a best-effort answer
    #[default]
    Generate,
    /// Return the fixed stop message without another model call
    Force,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model produced a final answer on its own
    Finished,
    /// The iteration cap was reached and the early-stopping policy answered
    IterationLimit,
}

/// Input, scratchpad and output of a single orchestrator invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRun {
    pub input: String,

    pub history: ConversationHistory,

    /// Tool invocations in the order they ran
    pub steps: Vec<ToolInvocation>,

    pub output: Option<String>,

    pub stop_reason: StopReason,

    /// Number of model calls made, including a forced final one
    pub model_calls: u32,
}

impl AgentRun {
    /// The final answer, if it contains anything besides whitespace.
    pub fn answer(&self) -> Option<&str> {
        self.output
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    pub fn was_forced(&self) -> bool {
        self.stop_reason == StopReason::IterationLimit
    }
}
