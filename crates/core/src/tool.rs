//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools let the agent reach outside the conversation: query the knowledge
//! store, search or browse the web, look things up, save corrections.
//!
//! The registry is the single dispatch point for the agent loop. Whatever
//! happens inside a tool, [`ToolRegistry::invoke`] hands back text, so the
//! model can read the failure and decide what to do next.

use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A request to execute a tool, with arguments already parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool_call.id)
    pub id: String,

    pub name: String,

    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool did what it was asked
    pub success: bool,

    /// The text handed back to the model
    pub output: String,
}

impl ToolResult {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }
}

/// How a single invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationOutcome {
    Success,
    /// Arguments failed to parse or validate; the tool never ran
    InvalidArguments,
    /// The tool was missing or its work failed
    Failed,
}

/// One step of the scratchpad: what the model asked for and what it got.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub call_id: String,

    pub tool_name: String,

    /// Parsed arguments, or the raw string when it was not valid JSON
    pub arguments: serde_json::Value,

    pub output: String,

    pub outcome: InvocationOutcome,
}

impl ToolInvocation {
    pub fn succeeded(&self) -> bool {
        self.outcome == InvocationOutcome::Success
    }
}

/// Deserialize tool arguments into their typed form.
///
/// Any mismatch with the declared shape becomes [`ToolError::InvalidArguments`].
pub fn parse_arguments<T: DeserializeOwned>(
    arguments: serde_json::Value,
) -> std::result::Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "search_web").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// All tool definitions, sorted by name so prompts are stable.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute an already-parsed call. Errors are returned as-is.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        tool.execute(call.arguments.clone()).await
    }

    /// Run a call exactly as the model produced it.
    ///
    /// Never fails: unparseable arguments, unknown tools and execution errors
    /// are rendered into the invocation's output text.
    pub async fn invoke(&self, call: &MessageToolCall) -> ToolInvocation {
        let raw = if call.arguments.trim().is_empty() {
            "{}"
        } else {
            call.arguments.as_str()
        };

        let arguments: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool arguments are not valid JSON");
                return ToolInvocation {
                    call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    arguments: serde_json::Value::String(call.arguments.clone()),
                    output: invalid_arguments_text(&call.name, &e.to_string()),
                    outcome: InvocationOutcome::InvalidArguments,
                };
            }
        };

        let parsed = ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments,
        };

        let (output, outcome) = match self.execute(&parsed).await {
            Ok(result) if result.success => (result.output, InvocationOutcome::Success),
            Ok(result) => (result.output, InvocationOutcome::Failed),
            Err(ToolError::InvalidArguments(reason)) => (
                invalid_arguments_text(&call.name, &reason),
                InvocationOutcome::InvalidArguments,
            ),
            Err(ToolError::NotFound(name)) => {
                let mut available = self.names();
                available.sort_unstable();
                (
                    format!(
                        "Error: there is no tool named '{name}'. Available tools: {}",
                        available.join(", ")
                    ),
                    InvocationOutcome::Failed,
                )
            }
            Err(e) => (format!("Error: {e}"), InvocationOutcome::Failed),
        };

        debug!(tool = %call.name, ?outcome, output_len = output.len(), "Tool invoked");

        ToolInvocation {
            call_id: parsed.id,
            tool_name: parsed.name,
            arguments: parsed.arguments,
            output,
            outcome,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_arguments_text(tool: &str, reason: &str) -> String {
    format!("Invalid arguments for tool '{tool}': {reason}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct ShoutArgs {
        text: String,
    }

    struct ShoutTool;

    #[async_trait]
    impl Tool for ShoutTool {
        fn name(&self) -> &str {
            "shout"
        }
        fn description(&self) -> &str {
            "Upper-cases the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"],
                "additionalProperties": false
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError> {
            let args: ShoutArgs = parse_arguments(arguments)?;
            if args.text == "boom" {
                return Err(ToolError::failed("shout", "upstream exploded"));
            }
            Ok(ToolResult::text(args.text.to_uppercase()))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(ShoutTool));
        registry
    }

    fn call(name: &str, arguments: &str) -> MessageToolCall {
        MessageToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    #[test]
    fn registry_definitions() {
        let defs = registry().definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "shout");
    }

    #[tokio::test]
    async fn invoke_success() {
        let inv = registry().invoke(&call("shout", r#"{"text":"metal"}"#)).await;
        assert_eq!(inv.outcome, InvocationOutcome::Success);
        assert_eq!(inv.output, "METAL");
        assert_eq!(inv.arguments["text"], "metal");
    }

    #[tokio::test]
    async fn invoke_malformed_json_is_text() {
        let inv = registry().invoke(&call("shout", "{not json")).await;
        assert_eq!(inv.outcome, InvocationOutcome::InvalidArguments);
        assert!(inv.output.starts_with("Invalid arguments for tool 'shout'"));
    }

    #[tokio::test]
    async fn invoke_schema_violation_is_text() {
        let inv = registry().invoke(&call("shout", r#"{"text":"a","extra":1}"#)).await;
        assert_eq!(inv.outcome, InvocationOutcome::InvalidArguments);
        assert!(inv.output.contains("extra"));

        let missing = registry().invoke(&call("shout", "")).await;
        assert_eq!(missing.outcome, InvocationOutcome::InvalidArguments);
        assert!(missing.output.contains("text"));
    }

    #[tokio::test]
    async fn invoke_unknown_tool_lists_available() {
        let inv = registry().invoke(&call("juggle", "{}")).await;
        assert_eq!(inv.outcome, InvocationOutcome::Failed);
        assert!(inv.output.contains("juggle"));
        assert!(inv.output.contains("shout"));
    }

    #[tokio::test]
    async fn invoke_execution_failure_is_text() {
        let inv = registry().invoke(&call("shout", r#"{"text":"boom"}"#)).await;
        assert_eq!(inv.outcome, InvocationOutcome::Failed);
        assert!(inv.output.starts_with("Error:"));
        assert!(inv.output.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn execute_missing_tool_errors() {
        let err = ToolRegistry::new()
            .execute(&ToolCall {
                id: "call_1".into(),
                name: "nonexistent".into(),
                arguments: serde_json::json!({}),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
