//! Knowledge store search: the retrieval half of the agent's memory.

use async_trait::async_trait;
use henrybot_core::error::ToolError;
use henrybot_core::tool::{Tool, ToolResult, parse_arguments};
use henrybot_memory::Retriever;
use serde::Deserialize;

pub const NAME: &str = "search_knowledge_store";

const NO_MATCHES: &str = "No matching documents found.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    query: String,
}

pub struct KnowledgeSearchTool {
    retriever: Retriever,
}

impl KnowledgeSearchTool {
    pub fn new(retriever: Retriever) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Search the music knowledge store, including corrections users have made before. \
         Check here first before searching elsewhere."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for, e.g. a band, album or musician"
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

        let documents = self
            .retriever
            .retrieve(&args.query)
            .await
            .map_err(|e| ToolError::failed(NAME, e))?;

        if documents.is_empty() {
            return Ok(ToolResult::text(NO_MATCHES));
        }

        let output = documents
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(ToolResult::text(output))
    }
}
