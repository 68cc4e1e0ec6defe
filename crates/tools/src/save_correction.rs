//! Save a user's correction to the knowledge store.
//!
//! This is the only write path into the store. Records are never edited;
//! a later correction is simply another document.

use async_trait::async_trait;
use chrono::Utc;
use henrybot_core::error::ToolError;
use henrybot_core::tool::{Tool, ToolResult, parse_arguments};
use henrybot_core::{Document, DomainEvent, EventBus};
use henrybot_memory::KnowledgeStore;
use serde::Deserialize;
use tracing::info;

pub const NAME: &str = "save_correction";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    correction: String,
    links: Vec<String>,
}

impl Args {
    fn validate(&self) -> Result<(), ToolError> {
        if self.correction.trim().is_empty() {
            return Err(ToolError::InvalidArguments("'correction' must not be empty".into()));
        }
        if self.links.is_empty() {
            return Err(ToolError::InvalidArguments(
                "'links' must list at least one source".into(),
            ));
        }
        if self.links.iter().any(|l| l.trim().is_empty()) {
            return Err(ToolError::InvalidArguments("'links' must not contain empty entries".into()));
        }
        Ok(())
    }
}

pub struct SaveCorrectionTool {
    store: KnowledgeStore,
    events: EventBus,
}

impl SaveCorrectionTool {
    pub fn new(store: KnowledgeStore, events: EventBus) -> Self {
        Self { store, events }
    }
}

#[async_trait]
impl Tool for SaveCorrectionTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Save a correction a user gave you so you remember it next time. Only use this after you \
         have checked the correction against reliable sources, and pass those sources as links."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "correction": {
                    "type": "string",
                    "description": "The corrected fact, written as a full sentence"
                },
                "links": {
                    "type": "array",
                    "items": {"type": "string"},
                    "minItems": 1,
                    "description": "URLs of the sources that back the correction"
                }
            },
            "required": ["correction", "links"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_arguments(arguments)?;
        args.validate()?;

        let links: Vec<String> = args.links.iter().map(|l| l.trim().to_string()).collect();
        let document = Document::correction(&args.correction, &links);
        let document_id = document.id.clone();

        let inserted = self
            .store
            .add_documents(vec![document])
            .await
            .map_err(|e| ToolError::failed(NAME, e))?;

        info!(%document_id, links = links.len(), inserted, "Saved correction");
        self.events.publish(DomainEvent::CorrectionSaved {
            document_id,
            links: links.len(),
            timestamp: Utc::now(),
        });

        Ok(ToolResult::text("success"))
    }
}
