//! The closed set of tools the agent is given.

use crate::browse_web::{BrowseWebTool, ChatModel};
use crate::encyclopedia::EncyclopediaTool;
use crate::knowledge_search::KnowledgeSearchTool;
use crate::save_correction::SaveCorrectionTool;
use crate::web_search::{GoogleCredentials, WebSearchTool};
use async_trait::async_trait;
use henrybot_config::ToolsConfig;
use henrybot_core::error::ToolError;
use henrybot_core::tool::{Tool, ToolRegistry, ToolResult};
use henrybot_core::{Error, EventBus};
use henrybot_memory::KnowledgeStore;
use std::time::Duration;
use tracing::Instrument;

/// One of the five built-in capabilities.
pub enum BuiltinTool {
    KnowledgeSearch(KnowledgeSearchTool),
    WebSearch(WebSearchTool),
    Browse(BrowseWebTool),
    Encyclopedia(EncyclopediaTool),
    SaveCorrection(SaveCorrectionTool),
}

impl BuiltinTool {
    fn inner(&self) -> &dyn Tool {
        match self {
            Self::KnowledgeSearch(t) => t,
            Self::WebSearch(t) => t,
            Self::Browse(t) => t,
            Self::Encyclopedia(t) => t,
            Self::SaveCorrection(t) => t,
        }
    }
}

#[async_trait]
impl Tool for BuiltinTool {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn description(&self) -> &str {
        self.inner().description()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.inner().parameters_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        self.inner().execute(arguments).await
    }
}

/// Every tool built from configuration, sharing one HTTP client.
pub struct Toolbox {
    tools: Vec<BuiltinTool>,
    span: tracing::Span,
}

impl Toolbox {
    /// `store` must already be initialized. `span` becomes the parent of
    /// each tool call's span.
    pub fn build(
        config: &ToolsConfig,
        store: &KnowledgeStore,
        chat: ChatModel,
        events: EventBus,
        span: tracing::Span,
    ) -> Result<Self, Error> {
        let client = crate::http::client(Duration::from_secs(config.timeout_secs));

        let credentials = match (&config.google_api_key, &config.google_cse_id) {
            (Some(api_key), Some(cse_id)) => Some(GoogleCredentials {
                api_key: api_key.clone(),
                cse_id: cse_id.clone(),
            }),
            _ => None,
        };

        let browse = BrowseWebTool::new(client.clone(), store.embedder()?, chat)
            .map_err(|e| Error::Internal(format!("browse_web patterns: {e}")))?
            .with_limits(config.browse_max_chars, config.browse_max_links);

        let tools = vec![
            BuiltinTool::KnowledgeSearch(KnowledgeSearchTool::new(store.retriever()?)),
            BuiltinTool::WebSearch(WebSearchTool::new(
                client.clone(),
                config.google_api_url.clone(),
                credentials,
            )),
            BuiltinTool::Browse(browse),
            BuiltinTool::Encyclopedia(
                EncyclopediaTool::new(client, config.wikipedia_api_url.clone())
                    .with_limits(config.wikipedia_top_k, config.wikipedia_max_chars),
            ),
            BuiltinTool::SaveCorrection(SaveCorrectionTool::new(store.clone(), events)),
        ];

        Ok(Self { tools, span })
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Register every tool, each call logged under its own span.
    pub fn into_registry(self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for tool in self.tools {
            registry.register(Box::new(ScopedTool {
                tool,
                span: self.span.clone(),
            }));
        }
        registry
    }
}

struct ScopedTool {
    tool: BuiltinTool,
    span: tracing::Span,
}

#[async_trait]
impl Tool for ScopedTool {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn description(&self) -> &str {
        self.tool.description()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.tool.parameters_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let span = tracing::info_span!(parent: &self.span, "tool", name = self.tool.name());
        self.tool.execute(arguments).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use henrybot_core::error::{MemoryError, ProviderError};
    use henrybot_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use henrybot_core::tool::ToolCall;
    use henrybot_memory::{HashingEmbedder, InMemoryIndex};
    use std::sync::Arc;

    struct SilentProvider;

    #[async_trait]
    impl Provider for SilentProvider {
        fn name(&self) -> &str {
            "silent"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("no model in this test".into()))
        }
    }

    fn store() -> KnowledgeStore {
        KnowledgeStore::new(
            Arc::new(InMemoryIndex::new()),
            Arc::new(HashingEmbedder::default()),
            tracing::Span::none(),
        )
    }

    fn build(store: &KnowledgeStore) -> Result<Toolbox, Error> {
        Toolbox::build(
            &ToolsConfig::default(),
            store,
            ChatModel::new(Arc::new(SilentProvider), "test-model"),
            EventBus::default(),
            tracing::info_span!("tools_test"),
        )
    }

    #[tokio::test]
    async fn registers_all_five_tools() {
        let store = store();
        store.initialize().await.unwrap();

        let registry = build(&store).unwrap().into_registry();
        let mut names = registry.names();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "browse_web",
                "lookup_encyclopedia",
                "save_correction",
                "search_knowledge_store",
                "search_web",
            ]
        );
        assert_eq!(registry.definitions().len(), 5);
    }

    #[tokio::test]
    async fn uninitialized_store_is_refused() {
        let err = build(&store()).err().unwrap();
        assert!(matches!(err, Error::Memory(MemoryError::NotInitialized)));
    }

    #[tokio::test]
    async fn web_search_without_credentials_reports_not_configured() {
        let store = store();
        store.initialize().await.unwrap();
        let registry = build(&store).unwrap().into_registry();

        let err = registry
            .execute(&ToolCall {
                id: "call_1".into(),
                name: "search_web".into(),
                arguments: serde_json::json!({"query": "Band A"}),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotConfigured { .. }));
    }
}
