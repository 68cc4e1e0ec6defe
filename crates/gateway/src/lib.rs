//! HenryBot's composition root.
//!
//! Builds the knowledge store, the tool set and the orchestrator from
//! configuration, wraps them in a [`MessagePipeline`] for a chat channel,
//! and drives it from the channel's event stream.

pub mod dispatch;
pub mod pipeline;

pub use dispatch::serve;
pub use pipeline::MessagePipeline;

use henrybot_agent::ChatOrchestrator;
use henrybot_channels::DiscordChannel;
use henrybot_config::{AppConfig, EmbeddingBackend, KnowledgeBackend};
use henrybot_core::channel::Channel;
use henrybot_core::provider::Provider;
use henrybot_core::{Embedder, Error, EventBus, VectorIndex};
use henrybot_memory::{HashingEmbedder, InMemoryIndex, KnowledgeStore, ProviderEmbedder, SqliteIndex};
use henrybot_tools::{ChatModel, Toolbox};
use std::sync::Arc;
use tracing::info;

/// Open and initialize the knowledge store described by `config`.
pub async fn build_knowledge_store(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
) -> Result<KnowledgeStore, Error> {
    let embedder: Arc<dyn Embedder> = match config.embeddings.backend {
        EmbeddingBackend::Provider => Arc::new(ProviderEmbedder::new(
            provider,
            &config.embeddings.model,
            config.embeddings.dimensions,
        )),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.embeddings.dimensions)),
    };

    let index: Arc<dyn VectorIndex> = match config.knowledge.backend {
        KnowledgeBackend::Sqlite => {
            let path = config.knowledge.resolved_path();
            info!(path = %path.display(), "Opening knowledge database");
            Arc::new(SqliteIndex::open(&path).await?)
        }
        KnowledgeBackend::Memory => Arc::new(InMemoryIndex::new()),
    };

    let store = KnowledgeStore::new(index, embedder, tracing::info_span!("knowledge"))
        .with_top_k(config.knowledge.top_k);
    store.initialize().await?;
    Ok(store)
}

/// The agent with everything it needs, minus a chat platform.
pub struct Assistant {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub store: KnowledgeStore,
    pub events: EventBus,
}

impl Assistant {
    pub async fn build(config: &AppConfig, provider: Arc<dyn Provider>) -> Result<Self, Error> {
        let events = EventBus::default();
        let store = build_knowledge_store(config, provider.clone()).await?;
        Self::with_store(config, provider, store, events)
    }

    /// Wire the tools and orchestrator around an already initialized store.
    pub fn with_store(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        store: KnowledgeStore,
        events: EventBus,
    ) -> Result<Self, Error> {
        let toolbox = Toolbox::build(
            &config.tools,
            &store,
            ChatModel::new(provider.clone(), &config.model.name),
            events.clone(),
            tracing::info_span!("tools"),
        )?;
        info!(tools = ?toolbox.names(), model = %config.model.name, "Tool set ready");

        let orchestrator = ChatOrchestrator::from_config(provider, Arc::new(toolbox.into_registry()), config)
            .with_events(events.clone());

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            store,
            events,
        })
    }

    pub fn pipeline(&self, channel: Arc<dyn Channel>, config: &AppConfig) -> MessagePipeline {
        MessagePipeline::new(channel, self.orchestrator.clone(), &config.discord, self.events.clone())
    }
}

/// Run the Discord bot until its inbound stream closes.
pub async fn run_bot(config: AppConfig) -> Result<(), Error> {
    let provider: Arc<dyn Provider> = henrybot_providers::build_from_config(&config)?;
    let channel = Arc::new(DiscordChannel::from_config(&config.discord)?);

    let assistant = Assistant::build(&config, provider).await?;
    let pipeline = Arc::new(assistant.pipeline(channel.clone(), &config));

    let events = channel.start().await?;
    info!(
        channel_id = %config.discord.channel_id,
        documents = assistant.store.count().await?,
        "HenryBot is listening"
    );
    serve(pipeline, events).await;
    channel.stop().await?;
    Ok(())
}
