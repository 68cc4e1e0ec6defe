//! # HenryBot Core
//!
//! Domain types, traits, and error definitions for the HenryBot music
//! assistant. Nothing in here talks to the network or a database; every
//! subsystem is described as a trait and implemented in its own crate.
//!
//! ## Layout
//!
//! - [`channel`]: inbound chat messages, conversation history, the chat
//!   platform abstraction
//! - [`provider`]: the language-model service (chat completions + embeddings)
//! - [`tool`]: callable capabilities and the registry the agent dispatches through
//! - [`knowledge`]: documents, embedders and vector indexes
//! - [`agent`]: the record of a single agent run
//! - [`event`]: domain events for observability

pub mod agent;
pub mod channel;
pub mod error;
pub mod event;
pub mod knowledge;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentRun, EarlyStopping, StopReason};
pub use channel::{Channel, ChannelId, ContentKind, ConversationHistory, InboundMessage, Origin};
pub use error::{ChannelError, Error, MemoryError, ProviderError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use knowledge::{Document, Embedder, VectorIndex};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, ToolDefinition,
    Usage,
};
pub use tool::{InvocationOutcome, Tool, ToolCall, ToolInvocation, ToolRegistry, ToolResult};
