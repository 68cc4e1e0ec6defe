//! Tools HenryBot's agent can call.
//!
//! Five capabilities, fixed at build time: knowledge store search, Google
//! web search, page browsing with a model-written summary, Wikipedia lookup
//! and saving corrections. [`Toolbox::build`] wires them from configuration
//! and the knowledge store; the agent only ever sees the resulting
//! [`ToolRegistry`](henrybot_core::ToolRegistry).

pub mod browse_web;
pub mod encyclopedia;
pub mod html;
pub mod http;
pub mod knowledge_search;
pub mod save_correction;
pub mod toolbox;
pub mod web_search;

pub use browse_web::{BrowseWebTool, ChatModel};
pub use encyclopedia::EncyclopediaTool;
pub use knowledge_search::KnowledgeSearchTool;
pub use save_correction::SaveCorrectionTool;
pub use toolbox::{BuiltinTool, Toolbox};
pub use web_search::{GoogleCredentials, WebSearchTool};
