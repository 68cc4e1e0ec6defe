//! Knowledge store implementations for HenryBot.
//!
//! [`KnowledgeStore`] pairs an [`Embedder`](henrybot_core::Embedder) with a
//! [`VectorIndex`](henrybot_core::VectorIndex). Two indexes ship here: an
//! in-process one for tests and throwaway sessions, and SQLite for real use.

pub mod embedder;
pub mod in_memory;
pub mod store;
pub mod vector;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use embedder::{HashingEmbedder, ProviderEmbedder};
pub use in_memory::InMemoryIndex;
pub use store::{KnowledgeStore, Retriever};
pub use vector::{cosine_similarity, rank_by_similarity};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteIndex;
