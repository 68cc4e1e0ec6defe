//! Everything between the chat platform and the agent.
//!
//! - **Guard chain**: which inbound messages get an answer at all
//! - **History**: the recent channel context handed to the agent
//! - **Chunker**: splitting answers that exceed the platform's size limit
//! - **Discord**: the REST adapter implementing [`Channel`](henrybot_core::Channel)

pub mod chunker;
pub mod discord;
pub mod guard;
pub mod history;

pub use chunker::split_response;
pub use discord::{DiscordChannel, DiscordMessage, DiscordUser};
pub use guard::{Admission, Guard, GuardChain};
pub use history::collect_history;
