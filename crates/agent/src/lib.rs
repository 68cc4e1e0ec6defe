//! The reasoning half of HenryBot.
//!
//! [`ChatOrchestrator`] runs one question through the model, letting it call
//! tools until it answers or runs out of iterations:
//!
//! 1. **Prompt**: Henry's persona, the channel history, the new message
//! 2. **Decide**: the model answers or asks for tools
//! 3. **Act**: every requested tool runs, its output goes on the scratchpad
//! 4. Back to 2, at most `max_iterations` times, then the early-stopping
//!    policy produces the answer

pub mod orchestrator;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use orchestrator::{ChatOrchestrator, STOP_MESSAGE};
pub use prompt::system_prompt;
