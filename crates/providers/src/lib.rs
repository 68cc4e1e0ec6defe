//! Model provider implementations for HenryBot.
//!
//! Everything talks to an OpenAI-compatible API; [`build_from_config`] turns
//! the `[model]` section into a ready [`Provider`](henrybot_core::Provider).

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use henrybot_config::AppConfig;
use henrybot_core::error::ProviderError;
use std::sync::Arc;

/// Build the chat/embedding provider from configuration.
///
/// Fails with `NotConfigured` when no API key is available.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<OpenAiCompatProvider>, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(
            "no API key; set OPENAI_API_KEY or api_key in config.toml".into(),
        )
    })?;

    let provider = OpenAiCompatProvider::new("openai", &config.model.api_url, api_key)
        .with_timeout(std::time::Duration::from_secs(config.model.timeout_secs));

    Ok(Arc::new(provider))
}
