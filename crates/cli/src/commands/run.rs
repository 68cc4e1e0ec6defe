//! `henrybot run`: start the Discord bot.

use std::path::Path;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    if !config.has_api_key() {
        return Err("No model API key configured. Set OPENAI_API_KEY or HENRYBOT_API_KEY.".into());
    }

    tokio::select! {
        result = henrybot_gateway::run_bot(config) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
        }
    }
    Ok(())
}
