//! `henrybot search`: query the knowledge store without the agent.

use henrybot_core::provider::Provider;
use std::path::Path;
use std::sync::Arc;

pub async fn run(config_path: &Path, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let provider: Arc<dyn Provider> = henrybot_providers::build_from_config(&config)?;
    let store = henrybot_gateway::build_knowledge_store(&config, provider).await?;

    let documents = store.retrieve(query).await?;
    if documents.is_empty() {
        println!("No matching documents ({} stored).", store.count().await?);
        return Ok(());
    }

    for (rank, doc) in documents.iter().enumerate() {
        let kind = if doc.is_correction() { " correction" } else { "" };
        let score = doc.score.map(|s| format!("{s:.3}")).unwrap_or_else(|| "-".into());
        let short_id: String = doc.id.chars().take(12).collect();
        println!("#{} score={score}{kind} id={short_id}", rank + 1);
        println!("{}", doc.content);
        println!();
    }
    Ok(())
}
