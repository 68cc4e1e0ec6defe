//! `henrybot ask`: one question through the full agent, no Discord.

use henrybot_core::channel::ConversationHistory;
use henrybot_core::provider::Provider;
use std::path::Path;
use std::sync::Arc;

pub async fn run(config_path: &Path, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let provider: Arc<dyn Provider> = henrybot_providers::build_from_config(&config)?;
    let assistant = henrybot_gateway::Assistant::build(&config, provider).await?;

    let run = assistant
        .orchestrator
        .run(message, ConversationHistory::empty(), &config.discord.bot_id)
        .await?;

    for step in &run.steps {
        eprintln!("[{}] {} {}", step.tool_name, step.arguments, outcome_label(step.succeeded()));
        for line in step.output.lines().take(6) {
            eprintln!("    {line}");
        }
    }
    if run.was_forced() {
        eprintln!("(stopped at the iteration limit after {} model calls)", run.model_calls);
    }

    match run.answer() {
        Some(answer) => println!("{answer}"),
        None => eprintln!("(no answer)"),
    }
    Ok(())
}

fn outcome_label(succeeded: bool) -> &'static str {
    if succeeded { "ok" } else { "failed" }
}
