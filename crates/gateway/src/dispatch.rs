//! The event loop: one task per inbound message.

use crate::pipeline::MessagePipeline;
use henrybot_core::channel::InboundMessage;
use henrybot_core::error::ChannelError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Consume `events` until the stream closes, handling each message on its
/// own task. Returns once every spawned task has finished.
pub async fn serve(
    pipeline: Arc<MessagePipeline>,
    mut events: mpsc::Receiver<Result<InboundMessage, ChannelError>>,
) {
    let mut tasks = JoinSet::new();
    info!(channel = pipeline.channel().name(), "Dispatcher running");

    while let Some(event) = events.recv().await {
        let msg = match event {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Dropped inbound event");
                continue;
            }
        };

        let pipeline = pipeline.clone();
        tasks.spawn(async move {
            if let Some(answer) = pipeline.on_message(&msg).await {
                pipeline.reply(&msg, &answer).await;
            }
        });

        // Reap whatever already finished
        while let Some(done) = tasks.try_join_next() {
            log_join(done);
        }
    }

    info!(in_flight = tasks.len(), "Inbound stream closed, draining");
    while let Some(done) = tasks.join_next().await {
        log_join(done);
    }
}

fn log_join(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        error!(error = %e, "Message task panicked");
    }
}
