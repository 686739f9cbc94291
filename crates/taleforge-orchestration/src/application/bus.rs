//! `EventBus` adapter over the in-process broadcaster.

use std::sync::Arc;

use async_trait::async_trait;
use taleforge_broadcast::BroadcastService;
use taleforge_core::error::DomainError;
use taleforge_game::ports::{BroadcastCommand, EventBus};
use tracing::debug;

/// Delivers each command's events to the command's topic.
///
/// Delivery is best effort per subscriber: full or closed queues are handled
/// inside the broadcaster and never fail the submission.
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    broadcaster: Arc<BroadcastService>,
}

impl BroadcastEventBus {
    #[must_use]
    pub fn new(broadcaster: Arc<BroadcastService>) -> Self {
        Self { broadcaster }
    }
}

#[async_trait]
impl EventBus for BroadcastEventBus {
    async fn submit_and_wait(&self, commands: Vec<BroadcastCommand>) -> Result<(), DomainError> {
        for command in commands {
            let report = self
                .broadcaster
                .publish_all(&command.topic, command.events);
            debug!(
                topic = %command.topic,
                delivered = report.delivered,
                dropped = report.dropped,
                pruned = report.pruned,
                "broadcast command handled"
            );
        }
        Ok(())
    }
}
