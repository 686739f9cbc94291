//! Entry point for processing one player action.

use std::sync::Arc;

use taleforge_core::error::DomainError;
use taleforge_core::stream::{CompletePayload, ErrorPayload, StreamEvent};
use taleforge_game::ports::BroadcastCommand;
use taleforge_game::state::GameHandle;
use tracing::{error, info, instrument, warn};

use crate::application::config::{DeliveryMode, OrchestratorConfig};
use crate::application::policy::turn_pipeline;
use crate::application::services::Services;
use crate::domain::context::OrchestrationContext;
use crate::domain::pipeline::{Pipeline, PipelineRun};

/// What one processed action produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Events emitted by the pipeline, in order.
    pub events: Vec<StreamEvent>,
    /// Whether a step halted the pipeline.
    pub halted: bool,
    /// Why it halted.
    pub reason: Option<String>,
}

/// Runs the turn pipeline for player actions and delivers the results.
#[derive(Debug)]
pub struct GameOrchestrator {
    services: Arc<Services>,
    pipeline: Pipeline,
    config: OrchestratorConfig,
}

impl GameOrchestrator {
    /// Creates an orchestrator running the canonical turn pipeline.
    #[must_use]
    pub fn new(services: Services, config: OrchestratorConfig) -> Self {
        let services = Arc::new(Services {
            delivery: config.delivery,
            ..services
        });
        let pipeline = turn_pipeline(&services, &config);
        Self {
            services,
            pipeline,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> OrchestratorConfig {
        self.config
    }

    /// Processes `message` for `game_id`.
    ///
    /// Loads the game, runs the pipeline and records the turn history. A
    /// `complete` event is published once the action is done. In buffered
    /// mode the pipeline's events are published just before it.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while loading, running or recording.
    /// A sanitised `error` event is published to the game's subscribers
    /// before the error is returned.
    #[instrument(skip(self, message), fields(delivery = %self.config.delivery))]
    pub async fn process_user_action(
        &self,
        game_id: &str,
        message: &str,
    ) -> Result<TurnOutcome, DomainError> {
        match self.run_turn(game_id, message).await {
            Ok(run) => {
                info!(
                    halted = run.halted,
                    reason = run.reason.as_deref(),
                    stopped_by = run.stopped_by.as_deref(),
                    events = run.events().len(),
                    "player action processed"
                );
                let complete = StreamEvent::Complete(CompletePayload {
                    halted: run.halted,
                    reason: run.reason.clone(),
                });
                self.publish(game_id, vec![complete]).await;
                Ok(TurnOutcome {
                    halted: run.halted,
                    reason: run.reason,
                    events: run.context.into_events(),
                })
            }
            Err(err) => {
                error!(error = %err, code = err.code(), "player action failed");
                let event = StreamEvent::Error(ErrorPayload {
                    message: err.public_message().to_owned(),
                    code: Some(err.code().to_owned()),
                });
                self.publish(game_id, vec![event]).await;
                Err(err)
            }
        }
    }

    async fn run_turn(&self, game_id: &str, message: &str) -> Result<PipelineRun, DomainError> {
        let game = self.services.games.get_game(game_id).await?;
        let context = OrchestrationContext::new(message, GameHandle::new(game));
        let run = self.pipeline.execute(context).await?;
        self.services
            .games
            .record_turn(game_id, message, run.events())
            .await?;
        if self.config.delivery == DeliveryMode::Buffered {
            self.services
                .bus
                .submit_and_wait(vec![BroadcastCommand {
                    topic: game_id.to_owned(),
                    events: run.events().to_vec(),
                }])
                .await?;
        }
        Ok(run)
    }

    async fn publish(&self, game_id: &str, events: Vec<StreamEvent>) {
        let command = BroadcastCommand {
            topic: game_id.to_owned(),
            events,
        };
        if let Err(err) = self.services.bus.submit_and_wait(vec![command]).await {
            warn!(error = %err, "failed to publish turn status");
        }
    }
}
