//! The unit of work and its control signal.

use std::sync::Arc;

use async_trait::async_trait;
use taleforge_core::error::DomainError;
use tracing::debug;

use crate::domain::context::OrchestrationContext;

/// What the enclosing composite should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Carry the returned context on to the next step.
    Continue,
    /// Stop the whole pipeline, keeping the events accumulated so far.
    Halt,
    /// Reserved. Composites currently treat it exactly like `Halt`.
    Branch,
}

impl Outcome {
    /// Whether this outcome stops the enclosing composite.
    #[must_use]
    pub fn stops(self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// The result of running one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Control signal.
    pub outcome: Outcome,
    /// Successor context.
    pub context: OrchestrationContext,
    /// Why the run stopped, for `Halt` and `Branch`.
    pub reason: Option<String>,
    /// Name of the innermost step that stopped the run.
    pub stopped_by: Option<String>,
}

impl StepResult {
    #[must_use]
    pub fn continue_with(context: OrchestrationContext) -> Self {
        Self {
            outcome: Outcome::Continue,
            context,
            reason: None,
            stopped_by: None,
        }
    }

    #[must_use]
    pub fn halt(context: OrchestrationContext, reason: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Halt,
            context,
            reason: Some(reason.into()),
            stopped_by: None,
        }
    }

    #[must_use]
    pub fn branch(context: OrchestrationContext, reason: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Branch,
            context,
            reason: Some(reason.into()),
            stopped_by: None,
        }
    }
}

/// A unit of work in a pipeline.
///
/// Steps never mutate the incoming context; anything downstream steps need
/// goes into the returned one. Side effects against the live game and
/// collaborators are allowed. Failures propagate as `Err`.
#[async_trait]
pub trait Step: Send + Sync {
    /// Stable name used in logs and in `PipelineRun::stopped_by`.
    fn name(&self) -> &str;

    /// Runs the step against `context`.
    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError>;
}

/// A step shared between composites.
pub type SharedStep = Arc<dyn Step>;

/// Wraps a concrete step for use in a composite.
pub fn shared<S: Step + 'static>(step: S) -> SharedStep {
    Arc::new(step)
}

/// Runs `steps` in order, threading the context.
///
/// Returns the first non-`Continue` result, tagged with the name of the
/// step that produced it, or `Continue` with the final context.
pub(crate) async fn run_sequence(
    steps: &[SharedStep],
    mut context: OrchestrationContext,
) -> Result<StepResult, DomainError> {
    for step in steps {
        debug!(step = step.name(), game_id = context.game_id(), "running step");
        let mut result = step.run(context).await?;
        if result.outcome.stops() {
            if result.stopped_by.is_none() {
                result.stopped_by = Some(step.name().to_owned());
            }
            return Ok(result);
        }
        context = result.context;
    }
    Ok(StepResult::continue_with(context))
}
