//! Ordered composition of steps.

use std::fmt;

use taleforge_core::error::DomainError;
use taleforge_core::stream::StreamEvent;
use tracing::{debug, instrument};

use crate::domain::conditional::{ConditionalStep, Guard};
use crate::domain::context::OrchestrationContext;
use crate::domain::loop_step::LoopStep;
use crate::domain::step::{SharedStep, Step, run_sequence, shared};

/// The outcome of one pipeline execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    /// Final context; its events are the pipeline's output.
    pub context: OrchestrationContext,
    /// Whether a step stopped the run before exhaustion.
    pub halted: bool,
    /// Reason given by the stopping step.
    pub reason: Option<String>,
    /// Name of the innermost step that stopped the run.
    pub stopped_by: Option<String>,
}

impl PipelineRun {
    #[must_use]
    pub fn events(&self) -> &[StreamEvent] {
        self.context.events()
    }
}

/// An immutable, ordered list of steps.
pub struct Pipeline {
    steps: Vec<SharedStep>,
}

impl Pipeline {
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Names of the top-level steps, in order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs every step in order until one halts.
    ///
    /// `Halt` and `Branch` both stop the run with the events accumulated so
    /// far.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any step, uncaught.
    #[instrument(skip_all, fields(game_id = %context.game_id()))]
    pub async fn execute(&self, context: OrchestrationContext) -> Result<PipelineRun, DomainError> {
        let result = run_sequence(&self.steps, context).await?;
        let halted = result.outcome.stops();
        debug!(
            halted,
            stopped_by = result.stopped_by.as_deref(),
            events = result.context.events().len(),
            "pipeline finished"
        );
        Ok(PipelineRun {
            context: result.context,
            halted,
            reason: result.reason,
            stopped_by: result.stopped_by,
        })
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

/// Assembles a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    steps: Vec<SharedStep>,
}

impl PipelineBuilder {
    /// Appends an unconditional step.
    #[must_use]
    pub fn step<S: Step + 'static>(mut self, step: S) -> Self {
        self.steps.push(shared(step));
        self
    }

    /// Appends several unconditional steps.
    #[must_use]
    pub fn steps<I>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = SharedStep>,
    {
        self.steps.extend(steps);
        self
    }

    /// Appends a [`ConditionalStep`].
    #[must_use]
    pub fn when(self, name: &str, guard: Guard, steps: Vec<SharedStep>) -> Self {
        self.step(ConditionalStep::new(name, guard, steps))
    }

    /// Appends a [`LoopStep`] capped at `max_iterations`.
    #[must_use]
    pub fn repeat_while(
        self,
        name: &str,
        guard: Guard,
        steps: Vec<SharedStep>,
        max_iterations: usize,
    ) -> Self {
        self.step(LoopStep::new(name, guard, steps).with_max_iterations(max_iterations))
    }

    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline { steps: self.steps }
    }
}
