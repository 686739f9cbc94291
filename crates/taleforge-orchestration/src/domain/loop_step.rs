//! Bounded `while` loops over a step group.

use std::fmt;

use async_trait::async_trait;
use taleforge_core::error::DomainError;
use tracing::{debug, warn};

use crate::domain::conditional::Guard;
use crate::domain::context::OrchestrationContext;
use crate::domain::step::{SharedStep, Step, StepResult, run_sequence};

/// Iteration cap applied when none is given.
pub const DEFAULT_MAX_ITERATIONS: usize = 25;

/// Repeats its inner steps while the guard holds, up to a fixed cap.
///
/// The guard is checked before each iteration. A `Halt` or `Branch` from an
/// inner step ends the loop at once. Reaching the cap is logged and the loop
/// returns `Continue`.
pub struct LoopStep {
    name: String,
    guard: Guard,
    steps: Vec<SharedStep>,
    max_iterations: usize,
}

impl LoopStep {
    #[must_use]
    pub fn new(name: impl Into<String>, guard: Guard, steps: Vec<SharedStep>) -> Self {
        Self {
            name: name.into(),
            guard,
            steps,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    #[must_use]
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl fmt::Debug for LoopStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopStep")
            .field("name", &self.name)
            .field("steps", &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Step for LoopStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, mut context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let mut iteration = 0;
        while iteration < self.max_iterations {
            if !(self.guard)(&context) {
                debug!(step = %self.name, iteration, "loop guard false");
                return Ok(StepResult::continue_with(context));
            }
            iteration += 1;
            debug!(step = %self.name, iteration, "loop iteration");
            let result = run_sequence(&self.steps, context).await?;
            if result.outcome.stops() {
                return Ok(result);
            }
            context = result.context;
        }
        warn!(
            step = %self.name,
            max_iterations = self.max_iterations,
            game_id = context.game_id(),
            "loop reached its iteration cap"
        );
        Ok(StepResult::continue_with(context))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::conditional::guard;
    use crate::domain::step::{Outcome, shared};
    use crate::domain::test_steps::{EmitStep, FailStep, HaltStep, context};

    #[tokio::test]
    async fn test_always_true_guard_runs_exactly_max_iterations() {
        // Arrange
        let (inner, runs) = EmitStep::new("tick");
        let step = LoopStep::new("spin", guard(|_| true), vec![shared(inner)])
            .with_max_iterations(7);

        // Act
        let result = step.run(context()).await.unwrap();

        // Assert
        assert_eq!(runs.load(Ordering::SeqCst), 7);
        assert_eq!(result.outcome, Outcome::Continue);
        assert_eq!(result.context.events().len(), 7);
    }

    #[tokio::test]
    async fn test_halt_stops_without_further_guard_or_step_runs() {
        // Arrange
        let evaluations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evaluations);
        let (halt, halt_runs) = HaltStep::on_run(3);
        let (after, after_runs) = EmitStep::new("after");
        let step = LoopStep::new(
            "spin",
            guard(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }),
            vec![shared(halt), shared(after)],
        );

        // Act
        let result = step.run(context()).await.unwrap();

        // Assert
        assert_eq!(result.outcome, Outcome::Halt);
        assert_eq!(evaluations.load(Ordering::SeqCst), 3);
        assert_eq!(halt_runs.load(Ordering::SeqCst), 3);
        assert_eq!(after_runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_guard_reads_context_produced_by_previous_iteration() {
        // Arrange
        let (inner, runs) = EmitStep::new("tick");
        let step = LoopStep::new(
            "until-three",
            guard(|ctx| ctx.events().len() < 3),
            vec![shared(inner)],
        );

        // Act
        let result = step.run(context()).await.unwrap();

        // Assert
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(result.outcome, Outcome::Continue);
    }

    #[tokio::test]
    async fn test_false_guard_never_enters() {
        // Arrange
        let (inner, runs) = EmitStep::new("tick");
        let step = LoopStep::new("never", guard(|_| false), vec![shared(inner)]);

        // Act
        let result = step.run(context()).await.unwrap();

        // Assert
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(result.outcome, Outcome::Continue);
    }

    #[tokio::test]
    async fn test_inner_error_propagates() {
        // Arrange
        let step = LoopStep::new("spin", guard(|_| true), vec![shared(FailStep)]);

        // Act
        let result = step.run(context()).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Agent(_))));
    }

    #[test]
    fn test_default_cap() {
        let step = LoopStep::new("spin", guard(|_| true), Vec::new());

        assert_eq!(step.max_iterations(), DEFAULT_MAX_ITERATIONS);
    }
}
