//! Guard-gated step groups.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use taleforge_core::error::DomainError;
use tracing::debug;

use crate::domain::context::OrchestrationContext;
use crate::domain::step::{SharedStep, Step, StepResult, run_sequence};

/// A predicate over the current context.
pub type Guard = Arc<dyn Fn(&OrchestrationContext) -> bool + Send + Sync>;

/// Wraps a closure or function as a [`Guard`].
pub fn guard<F>(predicate: F) -> Guard
where
    F: Fn(&OrchestrationContext) -> bool + Send + Sync + 'static,
{
    Arc::new(predicate)
}

/// Runs its inner steps only when the guard holds.
///
/// The guard is evaluated exactly once. When it is false the incoming
/// context is returned untouched. When it is true the inner steps run in
/// order and the first non-`Continue` result is propagated.
pub struct ConditionalStep {
    name: String,
    guard: Guard,
    steps: Vec<SharedStep>,
}

impl ConditionalStep {
    #[must_use]
    pub fn new(name: impl Into<String>, guard: Guard, steps: Vec<SharedStep>) -> Self {
        Self {
            name: name.into(),
            guard,
            steps,
        }
    }
}

impl fmt::Debug for ConditionalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalStep")
            .field("name", &self.name)
            .field("steps", &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Step for ConditionalStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        if !(self.guard)(&context) {
            debug!(step = %self.name, "guard false, skipping");
            return Ok(StepResult::continue_with(context));
        }
        run_sequence(&self.steps, context).await
    }
}
