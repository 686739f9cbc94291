//! Spy steps for engine tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use taleforge_core::error::DomainError;
use taleforge_core::stream::StreamEvent;
use taleforge_game::state::GameHandle;
use taleforge_test_support::fixtures;

use crate::domain::context::OrchestrationContext;
use crate::domain::step::{Step, StepResult};

pub(crate) fn context() -> OrchestrationContext {
    OrchestrationContext::new("look around", GameHandle::new(fixtures::game()))
}

/// Emits one narrative event carrying its name and counts its runs.
pub(crate) struct EmitStep {
    name: String,
    runs: Arc<AtomicUsize>,
}

impl EmitStep {
    pub(crate) fn new(name: &str) -> (Self, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name: name.to_owned(),
                runs: Arc::clone(&runs),
            },
            runs,
        )
    }
}

#[async_trait]
impl Step for EmitStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(StepResult::continue_with(
            context.with_event(StreamEvent::narrative(self.name.clone())),
        ))
    }
}

/// Halts on its `halt_on`-th run (1-based), continues otherwise.
pub(crate) struct HaltStep {
    halt_on: usize,
    runs: Arc<AtomicUsize>,
}

impl HaltStep {
    pub(crate) fn on_run(halt_on: usize) -> (Self, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        (
            Self {
                halt_on,
                runs: Arc::clone(&runs),
            },
            runs,
        )
    }
}

#[async_trait]
impl Step for HaltStep {
    fn name(&self) -> &str {
        "halt"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        if run == self.halt_on {
            Ok(StepResult::halt(context, "stop here"))
        } else {
            Ok(StepResult::continue_with(context))
        }
    }
}

/// Always fails.
pub(crate) struct FailStep;

#[async_trait]
impl Step for FailStep {
    fn name(&self) -> &str {
        "fail"
    }

    async fn run(&self, _context: OrchestrationContext) -> Result<StepResult, DomainError> {
        Err(DomainError::Agent("boom".to_owned()))
    }
}
