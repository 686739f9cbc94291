use async_trait::async_trait;
use taleforge_core::error::DomainError;

use crate::domain::context::OrchestrationContext;
use crate::domain::step::{Step, StepResult};

/// Unconditionally stops the pipeline with a fixed reason.
#[derive(Debug, Clone)]
pub struct Halt {
    reason: String,
}

impl Halt {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Step for Halt {
    fn name(&self) -> &str {
        "halt"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        Ok(StepResult::halt(context, self.reason.clone()))
    }
}
