//! Orchestrator settings.

use std::fmt;
use std::str::FromStr;

use crate::domain::loop_step::DEFAULT_MAX_ITERATIONS;

/// When emitted events reach subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Published as soon as a step emits them.
    #[default]
    Streaming,
    /// Published together once the pipeline has finished.
    Buffered,
}

impl DeliveryMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Buffered => "buffered",
        }
    }

    #[must_use]
    pub fn is_streaming(self) -> bool {
        self == Self::Streaming
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delivery mode name that is neither `streaming` nor `buffered`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown delivery mode: {0}")]
pub struct UnknownDeliveryMode(pub String);

impl FromStr for DeliveryMode {
    type Err = UnknownDeliveryMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "streaming" => Ok(Self::Streaming),
            "buffered" => Ok(Self::Buffered),
            _ => Err(UnknownDeliveryMode(s.to_owned())),
        }
    }
}

/// Settings for [`GameOrchestrator`](crate::application::orchestrator::GameOrchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Cap on automatic NPC turns resolved per player action.
    pub max_combat_iterations: usize,
    /// When events are published.
    pub delivery: DeliveryMode,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_combat_iterations: DEFAULT_MAX_ITERATIONS,
            delivery: DeliveryMode::default(),
        }
    }
}
