//! Shared test doubles and fixtures for the Taleforge engine.

mod agents;
mod clock;
mod collaborators;
pub mod fixtures;
mod rng;

pub use agents::{AgentCall, FailingAgent, MutatingAgent, ScriptedAgent};
pub use clock::FixedClock;
pub use collaborators::{
    FailingGameService, RecordingEventBus, ScriptedSuggester, StaticContextProvider,
    StaticMetadataService,
};
pub use rng::{MockRng, SequenceRng};
