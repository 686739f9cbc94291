//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A game was not found in the authoritative store.
    #[error("game not found: {0}")]
    GameNotFound(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// Combat state and roster state have diverged.
    #[error("state consistency error: {0}")]
    StateConsistency(String),

    /// An agent failed while processing a message.
    #[error("agent error: {0}")]
    Agent(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::GameNotFound(_) => "game_not_found",
            Self::Validation(_) => "validation_error",
            Self::StateConsistency(_) => "state_consistency_error",
            Self::Agent(_) => "agent_error",
            Self::Infrastructure(_) => "infrastructure_error",
        }
    }

    /// User-facing message with internal detail stripped.
    ///
    /// The full error (including `Display` output) stays server-side.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::GameNotFound(_) => "The requested game could not be found.",
            Self::Validation(_) => "The request could not be processed.",
            Self::StateConsistency(_) => {
                "The game state is out of sync. Please reload the game and try again."
            }
            Self::Agent(_) => "The game master is unavailable right now. Please try again.",
            Self::Infrastructure(_) => "Something went wrong while processing your action.",
        }
    }
}
