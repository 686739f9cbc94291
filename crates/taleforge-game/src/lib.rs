//! Taleforge: Game state aggregate and collaborator ports.
//!
//! [`state::GameState`] is the externally-owned aggregate that agents and the
//! combat engine mutate in place. [`ports`] declares the collaborators the
//! orchestration layer calls out to (agents, context services, the
//! authoritative game store and the event bus).

pub mod ports;
pub mod state;
