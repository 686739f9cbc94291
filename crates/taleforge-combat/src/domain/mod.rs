//! Domain model for the combat turn engine.

pub mod guards;
pub mod participant;
pub mod state;
