//! Taleforge: Combat turn engine.
//!
//! Owns the combat tracker: participants, initiative order, round and turn
//! counters, and the faction-based predicates the orchestration pipeline uses
//! to decide whether to auto-continue, prompt the player, or end combat.

pub mod domain;
