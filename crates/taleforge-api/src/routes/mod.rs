//! Route modules.

pub mod events;
pub mod games;
pub mod health;
