//! Concrete steps, the canonical turn policy and the orchestrator entry point.

pub mod bus;
pub mod config;
pub mod orchestrator;
pub mod policy;
pub mod services;
pub mod steps;
