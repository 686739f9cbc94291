//! Taleforge: Step pipeline engine and the canonical turn policy.
//!
//! The [`domain`] layer holds the execution engine: the copy-on-write
//! [`domain::context::OrchestrationContext`], the [`domain::step::Step`]
//! contract, conditional and bounded-loop composites, and the pipeline that
//! runs them in order. The [`application`] layer wires concrete steps into
//! the turn policy and exposes [`application::orchestrator::GameOrchestrator`]
//! as the entry point for a player action.

pub mod application;
pub mod domain;
