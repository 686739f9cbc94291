//! Taleforge: event broadcast.
//!
//! A [`BroadcastService`] fans stream events out to every subscriber of a
//! topic (one topic per game). Each subscriber owns a bounded queue; publishing
//! never blocks, a full queue loses the event for that subscriber only, and a
//! closed queue is pruned.
//!
//! # Lifecycle
//!
//! Create one service per process at startup, share it behind an [`Arc`], and
//! call [`BroadcastService::shutdown`] on teardown. Shutdown drops every queue
//! sender, which ends all open [`Subscription`]s.
//!
//! [`Arc`]: std::sync::Arc

pub mod config;
pub mod error;
pub mod service;
pub mod subscription;

pub use config::BroadcastConfig;
pub use error::BroadcastError;
pub use service::{BroadcastService, PublishReport};
pub use subscription::Subscription;
