//! Taleforge Core: shared abstractions.
//!
//! This crate defines the error type, determinism seams (clock and RNG) and
//! the closed set of stream events that every other crate exchanges. It
//! contains no infrastructure code.

pub mod clock;
pub mod error;
pub mod rng;
pub mod stream;
