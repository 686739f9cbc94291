//! Broadcast error types.

use taleforge_core::stream::{EventType, UnknownEventType};
use thiserror::Error;

/// Errors raised while constructing an event for publication.
///
/// Delivery failures are never surfaced; they are handled per subscriber.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The event name is outside the closed set.
    #[error(transparent)]
    UnknownEvent(#[from] UnknownEventType),

    /// The payload does not match the schema of the named event.
    #[error("invalid payload for {event}: {source}")]
    InvalidPayload {
        /// The event that was being built.
        event: EventType,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}
