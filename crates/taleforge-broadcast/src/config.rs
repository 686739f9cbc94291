//! Broadcast configuration.

use std::time::Duration;

/// Default per-subscriber queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default idle period before a heartbeat is emitted.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Tuning for a [`BroadcastService`](crate::BroadcastService).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Events buffered per subscriber before new ones are dropped.
    pub queue_capacity: usize,
    /// Idle time after which a subscription yields a heartbeat.
    pub heartbeat_interval: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}
