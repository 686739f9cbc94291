//! The per-topic subscriber registry and publish path.

use std::sync::Arc;

use dashmap::DashMap;
use taleforge_core::clock::SharedClock;
use taleforge_core::stream::{EventType, StreamEvent};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::config::BroadcastConfig;
use crate::error::BroadcastError;
use crate::subscription::Subscription;

/// One subscriber's queue.
#[derive(Debug)]
struct SubscriberSlot {
    id: Uuid,
    tx: mpsc::Sender<StreamEvent>,
}

/// Outcome of a single publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers that received the event.
    pub delivered: usize,
    /// Subscribers whose queue was full.
    pub dropped: usize,
    /// Disconnected subscribers removed from the registry.
    pub pruned: usize,
}

impl PublishReport {
    fn absorb(&mut self, other: Self) {
        self.delivered += other.delivered;
        self.dropped += other.dropped;
        self.pruned += other.pruned;
    }
}

/// Process-wide fan-out of stream events to topic subscribers.
///
/// Registry mutations are serialised per shard by the map; queue writes are
/// non-blocking `try_send`, so publishing never waits on a slow subscriber.
pub struct BroadcastService {
    topics: DashMap<String, Vec<SubscriberSlot>>,
    config: BroadcastConfig,
    clock: SharedClock,
}

impl BroadcastService {
    /// Creates an empty service.
    #[must_use]
    pub fn new(config: BroadcastConfig, clock: SharedClock) -> Self {
        Self {
            topics: DashMap::new(),
            config,
            clock,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> BroadcastConfig {
        self.config
    }

    pub(crate) fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Delivers `event` to every subscriber of `topic`.
    ///
    /// Publishing to a topic without subscribers is a no-op and does not
    /// create a registry entry.
    pub fn publish(&self, topic: &str, event: StreamEvent) -> PublishReport {
        let mut report = PublishReport::default();
        let Some(mut slots) = self.topics.get_mut(topic) else {
            trace!(topic, event = %event.event_type(), "no subscribers");
            return report;
        };

        slots.retain(|slot| match slot.tx.try_send(event.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                report.dropped += 1;
                warn!(
                    topic,
                    subscriber_id = %slot.id,
                    event = %event.event_type(),
                    "subscriber queue full, dropping event"
                );
                true
            }
            Err(TrySendError::Closed(_)) => {
                report.pruned += 1;
                debug!(topic, subscriber_id = %slot.id, "pruning disconnected subscriber");
                false
            }
        });
        let now_empty = slots.is_empty();
        drop(slots);

        if now_empty {
            self.topics.remove_if(topic, |_, slots| slots.is_empty());
        }
        report
    }

    /// Delivers `events` in order.
    pub fn publish_all<I>(&self, topic: &str, events: I) -> PublishReport
    where
        I: IntoIterator<Item = StreamEvent>,
    {
        let mut report = PublishReport::default();
        for event in events {
            report.absorb(self.publish(topic, event));
        }
        report
    }

    /// Builds the typed event named `event_name` from `data` and publishes it.
    ///
    /// # Errors
    ///
    /// Returns `BroadcastError::UnknownEvent` for names outside the closed
    /// set and `BroadcastError::InvalidPayload` if `data` does not match.
    pub fn publish_raw(
        &self,
        topic: &str,
        event_name: &str,
        data: serde_json::Value,
    ) -> Result<PublishReport, BroadcastError> {
        let event_type: EventType = event_name.parse()?;
        let event = StreamEvent::from_parts(event_type, data).map_err(|source| {
            BroadcastError::InvalidPayload {
                event: event_type,
                source,
            }
        })?;
        Ok(self.publish(topic, event))
    }

    /// Registers a new bounded queue under `topic`.
    ///
    /// The returned [`Subscription`] yields `connected` first and removes its
    /// queue from the registry when dropped.
    pub fn subscribe(self: &Arc<Self>, topic: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let id = Uuid::new_v4();
        self.topics
            .entry(topic.to_owned())
            .or_default()
            .push(SubscriberSlot { id, tx });
        debug!(topic, subscriber_id = %id, "subscriber registered");
        Subscription::new(Arc::clone(self), topic.to_owned(), id, rx)
    }

    /// Removes one subscriber. Returns whether it was registered.
    pub fn unsubscribe(&self, topic: &str, subscriber_id: Uuid) -> bool {
        let mut removed = false;
        if let Some(mut slots) = self.topics.get_mut(topic) {
            let before = slots.len();
            slots.retain(|slot| slot.id != subscriber_id);
            removed = slots.len() != before;
        }
        self.topics.remove_if(topic, |_, slots| slots.is_empty());
        if removed {
            debug!(topic, %subscriber_id, "subscriber deregistered");
        }
        removed
    }

    /// Number of subscribers on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, |slots| slots.len())
    }

    /// Whether `topic` has a registry entry.
    #[must_use]
    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    /// Number of topics with at least one subscriber.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Drops every queue, ending all open subscriptions.
    pub fn shutdown(&self) {
        let topics = self.topics.len();
        self.topics.clear();
        debug!(topics, "broadcast service shut down");
    }
}

impl std::fmt::Debug for BroadcastService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastService")
            .field("topics", &self.topics.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
