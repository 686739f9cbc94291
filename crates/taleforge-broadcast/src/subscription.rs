//! A single subscriber's view of a topic.

use std::sync::Arc;

use futures::Stream;
use taleforge_core::stream::{ConnectedPayload, HeartbeatPayload, StreamEvent};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::service::BroadcastService;

/// An open subscription to one topic.
///
/// Yields `connected` first, then queued events, substituting a `heartbeat`
/// whenever the queue stays idle for the configured interval. The queue is
/// deregistered when the subscription ends or is dropped, whichever happens
/// first, so cancelled consumers never leak registry entries.
pub struct Subscription {
    service: Arc<BroadcastService>,
    topic: String,
    id: Uuid,
    rx: mpsc::Receiver<StreamEvent>,
    connected_sent: bool,
    registered: bool,
}

impl Subscription {
    pub(crate) fn new(
        service: Arc<BroadcastService>,
        topic: String,
        id: Uuid,
        rx: mpsc::Receiver<StreamEvent>,
    ) -> Self {
        Self {
            service,
            topic,
            id,
            rx,
            connected_sent: false,
            registered: true,
        }
    }

    /// Identifier of this subscriber.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Topic this subscription is attached to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the queue has been closed (service shutdown); the
    /// subscription is deregistered at that point.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if !self.registered {
            return None;
        }
        if !self.connected_sent {
            self.connected_sent = true;
            return Some(StreamEvent::Connected(ConnectedPayload {
                game_id: self.topic.clone(),
                subscriber_id: self.id,
                timestamp: self.service.clock().now(),
            }));
        }

        let interval = self.service.config().heartbeat_interval;
        match tokio::time::timeout(interval, self.rx.recv()).await {
            Ok(Some(event)) => Some(event),
            Ok(None) => {
                debug!(topic = %self.topic, subscriber_id = %self.id, "subscriber queue closed");
                self.deregister();
                None
            }
            Err(_) => Some(StreamEvent::Heartbeat(HeartbeatPayload {
                timestamp: self.service.clock().now(),
            })),
        }
    }

    /// Adapts the subscription into a [`Stream`].
    ///
    /// Dropping the stream drops the subscription and deregisters it.
    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            let next = subscription.next_event().await;
            next.map(|event| (event, subscription))
        })
    }

    fn deregister(&mut self) {
        if self.registered {
            self.registered = false;
            self.rx.close();
            self.service.unsubscribe(&self.topic, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.deregister();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .field("registered", &self.registered)
            .finish_non_exhaustive()
    }
}
