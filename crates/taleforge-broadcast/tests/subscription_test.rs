//! Subscription lifecycle tests for the broadcast service.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures::StreamExt;
use taleforge_broadcast::{BroadcastConfig, BroadcastService};
use taleforge_core::stream::{EventType, StreamEvent};
use taleforge_test_support::FixedClock;

fn service(queue_capacity: usize, heartbeat_ms: u64) -> Arc<BroadcastService> {
    Arc::new(BroadcastService::new(
        BroadcastConfig {
            queue_capacity,
            heartbeat_interval: Duration::from_millis(heartbeat_ms),
        },
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        )),
    ))
}

#[tokio::test]
async fn test_subscription_yields_connected_first() {
    // Arrange
    let service = service(8, 60_000);
    let mut subscription = service.subscribe("game-1");

    // Act
    let first = subscription.next_event().await.unwrap();

    // Assert
    match first {
        StreamEvent::Connected(payload) => {
            assert_eq!(payload.game_id, "game-1");
            assert_eq!(payload.subscriber_id, subscription.id());
        }
        other => panic!("expected Connected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_subscription_receives_published_events_in_order() {
    let service = service(8, 60_000);
    let mut subscription = service.subscribe("game-1");
    subscription.next_event().await;

    service.publish("game-1", StreamEvent::narrative("one"));
    service.publish("game-1", StreamEvent::narrative("two"));

    assert_eq!(
        subscription.next_event().await,
        Some(StreamEvent::narrative("one"))
    );
    assert_eq!(
        subscription.next_event().await,
        Some(StreamEvent::narrative("two"))
    );
}

#[tokio::test]
async fn test_idle_subscription_yields_heartbeat_instead_of_closing() {
    let service = service(8, 20);
    let mut subscription = service.subscribe("game-1");
    subscription.next_event().await;

    let event = subscription.next_event().await.unwrap();

    assert_eq!(event.event_type(), EventType::Heartbeat);
    assert_eq!(service.subscriber_count("game-1"), 1);
}

#[tokio::test]
async fn test_dropping_subscription_deregisters_and_removes_topic() {
    // Arrange
    let service = service(8, 60_000);
    let subscription = service.subscribe("game-1");
    let other = service.subscribe("game-1");
    assert_eq!(service.subscriber_count("game-1"), 2);

    // Act
    drop(subscription);

    // Assert
    assert_eq!(service.subscriber_count("game-1"), 1);
    drop(other);
    assert!(!service.has_topic("game-1"));
}

#[tokio::test]
async fn test_cancelled_consumer_task_deregisters() {
    // Arrange
    let service = service(8, 60_000);
    let subscription = service.subscribe("game-1");
    let consumer = tokio::spawn(async move {
        let mut stream = Box::pin(subscription.into_stream());
        while stream.next().await.is_some() {}
    });
    tokio::task::yield_now().await;

    // Act
    consumer.abort();
    let _ = consumer.await;

    // Assert
    assert!(!service.has_topic("game-1"));
}

#[tokio::test]
async fn test_full_queue_drops_next_event_for_that_subscriber_only() {
    // Arrange
    let service = service(1, 60_000);
    let mut slow = service.subscribe("game-1");
    let mut fast = service.subscribe("game-1");
    slow.next_event().await;
    fast.next_event().await;

    service.publish("game-1", StreamEvent::narrative("first"));
    assert_eq!(fast.next_event().await, Some(StreamEvent::narrative("first")));

    // Act
    let report = service.publish("game-1", StreamEvent::narrative("second"));

    // Assert
    assert_eq!(report.dropped, 1);
    assert_eq!(report.delivered, 1);
    assert_eq!(fast.next_event().await, Some(StreamEvent::narrative("second")));
    assert_eq!(slow.next_event().await, Some(StreamEvent::narrative("first")));
    assert_eq!(service.subscriber_count("game-1"), 2);
}

#[tokio::test]
async fn test_shutdown_ends_open_subscriptions() {
    let service = service(8, 60_000);
    let mut subscription = service.subscribe("game-1");
    subscription.next_event().await;

    service.shutdown();

    assert_eq!(subscription.next_event().await, None);
    assert_eq!(service.topic_count(), 0);
}

#[tokio::test]
async fn test_stream_adapter_yields_connected_then_events() {
    let service = service(8, 60_000);
    let subscription = service.subscribe("game-1");
    service.publish("game-1", StreamEvent::system("Combat begins!"));

    let events: Vec<StreamEvent> = subscription.into_stream().take(2).collect().await;

    assert_eq!(events[0].event_type(), EventType::Connected);
    assert_eq!(events[1], StreamEvent::system("Combat begins!"));
    assert!(!service.has_topic("game-1"));
}
