//! Turn events reach real broadcast subscribers.

use std::sync::Arc;

use futures::StreamExt;
use taleforge_broadcast::{BroadcastConfig, BroadcastService};
use taleforge_core::stream::{CompletePayload, StreamEvent};
use taleforge_game::ports::{AgentRoster, AgentType};
use taleforge_orchestration::application::bus::BroadcastEventBus;
use taleforge_orchestration::application::config::{DeliveryMode, OrchestratorConfig};
use taleforge_orchestration::application::orchestrator::GameOrchestrator;
use taleforge_orchestration::application::services::Services;
use taleforge_store::InMemoryGameStore;
use taleforge_test_support::fixtures::{self, GAME_ID};
use taleforge_test_support::{
    FixedClock, ScriptedAgent, ScriptedSuggester, StaticContextProvider, StaticMetadataService,
};

fn orchestrator(broadcaster: &Arc<BroadcastService>, delivery: DeliveryMode) -> GameOrchestrator {
    let clock = Arc::new(FixedClock::epoch());
    let store = Arc::new(InMemoryGameStore::new(clock));
    store.put(fixtures::game());
    let narrative = ScriptedAgent::replying(vec![
        StreamEvent::narrative("Lanterns sway in the wind."),
        StreamEvent::narrative("Something moves below the bridge."),
    ]);
    let services = Services {
        agents: AgentRoster::new().with(AgentType::Narrative, Arc::new(narrative)),
        context: Arc::new(StaticContextProvider),
        metadata: Arc::new(StaticMetadataService::none()),
        games: store,
        bus: Arc::new(BroadcastEventBus::new(Arc::clone(broadcaster))),
        suggester: Arc::new(ScriptedSuggester::new("hold")),
        delivery,
    };
    GameOrchestrator::new(
        services,
        OrchestratorConfig {
            delivery,
            ..OrchestratorConfig::default()
        },
    )
}

async fn delivered_after_action(delivery: DeliveryMode) -> Vec<StreamEvent> {
    let broadcaster = Arc::new(BroadcastService::new(
        BroadcastConfig::default(),
        Arc::new(FixedClock::epoch()),
    ));
    let subscription = broadcaster.subscribe(GAME_ID);
    let orchestrator = orchestrator(&broadcaster, delivery);

    orchestrator
        .process_user_action(GAME_ID, "cross the bridge")
        .await
        .unwrap();

    subscription.into_stream().take(4).collect().await
}

#[tokio::test]
async fn test_streaming_subscriber_receives_events_then_complete() {
    // Act
    let events = delivered_after_action(DeliveryMode::Streaming).await;

    // Assert
    assert!(matches!(events[0], StreamEvent::Connected(_)));
    assert_eq!(
        events[1..],
        [
            StreamEvent::narrative("Lanterns sway in the wind."),
            StreamEvent::narrative("Something moves below the bridge."),
            StreamEvent::Complete(CompletePayload {
                halted: false,
                reason: None,
            }),
        ]
    );
}

#[tokio::test]
async fn test_buffered_subscriber_sees_the_same_sequence() {
    // Act
    let streamed = delivered_after_action(DeliveryMode::Streaming).await;
    let buffered = delivered_after_action(DeliveryMode::Buffered).await;

    // Assert
    assert_eq!(streamed[1..], buffered[1..]);
}

#[tokio::test]
async fn test_other_games_subscribers_receive_nothing() {
    // Arrange
    let broadcaster = Arc::new(BroadcastService::new(
        BroadcastConfig::default(),
        Arc::new(FixedClock::epoch()),
    ));
    let mut bystander = broadcaster.subscribe("game-2");
    let orchestrator = orchestrator(&broadcaster, DeliveryMode::Streaming);

    // Act
    orchestrator
        .process_user_action(GAME_ID, "cross the bridge")
        .await
        .unwrap();
    broadcaster.shutdown();

    // Assert
    assert!(matches!(
        bystander.next_event().await,
        Some(StreamEvent::Connected(_))
    ));
    assert_eq!(bystander.next_event().await, None);
}
