//! Stream events delivered to connected clients.
//!
//! [`StreamEvent`] is a closed set of variants. Its serde representation is
//! the wire envelope `{"event": "<name>", "data": {...}}`, so serializing a
//! value produces exactly what subscribers receive.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sent once when a subscriber attaches to a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedPayload {
    /// Topic (game) the subscriber attached to.
    pub game_id: String,
    /// Identifier of the subscription.
    pub subscriber_id: Uuid,
    /// Time the subscription was opened.
    pub timestamp: DateTime<Utc>,
}

/// Emitted on idle periods to keep connections alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    /// Time the heartbeat was generated.
    pub timestamp: DateTime<Utc>,
}

/// Narrative text produced by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativePayload {
    /// The narrative text.
    pub content: String,
}

/// An agent invoked a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    /// Tool name.
    pub name: String,
    /// Tool arguments as supplied by the agent.
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Result of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultPayload {
    /// Tool name.
    pub name: String,
    /// Tool output.
    #[serde(default)]
    pub result: serde_json::Value,
}

/// Combat tracker status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatUpdatePayload {
    /// Current round (1-based).
    pub round_number: u32,
    /// Index into the active participants.
    pub turn_index: usize,
    /// Whether combat is still running.
    pub is_active: bool,
    /// Name of the participant whose turn it is.
    pub current_turn: Option<String>,
    /// Optional prompt text shown alongside the tracker.
    pub message: Option<String>,
}

/// A proposed action for an allied NPC, awaiting player acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatSuggestionPayload {
    /// Identifier of the suggestion.
    pub suggestion_id: Uuid,
    /// The allied NPC the suggestion is for.
    pub npc_id: String,
    /// Display name of the NPC.
    pub npc_name: String,
    /// The proposed action.
    pub action_text: String,
}

/// A system notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPayload {
    /// Notice text.
    pub message: String,
}

/// A line of NPC dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcDialoguePayload {
    /// Speaking NPC identifier.
    pub npc_id: String,
    /// Speaking NPC display name.
    pub npc_name: String,
    /// Spoken text.
    pub content: String,
}

/// Content policy notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyWarningPayload {
    /// Warning text.
    pub message: String,
}

/// A sanitized, user-facing error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// User-facing message.
    pub message: String,
    /// Machine-readable code.
    pub code: Option<String>,
}

/// The game state changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameUpdatePayload {
    /// The game that changed.
    pub game_id: String,
    /// Changed state fragment.
    #[serde(default)]
    pub state: serde_json::Value,
}

/// Scenario description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInfoPayload {
    /// Scenario title.
    pub title: String,
    /// Scenario description.
    pub description: String,
}

/// Marks the end of one processed player action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletePayload {
    /// Whether the pipeline stopped early.
    pub halted: bool,
    /// Why it stopped, if it did.
    pub reason: Option<String>,
}

/// Event payload variants delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Subscription opened.
    Connected(ConnectedPayload),
    /// Idle keep-alive.
    Heartbeat(HeartbeatPayload),
    /// Narrative text.
    Narrative(NarrativePayload),
    /// Tool invocation.
    ToolCall(ToolCallPayload),
    /// Tool output.
    ToolResult(ToolResultPayload),
    /// Combat tracker status.
    CombatUpdate(CombatUpdatePayload),
    /// Ally action suggestion.
    CombatSuggestion(CombatSuggestionPayload),
    /// System notice.
    System(SystemPayload),
    /// NPC dialogue line.
    NpcDialogue(NpcDialoguePayload),
    /// Content policy notice.
    PolicyWarning(PolicyWarningPayload),
    /// Sanitized error.
    Error(ErrorPayload),
    /// Game state changed.
    GameUpdate(GameUpdatePayload),
    /// Scenario description.
    ScenarioInfo(ScenarioInfoPayload),
    /// End of a processed action.
    Complete(CompletePayload),
}

impl StreamEvent {
    /// Returns the wire name of this event.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Connected(_) => EventType::Connected,
            Self::Heartbeat(_) => EventType::Heartbeat,
            Self::Narrative(_) => EventType::Narrative,
            Self::ToolCall(_) => EventType::ToolCall,
            Self::ToolResult(_) => EventType::ToolResult,
            Self::CombatUpdate(_) => EventType::CombatUpdate,
            Self::CombatSuggestion(_) => EventType::CombatSuggestion,
            Self::System(_) => EventType::System,
            Self::NpcDialogue(_) => EventType::NpcDialogue,
            Self::PolicyWarning(_) => EventType::PolicyWarning,
            Self::Error(_) => EventType::Error,
            Self::GameUpdate(_) => EventType::GameUpdate,
            Self::ScenarioInfo(_) => EventType::ScenarioInfo,
            Self::Complete(_) => EventType::Complete,
        }
    }

    /// Builds the typed event for `event_type` from a raw JSON payload.
    ///
    /// # Errors
    ///
    /// Returns a serde error if `data` does not match the payload schema of
    /// the named event.
    pub fn from_parts(
        event_type: EventType,
        data: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "event": event_type.as_str(),
            "data": data,
        }))
    }

    /// Serializes only the `data` half of the envelope.
    ///
    /// # Errors
    ///
    /// Returns a serde error if a payload cannot be represented as JSON.
    pub fn data(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut envelope = serde_json::to_value(self)?;
        Ok(envelope
            .get_mut("data")
            .map(serde_json::Value::take)
            .unwrap_or_default())
    }

    /// Convenience constructor for a narrative event.
    pub fn narrative(content: impl Into<String>) -> Self {
        Self::Narrative(NarrativePayload {
            content: content.into(),
        })
    }

    /// Convenience constructor for a system notice.
    pub fn system(message: impl Into<String>) -> Self {
        Self::System(SystemPayload {
            message: message.into(),
        })
    }
}

/// The closed set of event names on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// `connected`
    Connected,
    /// `heartbeat`
    Heartbeat,
    /// `narrative`
    Narrative,
    /// `tool_call`
    ToolCall,
    /// `tool_result`
    ToolResult,
    /// `combat_update`
    CombatUpdate,
    /// `combat_suggestion`
    CombatSuggestion,
    /// `system`
    System,
    /// `npc_dialogue`
    NpcDialogue,
    /// `policy_warning`
    PolicyWarning,
    /// `error`
    Error,
    /// `game_update`
    GameUpdate,
    /// `scenario_info`
    ScenarioInfo,
    /// `complete`
    Complete,
}

impl EventType {
    /// All event names, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Connected,
        Self::Heartbeat,
        Self::Narrative,
        Self::ToolCall,
        Self::ToolResult,
        Self::CombatUpdate,
        Self::CombatSuggestion,
        Self::System,
        Self::NpcDialogue,
        Self::PolicyWarning,
        Self::Error,
        Self::GameUpdate,
        Self::ScenarioInfo,
        Self::Complete,
    ];

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Heartbeat => "heartbeat",
            Self::Narrative => "narrative",
            Self::ToolCall => "tool_call",
            Self::ToolResult => "tool_result",
            Self::CombatUpdate => "combat_update",
            Self::CombatSuggestion => "combat_suggestion",
            Self::System => "system",
            Self::NpcDialogue => "npc_dialogue",
            Self::PolicyWarning => "policy_warning",
            Self::Error => "error",
            Self::GameUpdate => "game_update",
            Self::ScenarioInfo => "scenario_info",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an event name outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_narrative_serializes_as_wire_envelope() {
        let event = StreamEvent::narrative("The door creaks open.");

        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(
            value,
            json!({ "event": "narrative", "data": { "content": "The door creaks open." } })
        );
    }

    #[test]
    fn test_event_type_matches_serialized_tag() {
        let events = vec![
            StreamEvent::system("hello"),
            StreamEvent::Complete(CompletePayload {
                halted: true,
                reason: Some("dialogue".to_owned()),
            }),
            StreamEvent::CombatUpdate(CombatUpdatePayload {
                round_number: 2,
                turn_index: 1,
                is_active: true,
                current_turn: Some("Goblin".to_owned()),
                message: None,
            }),
        ];

        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["event"], event.event_type().as_str());
        }
    }

    #[test]
    fn test_from_parts_builds_typed_payload() {
        let event = StreamEvent::from_parts(
            EventType::NpcDialogue,
            json!({ "npc_id": "npc-1", "npc_name": "Mira", "content": "Welcome." }),
        )
        .unwrap();

        match event {
            StreamEvent::NpcDialogue(payload) => assert_eq!(payload.npc_name, "Mira"),
            other => panic!("expected NpcDialogue, got {other:?}"),
        }
    }

    #[test]
    fn test_from_parts_rejects_mismatched_payload() {
        let result = StreamEvent::from_parts(EventType::NpcDialogue, json!({ "content": 3 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_event_type_parses_every_wire_name() {
        for event_type in EventType::ALL {
            assert_eq!(event_type.as_str().parse::<EventType>(), Ok(event_type));
        }
        assert!("telemetry".parse::<EventType>().is_err());
    }

    #[test]
    fn test_data_strips_envelope() {
        let event = StreamEvent::system("Combat has ended.");
        assert_eq!(event.data().unwrap(), json!({ "message": "Combat has ended." }));
    }
}
