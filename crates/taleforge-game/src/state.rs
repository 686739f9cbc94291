//! The game state aggregate and the shared handle that points at it.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use taleforge_combat::domain::participant::CombatEntity;
use taleforge_combat::domain::state::CombatState;
use taleforge_core::error::DomainError;
use taleforge_core::rng::DeterministicRng;
use taleforge_core::stream::CombatUpdatePayload;

/// High-level mode the game is in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Free exploration and narration.
    #[default]
    Exploration,
    /// Turn-based combat.
    Combat,
    /// Conversation with one or more NPCs.
    Dialogue,
}

/// The player's character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCharacter {
    /// Entity identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Added to initiative rolls.
    #[serde(default)]
    pub initiative_modifier: i32,
}

/// A named non-player character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    /// Entity identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Added to initiative rolls.
    #[serde(default)]
    pub initiative_modifier: i32,
    /// Hostile towards the player.
    #[serde(default)]
    pub is_hostile: bool,
}

/// A monster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    /// Entity identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Added to initiative rolls.
    #[serde(default)]
    pub initiative_modifier: i32,
}

/// NPCs travelling with the player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Identifiers of NPC party members.
    pub member_ids: Vec<String>,
}

/// An ongoing conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueSession {
    /// Whether a conversation is in progress.
    pub is_active: bool,
    /// NPCs being spoken to.
    pub target_npc_ids: Vec<String>,
}

/// Scenario metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Title shown to players.
    pub title: String,
    /// Short description.
    pub description: String,
}

/// The authoritative state of one game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Game identifier; also the broadcast topic.
    pub game_id: String,
    /// Current mode.
    #[serde(default)]
    pub phase: GamePhase,
    /// The player character.
    pub character: PlayerCharacter,
    /// NPC party members.
    #[serde(default)]
    pub party: Party,
    /// Known NPCs.
    #[serde(default)]
    pub npcs: Vec<Npc>,
    /// Known monsters.
    #[serde(default)]
    pub monsters: Vec<Monster>,
    /// Combat tracker.
    #[serde(default)]
    pub combat: CombatState,
    /// Conversation tracker.
    #[serde(default)]
    pub dialogue: DialogueSession,
    /// Scenario metadata.
    #[serde(default)]
    pub scenario: Option<Scenario>,
}

impl GameState {
    /// Creates an empty game for `character`.
    #[must_use]
    pub fn new(game_id: impl Into<String>, character: PlayerCharacter) -> Self {
        Self {
            game_id: game_id.into(),
            phase: GamePhase::Exploration,
            character,
            party: Party::default(),
            npcs: Vec::new(),
            monsters: Vec::new(),
            combat: CombatState::default(),
            dialogue: DialogueSession::default(),
            scenario: None,
        }
    }

    /// Looks up an NPC by id.
    #[must_use]
    pub fn npc(&self, npc_id: &str) -> Option<&Npc> {
        self.npcs.iter().find(|npc| npc.id == npc_id)
    }

    /// Whether `npc_id` is a registered party member.
    #[must_use]
    pub fn is_party_member(&self, npc_id: &str) -> bool {
        self.party.member_ids.iter().any(|id| id == npc_id)
    }

    /// Builds the combat view of a roster entity.
    #[must_use]
    pub fn combat_entity(&self, entity_id: &str) -> Option<CombatEntity> {
        if self.character.id == entity_id {
            return Some(CombatEntity::Player {
                id: self.character.id.clone(),
                name: self.character.name.clone(),
                initiative_modifier: self.character.initiative_modifier,
            });
        }
        if let Some(npc) = self.npc(entity_id) {
            return Some(CombatEntity::Npc {
                id: npc.id.clone(),
                name: npc.name.clone(),
                initiative_modifier: npc.initiative_modifier,
                is_party_member: self.is_party_member(&npc.id),
                is_hostile: npc.is_hostile,
            });
        }
        self.monsters
            .iter()
            .find(|monster| monster.id == entity_id)
            .map(|monster| CombatEntity::Monster {
                id: monster.id.clone(),
                name: monster.name.clone(),
                initiative_modifier: monster.initiative_modifier,
            })
    }

    /// Starts combat between the given roster entities.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if an id is not on the roster.
    pub fn start_combat(
        &mut self,
        entity_ids: &[&str],
        rng: &mut dyn DeterministicRng,
    ) -> Result<(), DomainError> {
        let entities = entity_ids
            .iter()
            .map(|id| {
                self.combat_entity(id).ok_or_else(|| {
                    DomainError::Validation(format!("unknown combat entity: {id}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.combat.start_combat(entities, rng);
        if self.combat.is_active {
            self.phase = GamePhase::Combat;
        }
        Ok(())
    }

    /// Marks combat inactive; the phase is reset separately.
    pub fn end_combat(&mut self) {
        self.combat.end_combat();
    }

    /// Opens a conversation with `target_npc_ids`.
    pub fn begin_dialogue(&mut self, target_npc_ids: Vec<String>) {
        self.dialogue = DialogueSession {
            is_active: true,
            target_npc_ids,
        };
        self.phase = GamePhase::Dialogue;
    }

    /// Closes any open conversation.
    pub fn end_dialogue(&mut self) {
        self.dialogue = DialogueSession::default();
        if self.phase == GamePhase::Dialogue {
            self.phase = GamePhase::Exploration;
        }
    }

    /// Projects the combat tracker onto a `combat_update` payload.
    #[must_use]
    pub fn combat_update(&self, message: Option<String>) -> CombatUpdatePayload {
        CombatUpdatePayload {
            round_number: self.combat.round_number,
            turn_index: self.combat.turn_index,
            is_active: self.combat.is_active,
            current_turn: self.combat.current_turn().map(|p| p.name.clone()),
            message,
        }
    }
}

/// Shared, live reference to a [`GameState`].
///
/// Clones point at the same object, so a mutation through one clone is
/// visible through all of them. Guards must not be held across `.await`.
#[derive(Debug, Clone)]
pub struct GameHandle(Arc<RwLock<GameState>>);

impl GameHandle {
    /// Wraps a freshly loaded game state.
    #[must_use]
    pub fn new(state: GameState) -> Self {
        Self(Arc::new(RwLock::new(state)))
    }

    /// Acquires a read guard. A poisoned lock still yields the state.
    pub fn read(&self) -> RwLockReadGuard<'_, GameState> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires a write guard. A poisoned lock still yields the state.
    pub fn write(&self) -> RwLockWriteGuard<'_, GameState> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clones the current state.
    #[must_use]
    pub fn snapshot(&self) -> GameState {
        self.read().clone()
    }

    /// Returns the game identifier.
    #[must_use]
    pub fn game_id(&self) -> String {
        self.read().game_id.clone()
    }

    /// Whether both handles point at the same object.
    #[must_use]
    pub fn same_object(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for GameHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_object(other)
    }
}
