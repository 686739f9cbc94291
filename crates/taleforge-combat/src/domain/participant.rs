//! Combat participants and the entities they are created from.

use serde::{Deserialize, Serialize};

/// Combat-side classification of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Faction {
    /// The human player's character.
    Player,
    /// An NPC fighting alongside the player.
    Ally,
    /// A hostile combatant.
    Enemy,
    /// A combatant on nobody's side.
    Neutral,
}

/// What kind of entity a participant was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// The player character.
    Player,
    /// A named non-player character.
    Npc,
    /// A monster.
    Monster,
}

/// An entry in the initiative order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Identifier of the underlying entity.
    pub entity_id: String,
    /// Kind of the underlying entity.
    pub entity_type: EntityType,
    /// Side the participant fights on.
    pub faction: Faction,
    /// Display name.
    pub name: String,
    /// Initiative total; `None` sorts last.
    pub initiative: Option<i32>,
    /// Whether this is the player's character.
    pub is_player: bool,
    /// Whether the participant still takes turns.
    pub is_active: bool,
}

/// An entity entering combat.
///
/// The variant determines the participant's [`EntityType`] and [`Faction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatEntity {
    /// The player character.
    Player {
        /// Entity identifier.
        id: String,
        /// Display name.
        name: String,
        /// Added to the initiative roll.
        initiative_modifier: i32,
    },
    /// A named NPC.
    Npc {
        /// Entity identifier.
        id: String,
        /// Display name.
        name: String,
        /// Added to the initiative roll.
        initiative_modifier: i32,
        /// Registered in the player's party.
        is_party_member: bool,
        /// Hostile towards the player.
        is_hostile: bool,
    },
    /// A monster.
    Monster {
        /// Entity identifier.
        id: String,
        /// Display name.
        name: String,
        /// Added to the initiative roll.
        initiative_modifier: i32,
    },
}

impl CombatEntity {
    /// Returns the entity identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Player { id, .. } | Self::Npc { id, .. } | Self::Monster { id, .. } => id,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Player { name, .. } | Self::Npc { name, .. } | Self::Monster { name, .. } => {
                name
            }
        }
    }

    /// Returns the initiative modifier.
    #[must_use]
    pub fn initiative_modifier(&self) -> i32 {
        match self {
            Self::Player {
                initiative_modifier,
                ..
            }
            | Self::Npc {
                initiative_modifier,
                ..
            }
            | Self::Monster {
                initiative_modifier,
                ..
            } => *initiative_modifier,
        }
    }

    /// Infers the combat faction.
    ///
    /// Party members are allies even when flagged hostile.
    #[must_use]
    pub fn faction(&self) -> Faction {
        match self {
            Self::Player { .. } => Faction::Player,
            Self::Npc {
                is_party_member: true,
                ..
            } => Faction::Ally,
            Self::Npc {
                is_hostile: true, ..
            }
            | Self::Monster { .. } => Faction::Enemy,
            Self::Npc { .. } => Faction::Neutral,
        }
    }

    /// Infers the entity type.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Player { .. } => EntityType::Player,
            Self::Npc { .. } => EntityType::Npc,
            Self::Monster { .. } => EntityType::Monster,
        }
    }
}
