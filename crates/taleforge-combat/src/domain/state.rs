//! The combat tracker and its turn operations.

use serde::{Deserialize, Serialize};
use taleforge_core::rng::DeterministicRng;
use tracing::debug;

use super::participant::{CombatEntity, Participant};

/// Combat tracker for one game.
///
/// `turn_index` addresses the subsequence of *active* participants only.
/// The state is marked inactive rather than discarded when combat ends, so
/// round and turn counters stay inspectable until the next [`start_combat`].
///
/// [`start_combat`]: CombatState::start_combat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    /// Current round, starting at 1.
    pub round_number: u32,
    /// Index into the active participants.
    pub turn_index: usize,
    /// Whether combat is running.
    pub is_active: bool,
    /// Incremented each time combat (re)starts.
    pub combat_occurrence: u32,
    /// Participants in initiative order.
    pub participants: Vec<Participant>,
}

impl Default for CombatState {
    fn default() -> Self {
        Self {
            round_number: 1,
            turn_index: 0,
            is_active: false,
            combat_occurrence: 0,
            participants: Vec::new(),
        }
    }
}

impl CombatState {
    /// Starts a fresh encounter with the given entities.
    ///
    /// Clears previous participants, resets counters, bumps
    /// `combat_occurrence`, and rolls initiative for each entity.
    pub fn start_combat<I>(&mut self, entities: I, rng: &mut dyn DeterministicRng)
    where
        I: IntoIterator<Item = CombatEntity>,
    {
        self.participants.clear();
        self.round_number = 1;
        self.turn_index = 0;
        self.is_active = true;
        self.combat_occurrence = self.combat_occurrence.saturating_add(1);

        for entity in entities {
            self.add_participant(&entity, rng);
        }

        if self.active_count() == 0 {
            self.is_active = false;
        }
        debug!(
            occurrence = self.combat_occurrence,
            participants = self.participants.len(),
            "combat started"
        );
    }

    /// Marks combat inactive. Counters and participants are kept.
    pub fn end_combat(&mut self) {
        self.is_active = false;
        debug!(
            occurrence = self.combat_occurrence,
            round = self.round_number,
            "combat ended"
        );
    }

    /// Adds an entity to the initiative order.
    ///
    /// Rolls `1d20 + initiative_modifier`, appends, then stably re-sorts by
    /// initiative descending so ties keep insertion order. Adding an entity
    /// that is already present returns the existing record unchanged.
    #[allow(clippy::cast_possible_wrap)]
    pub fn add_participant(
        &mut self,
        entity: &CombatEntity,
        rng: &mut dyn DeterministicRng,
    ) -> Participant {
        if let Some(existing) = self.participant(entity.id()) {
            debug!(entity_id = entity.id(), "participant already in combat");
            return existing.clone();
        }

        let roll = rng.next_u32_range(1, 20) as i32;
        let faction = entity.faction();
        let entity_type = entity.entity_type();
        let participant = Participant {
            entity_id: entity.id().to_owned(),
            entity_type,
            faction,
            name: entity.name().to_owned(),
            initiative: Some(roll.saturating_add(entity.initiative_modifier())),
            is_player: matches!(entity, CombatEntity::Player { .. }),
            is_active: true,
        };

        self.participants.push(participant.clone());
        self.sort_by_initiative();
        participant
    }

    /// Removes a participant and re-clamps the turn index.
    pub fn remove_participant(&mut self, entity_id: &str) -> Option<Participant> {
        let position = self
            .participants
            .iter()
            .position(|p| p.entity_id == entity_id)?;
        let removed = self.participants.remove(position);
        self.clamp_turn_index();
        Some(removed)
    }

    /// Takes a participant out of the turn order without removing it.
    ///
    /// Returns `false` if no participant has `entity_id`.
    pub fn deactivate_participant(&mut self, entity_id: &str) -> bool {
        let Some(participant) = self
            .participants
            .iter_mut()
            .find(|p| p.entity_id == entity_id)
        else {
            return false;
        };
        participant.is_active = false;
        self.clamp_turn_index();
        true
    }

    /// Advances to the next active participant.
    ///
    /// Wrapping past the last active participant resets the index to 0 and
    /// increments the round. With no active participants, combat ends.
    pub fn next_turn(&mut self) -> Option<&Participant> {
        let active = self.active_count();
        if active == 0 {
            self.turn_index = 0;
            self.is_active = false;
            return None;
        }

        // Advance from the participant `current_turn` reports.
        let current = if self.turn_index < active {
            self.turn_index
        } else {
            0
        };
        let next = current + 1;
        if next >= active {
            self.turn_index = 0;
            self.round_number = self.round_number.saturating_add(1);
        } else {
            self.turn_index = next;
        }
        self.current_turn()
    }

    /// Returns the participant whose turn it is.
    ///
    /// Never returns an inactive participant; `None` iff none are active.
    #[must_use]
    pub fn current_turn(&self) -> Option<&Participant> {
        let active = self.active_count();
        if active == 0 {
            return None;
        }
        let index = if self.turn_index < active {
            self.turn_index
        } else {
            0
        };
        self.active_participants().nth(index)
    }

    /// Participants that still take turns, in initiative order.
    pub fn active_participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_active)
    }

    /// Number of active participants.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_participants().count()
    }

    /// Looks up a participant by entity id.
    #[must_use]
    pub fn participant(&self, entity_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.entity_id == entity_id)
    }

    fn sort_by_initiative(&mut self) {
        // Stable; `None` sorts after every `Some`.
        self.participants
            .sort_by(|a, b| b.initiative.cmp(&a.initiative));
    }

    fn clamp_turn_index(&mut self) {
        let active = self.active_count();
        if self.turn_index >= active {
            self.turn_index = 0;
        }
        if active == 0 {
            self.is_active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::participant::{EntityType, Faction};
    use taleforge_test_support::{MockRng, SequenceRng};

    fn participant(id: &str, faction: Faction, initiative: i32) -> Participant {
        Participant {
            entity_id: id.to_owned(),
            entity_type: match faction {
                Faction::Player => EntityType::Player,
                Faction::Ally | Faction::Neutral => EntityType::Npc,
                Faction::Enemy => EntityType::Monster,
            },
            faction,
            name: id.to_owned(),
            initiative: Some(initiative),
            is_player: faction == Faction::Player,
            is_active: true,
        }
    }

    fn three_way_state() -> CombatState {
        CombatState {
            round_number: 1,
            turn_index: 0,
            is_active: true,
            combat_occurrence: 1,
            participants: vec![
                participant("player", Faction::Player, 15),
                participant("ally", Faction::Ally, 14),
                participant("enemy", Faction::Enemy, 12),
            ],
        }
    }

    fn monster(id: &str, initiative_modifier: i32) -> CombatEntity {
        CombatEntity::Monster {
            id: id.to_owned(),
            name: id.to_owned(),
            initiative_modifier,
        }
    }

    #[test]
    fn test_add_participant_rolls_initiative_and_sorts_descending() {
        // Arrange
        let mut state = CombatState::default();
        let mut rng = SequenceRng::new(vec![5, 18, 11]);

        // Act
        state.add_participant(&monster("slow", 0), &mut rng);
        let fast = state.add_participant(&monster("fast", 2), &mut rng);
        state.add_participant(&monster("middle", 1), &mut rng);

        // Assert
        assert_eq!(fast.initiative, Some(20));
        let order: Vec<&str> = state
            .participants
            .iter()
            .map(|p| p.entity_id.as_str())
            .collect();
        assert_eq!(order, vec!["fast", "middle", "slow"]);
    }

    #[test]
    fn test_add_participant_ties_keep_insertion_order() {
        let mut state = CombatState::default();
        let mut rng = SequenceRng::new(vec![10, 10, 10]);

        state.add_participant(&monster("first", 0), &mut rng);
        state.add_participant(&monster("second", 0), &mut rng);
        state.add_participant(&monster("third", 0), &mut rng);

        let order: Vec<&str> = state
            .participants
            .iter()
            .map(|p| p.entity_id.as_str())
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_add_participant_is_idempotent_per_entity() {
        let mut state = CombatState::default();
        let mut rng = SequenceRng::new(vec![7]);

        let first = state.add_participant(&monster("goblin", 0), &mut rng);
        let second = state.add_participant(&monster("goblin", 0), &mut rng);

        assert_eq!(first, second);
        assert_eq!(state.participants.len(), 1);
    }

    #[test]
    fn test_start_combat_resets_and_increments_occurrence() {
        // Arrange
        let mut state = three_way_state();
        state.round_number = 4;
        state.turn_index = 2;
        let mut rng = MockRng;

        // Act
        state.start_combat(vec![monster("wolf", 0)], &mut rng);

        // Assert
        assert!(state.is_active);
        assert_eq!(state.round_number, 1);
        assert_eq!(state.turn_index, 0);
        assert_eq!(state.combat_occurrence, 2);
        assert_eq!(state.participants.len(), 1);
    }

    #[test]
    fn test_start_combat_without_entities_stays_inactive() {
        let mut state = CombatState::default();
        state.start_combat(Vec::new(), &mut MockRng);

        assert!(!state.is_active);
        assert_eq!(state.combat_occurrence, 1);
    }

    #[test]
    fn test_end_combat_keeps_counters() {
        let mut state = three_way_state();
        state.round_number = 3;

        state.end_combat();

        assert!(!state.is_active);
        assert_eq!(state.round_number, 3);
        assert_eq!(state.participants.len(), 3);
    }

    #[test]
    fn test_current_turn_at_last_index_then_wraps_to_next_round() {
        // Arrange
        let mut state = three_way_state();
        state.turn_index = 2;

        // Act
        let current = state.current_turn().map(|p| p.entity_id.clone());
        state.next_turn();

        // Assert
        assert_eq!(current.as_deref(), Some("enemy"));
        assert_eq!(state.turn_index, 0);
        assert_eq!(state.round_number, 2);
        assert_eq!(
            state.current_turn().map(|p| p.entity_id.as_str()),
            Some("player")
        );
    }

    #[test]
    fn test_next_turn_n_times_completes_exactly_one_round() {
        for size in 1..=6 {
            let mut state = CombatState {
                is_active: true,
                participants: (0..size)
                    .map(|i| participant(&format!("p{i}"), Faction::Enemy, 20 - i))
                    .collect(),
                ..CombatState::default()
            };

            for _ in 0..size {
                state.next_turn();
            }

            assert_eq!(state.turn_index, 0, "size {size}");
            assert_eq!(state.round_number, 2, "size {size}");
        }
    }

    #[test]
    fn test_next_turn_skips_inactive_participants() {
        let mut state = three_way_state();
        state.participants[1].is_active = false;

        let next = state.next_turn().map(|p| p.entity_id.clone());

        assert_eq!(next.as_deref(), Some("enemy"));
        assert_eq!(state.turn_index, 1);
    }

    #[test]
    fn test_next_turn_from_stale_index_advances_past_reported_turn() {
        // Arrange
        let mut state = three_way_state();
        state.turn_index = 5;
        let reported = state.current_turn().map(|p| p.entity_id.clone());

        // Act
        let next = state.next_turn().map(|p| p.entity_id.clone());

        // Assert
        assert_eq!(reported.as_deref(), Some("player"));
        assert_eq!(next.as_deref(), Some("ally"));
        assert_eq!(state.turn_index, 1);
        assert_eq!(state.round_number, 1);
    }

    #[test]
    fn test_next_turn_without_active_participants_ends_combat() {
        let mut state = three_way_state();
        for p in &mut state.participants {
            p.is_active = false;
        }

        assert!(state.next_turn().is_none());
        assert!(!state.is_active);
    }

    #[test]
    fn test_current_turn_never_returns_inactive_participant() {
        let mut state = three_way_state();
        for inactive in 0..3 {
            state.participants[inactive].is_active = false;
            for index in 0..4 {
                state.turn_index = index;
                if let Some(current) = state.current_turn() {
                    assert!(current.is_active);
                }
            }
        }
        assert!(state.current_turn().is_none());
    }

    #[test]
    fn test_remove_participant_clamps_turn_index() {
        // Arrange
        let mut state = three_way_state();
        state.turn_index = 2;

        // Act
        let removed = state.remove_participant("enemy");

        // Assert
        assert_eq!(removed.map(|p| p.entity_id).as_deref(), Some("enemy"));
        assert_eq!(state.turn_index, 0);
        assert!(state.is_active);
    }

    #[test]
    fn test_remove_last_participant_ends_combat() {
        let mut state = CombatState {
            is_active: true,
            participants: vec![participant("solo", Faction::Enemy, 10)],
            ..CombatState::default()
        };

        state.remove_participant("solo");

        assert!(!state.is_active);
        assert!(state.current_turn().is_none());
    }

    #[test]
    fn test_remove_unknown_participant_is_none() {
        let mut state = three_way_state();
        assert!(state.remove_participant("ghost").is_none());
        assert_eq!(state.participants.len(), 3);
    }

    #[test]
    fn test_deactivate_participant_clamps_index() {
        let mut state = three_way_state();
        state.turn_index = 2;

        assert!(state.deactivate_participant("enemy"));
        assert_eq!(state.turn_index, 0);
        assert!(!state.deactivate_participant("ghost"));
    }

    #[test]
    fn test_none_initiative_sorts_last() {
        let mut state = CombatState::default();
        state.participants.push(Participant {
            initiative: None,
            ..participant("unrolled", Faction::Neutral, 0)
        });
        let mut rng = SequenceRng::new(vec![1]);

        state.add_participant(&monster("rolled", -5), &mut rng);

        assert_eq!(state.participants[0].entity_id, "rolled");
        assert_eq!(state.participants[1].entity_id, "unrolled");
    }
}
