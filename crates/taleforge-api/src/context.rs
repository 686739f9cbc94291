//! Local context construction and message metadata.

use std::fmt::Write as _;

use taleforge_game::ports::{AgentType, ContextProvider, MetadataService};
use taleforge_game::state::{GamePhase, GameState};

/// Renders the game roster and trackers as plain text for agents.
#[derive(Debug, Clone, Copy, Default)]
pub struct RosterContextProvider;

impl ContextProvider for RosterContextProvider {
    fn build_context(&self, game: &GameState, _message: &str, agent_type: AgentType) -> String {
        let mut text = String::new();
        if let Some(scenario) = &game.scenario {
            let _ = writeln!(text, "Scenario: {}. {}", scenario.title, scenario.description);
        }
        let phase = match game.phase {
            GamePhase::Exploration => "exploration",
            GamePhase::Combat => "combat",
            GamePhase::Dialogue => "dialogue",
        };
        let _ = writeln!(text, "Phase: {phase}");
        let _ = writeln!(
            text,
            "Player character: {} (id: {})",
            game.character.name, game.character.id
        );

        let party: Vec<String> = game
            .party
            .member_ids
            .iter()
            .filter_map(|id| game.npc(id))
            .map(|npc| format!("{} (id: {})", npc.name, npc.id))
            .collect();
        if !party.is_empty() {
            let _ = writeln!(text, "Party: {}", party.join(", "));
        }

        if game.combat.is_active {
            let order: Vec<String> = game
                .combat
                .active_participants()
                .map(|p| match p.initiative {
                    Some(initiative) => format!("{} ({initiative})", p.name),
                    None => p.name.clone(),
                })
                .collect();
            let current = game
                .combat
                .current_turn()
                .map_or("nobody", |p| p.name.as_str());
            let _ = writeln!(
                text,
                "Combat: round {}, current turn: {current}; order: {}",
                game.combat.round_number,
                order.join(", ")
            );
        }

        if game.dialogue.is_active {
            let names: Vec<&str> = game
                .dialogue
                .target_npc_ids
                .iter()
                .filter_map(|id| game.npc(id))
                .map(|npc| npc.name.as_str())
                .collect();
            let _ = writeln!(text, "Dialogue with: {}", names.join(", "));
        }

        let _ = write!(text, "Role: {agent_type}");
        text
    }

    fn enrich_context(&self, game: &GameState, message: &str, mut context: String) -> String {
        let message = message.to_lowercase();
        let npcs = game.npcs.iter().map(|npc| {
            let kind = if npc.is_hostile { "hostile npc" } else { "npc" };
            (&npc.name, &npc.id, kind)
        });
        let monsters = game
            .monsters
            .iter()
            .map(|monster| (&monster.name, &monster.id, "monster"));
        for (name, id, kind) in npcs.chain(monsters) {
            if message.contains(&name.to_lowercase()) {
                let _ = write!(context, "\nMentioned: {name} ({kind}, id: {id})");
            }
        }
        context
    }
}

/// Detects NPCs the player speaks to directly.
///
/// An NPC is addressed by a leading vocative (`"Bram, ..."`, `"Bram: ..."`)
/// or an `@Bram` mention. Hostile NPCs are never targets and nothing is
/// detected during combat, where a named order belongs to the combat turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressedNpcDetector;

impl MetadataService for AddressedNpcDetector {
    fn detect_dialogue_targets(&self, game: &GameState, message: &str) -> Vec<String> {
        if game.combat.is_active {
            return Vec::new();
        }
        let message = message.trim().to_lowercase();
        game.npcs
            .iter()
            .filter(|npc| !npc.is_hostile)
            .filter(|npc| addresses(&message, &npc.name.to_lowercase()))
            .map(|npc| npc.id.clone())
            .collect()
    }
}

fn addresses(message: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let vocative = message
        .strip_prefix(name)
        .is_some_and(|rest| rest.starts_with([',', ':', '!']));
    vocative || message.contains(&format!("@{name}"))
}
