//! Concrete steps used by the turn policy.
//!
//! Each step holds the shared [`Services`](crate::application::services::Services)
//! bundle. Steps that change the game write through the live handle and
//! persist immediately so a later reload sees the change.

mod agent;
mod combat;
mod control;
mod dialogue;
mod state;

pub use agent::{BuildContext, EnrichContext, ExecuteAgent, SelectAgent, WrapAllyAction};
pub use combat::{
    AutoEndCombat, BroadcastCombatStart, ExecuteNpcTurn, PromptNpcTurn, PromptPlayerTurn,
    SuggestAllyAction, TransitionToNarrative,
};
pub use control::Halt;
pub use dialogue::{BeginDialogue, CloseStaleDialogue, DetectDialogueTargets, ExecuteDialogueAgent};
pub use state::ReloadState;
