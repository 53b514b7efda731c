pub mod battle;
pub mod catalog;
pub mod combatant;
pub mod context;
pub mod dice;
pub mod effects;
pub mod narrative;
pub mod registry;
pub mod room;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenience
pub use ancestral_types::{DataSources, RulesConfig, ServerConfig};
pub use battle::{BattleError, BattleSession, LogEntry, LogKind, Side, TurnOutcome, TurnSlot};
pub use catalog::{AbilityDefinition, AbilityKind, Catalog, CharacterDefinition, DataError};
pub use combatant::{ClientId, Combatant, Stats};
pub use context::{ConfigError, ServerConfigExt};
pub use dice::{Dice, RandDice, VillainPack};
pub use effects::{EffectKey, EffectKind, EffectLedger, TimedEffect};
pub use narrative::{Story, StoryBuff};
pub use registry::{Broadcast, SessionManager};
pub use room::{DiceKind, RoomError, RoomEvent, RoomSession, RoomSnapshot, Stage};
pub use server::{Dispatch, GameServer, Intent, IntentReply};
