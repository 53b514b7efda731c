//! Error types for battle intents

use thiserror::Error;

/// Rejected hero or boss action. Nothing is mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    #[error("it is not a hero's turn")]
    NotHeroTurn,

    #[error("you cannot act for another player")]
    NotYourTurn,

    #[error("you are out of the fight")]
    Defeated,

    #[error("unknown ability '{ability}'")]
    InvalidAbility { ability: String },

    #[error("'{ability}' is on cooldown for {turns} more turn(s)")]
    OnCooldown { ability: String, turns: u32 },

    #[error("not enough resource: need {needed}, have {available}")]
    InsufficientResource { needed: i32, available: i32 },

    #[error("it is not the boss's turn")]
    NotBossTurn,
}
