//! Error types for room and registry intents

use thiserror::Error;

use super::Stage;
use crate::battle::BattleError;

/// Validation failures reported to the requesting client only.
/// A rejected intent never mutates room state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room '{code}' does not exist")]
    RoomNotFound { code: String },

    #[error("room is full (max {max} players)")]
    RoomFull { max: usize },

    #[error("the game has already started")]
    AlreadyStarted,

    #[error("already in a room")]
    AlreadyInRoom,

    #[error("not in a room")]
    NotInRoom,

    #[error("only the host can do that")]
    NotHost,

    #[error("at least {required} players are needed ({present} present)")]
    NotEnoughPlayers { required: usize, present: usize },

    #[error("not allowed during {actual} (needs {expected})")]
    WrongStage { expected: Stage, actual: Stage },

    #[error("unknown character '{id}'")]
    UnknownCharacter { id: String },

    #[error("character '{id}' is already taken")]
    CharacterTaken { id: String },

    #[error("characters cannot be changed during a battle")]
    CharacterLocked,

    #[error("a vote is already running")]
    VoteInProgress,

    #[error("the vote has no options")]
    NoVoteOptions,

    #[error("'{option}' is not an option in this vote")]
    InvalidOption { option: String },

    #[error("no boss at this point of the story")]
    NoBoss,

    #[error("unknown enemy '{id}'")]
    UnknownEnemy { id: String },

    #[error("no player has chosen a character")]
    NoHeroes,

    #[error(transparent)]
    Battle(#[from] BattleError),
}
