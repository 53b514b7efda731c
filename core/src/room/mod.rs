//! Multiplayer rooms
//!
//! A room owns its players, story position, at most one vote and at most
//! one battle. Operations take the acting client plus arguments and return
//! the events to broadcast, or a `RoomError` for the requester alone.
//!
//! Vote deadlines are scheduled by the caller from the `VoteTicket` that
//! `start_vote` hands back; the room only stores the abort handle.

mod error;
mod events;
mod player;
mod session;
mod snapshot;
mod vote;

#[cfg(test)]
mod session_tests;

pub use error::RoomError;
pub use events::{DiceKind, RewardGrant, RoomEvent, StoryNodeView};
pub use player::Player;
pub use session::{RoomSession, Stage};
pub use snapshot::{BattleSnapshot, CombatantView, RoomSnapshot};
pub use vote::{ActiveVote, VoteSnapshot, VoteTicket};
