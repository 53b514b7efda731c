//! Room events
//!
//! Every state change in a room is described by one or more events. The
//! transport decides how they reach clients; the room only says what
//! happened.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{BattleSnapshot, RoomSnapshot};
use crate::battle::{LogEntry, Side, TurnSlot};
use crate::combatant::ClientId;
use crate::narrative::{DialogueLine, StoryBuff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiceKind {
    /// One d20
    D20,
    /// Two d4 and two d20
    Villain,
}

/// Narrative position shown when a node is entered.
#[derive(Debug, Clone, Serialize)]
pub struct StoryNodeView {
    pub chapter_id: String,
    pub node_id: String,
    pub title: Option<String>,
    pub narrative: Option<String>,
    pub boss: Option<String>,
    pub dialogue: Vec<DialogueLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewardGrant {
    Heal { amount: i32 },
    Resource { amount: i32 },
    Buff { buff: StoryBuff },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RoomEvent {
    RoomUpdated(RoomSnapshot),
    StoryNode(StoryNodeView),
    StoryReward(RewardGrant),
    VoteStarted {
        vote_id: u64,
        node_id: String,
        options: Vec<String>,
        ends_at: DateTime<Utc>,
    },
    VoteUpdated {
        votes: BTreeMap<ClientId, String>,
    },
    VoteFinalized {
        vote_id: u64,
        chosen: Option<String>,
        by_majority: bool,
    },
    BattleStarted(BattleSnapshot),
    BattleLog(LogEntry),
    TurnChanged {
        turn_index: usize,
        slot: Option<TurnSlot>,
    },
    BattleEnded {
        winner: Side,
    },
    DiceRolled {
        by: ClientId,
        kind: DiceKind,
        values: Vec<u32>,
    },
    RoomClosed {
        code: String,
    },
}

impl RoomEvent {
    /// Short name used in logs and the CLI
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomUpdated(_) => "room_updated",
            Self::StoryNode(_) => "story_node",
            Self::StoryReward(_) => "story_reward",
            Self::VoteStarted { .. } => "vote_started",
            Self::VoteUpdated { .. } => "vote_updated",
            Self::VoteFinalized { .. } => "vote_finalized",
            Self::BattleStarted(_) => "battle_started",
            Self::BattleLog(_) => "battle_log",
            Self::TurnChanged { .. } => "turn_changed",
            Self::BattleEnded { .. } => "battle_ended",
            Self::DiceRolled { .. } => "dice_rolled",
            Self::RoomClosed { .. } => "room_closed",
        }
    }
}
