//! Serializable room and battle views broadcast to clients

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Player, Stage, VoteSnapshot};
use crate::battle::{BattleSession, LogEntry, TurnSlot};
use crate::combatant::{ClientId, Combatant, Stats};
use crate::effects::{ControlState, EffectLedger};
use crate::narrative::StoryBuff;

#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub code: String,
    pub host: ClientId,
    pub stage: Stage,
    pub players: Vec<Player>,
    pub chapter_id: String,
    pub node_id: String,
    pub pending_buffs: Vec<StoryBuff>,
    pub vote: Option<VoteSnapshot>,
    pub battle: Option<BattleSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombatantView {
    pub owner: Option<ClientId>,
    pub definition_id: String,
    pub name: String,
    pub stats: Stats,
    pub max_health: i32,
    pub effects: EffectLedger,
    pub cooldowns: BTreeMap<String, u32>,
    pub control: ControlState,
    pub alive: bool,
}

impl From<&Combatant> for CombatantView {
    fn from(c: &Combatant) -> Self {
        Self {
            owner: c.owner.clone(),
            definition_id: c.definition_id().to_string(),
            name: c.name().to_string(),
            stats: c.stats,
            max_health: c.max_health(),
            effects: c.effects.clone(),
            cooldowns: c.cooldowns.clone(),
            control: c.control_state(),
            alive: c.is_alive(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BattleSnapshot {
    pub boss: CombatantView,
    pub heroes: Vec<CombatantView>,
    pub order: Vec<TurnSlot>,
    pub turn_index: usize,
    pub log: Vec<LogEntry>,
}

impl From<&BattleSession> for BattleSnapshot {
    fn from(battle: &BattleSession) -> Self {
        Self {
            boss: battle.boss().into(),
            heroes: battle.heroes().iter().map(CombatantView::from).collect(),
            order: battle.order().to_vec(),
            turn_index: battle.turn_index(),
            log: battle.log().to_vec(),
        }
    }
}
