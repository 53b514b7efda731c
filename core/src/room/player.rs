//! Room member record

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::CharacterDefinition;
use crate::combatant::{ClientId, Combatant, Stats};
use crate::effects::EffectLedger;

/// A client in a room. Combat state is `None` until a character is chosen
/// and mirrors the battle combatant while a battle runs.
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: ClientId,
    pub name: String,
    pub character_id: Option<String>,
    pub ready: bool,
    pub stats: Option<Stats>,
    pub effects: EffectLedger,
    pub cooldowns: BTreeMap<String, u32>,
    pub alive: bool,
}

impl Player {
    pub fn new(id: ClientId, name: String) -> Self {
        Self {
            id,
            name,
            character_id: None,
            ready: false,
            stats: None,
            effects: EffectLedger::new(),
            cooldowns: BTreeMap::new(),
            alive: true,
        }
    }

    /// Take `definition` at its base stats, dropping all prior combat state.
    pub fn assign_character(&mut self, definition: &CharacterDefinition) {
        self.character_id = Some(definition.id.clone());
        self.stats = Some(Stats::from(&definition.base));
        self.effects.clear();
        self.cooldowns.clear();
        self.alive = true;
    }

    /// Copy live battle state from the player's combatant.
    pub fn mirror(&mut self, combatant: &Combatant) {
        self.stats = Some(combatant.stats);
        self.effects = combatant.effects.clone();
        self.cooldowns = combatant.cooldowns.clone();
        self.alive = combatant.is_alive();
    }

    /// Keep health and resource from the fight, drop everything timed,
    /// and bring a fallen hero back at 1 health.
    pub fn finish_battle(&mut self, combatant: &Combatant) {
        self.mirror(combatant);
        self.effects.clear();
        self.cooldowns.clear();
        if let Some(stats) = self.stats.as_mut() {
            stats.health = stats.health.max(1);
        }
        self.alive = true;
    }

    /// Story reward: restore health and resource up to the character's base.
    pub fn restore(&mut self, definition: &CharacterDefinition, health: i32, resource: i32) {
        if let Some(stats) = self.stats.as_mut() {
            let base = &definition.base;
            stats.health = (stats.health + health).min(base.health.max(stats.health));
            stats.resource = (stats.resource + resource).min(base.resource.max(stats.resource));
        }
    }
}
