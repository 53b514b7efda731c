//! Combatant model
//!
//! One shape for heroes and bosses: a definition reference, a mutable stat
//! snapshot, timed effects, ability cooldowns, and liveness.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{BaseStats, CharacterDefinition};
use crate::effects::{ControlState, EffectKey, EffectLedger, StatKey, TickOutcome, TimedEffect};

/// Identity of a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Mutable stat snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub health: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub resource: i32,
}

impl From<&BaseStats> for Stats {
    fn from(base: &BaseStats) -> Self {
        Self {
            health: base.health,
            attack: base.attack,
            defense: base.defense,
            speed: base.speed,
            resource: base.resource,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Combatant {
    /// Owning client for heroes, `None` for the boss
    pub owner: Option<ClientId>,
    pub definition: Arc<CharacterDefinition>,
    pub stats: Stats,
    pub effects: EffectLedger,
    /// ability id -> turns remaining
    pub cooldowns: BTreeMap<String, u32>,
    pub alive: bool,
}

impl Combatant {
    /// Hero entering battle with a carried-over stat snapshot.
    pub fn hero(owner: ClientId, definition: Arc<CharacterDefinition>, stats: Stats) -> Self {
        Self {
            owner: Some(owner),
            alive: stats.health > 0,
            definition,
            stats,
            effects: EffectLedger::new(),
            cooldowns: BTreeMap::new(),
        }
    }

    /// Boss at full base stats.
    pub fn boss(definition: Arc<CharacterDefinition>) -> Self {
        Self {
            owner: None,
            stats: Stats::from(&definition.base),
            definition,
            effects: EffectLedger::new(),
            cooldowns: BTreeMap::new(),
            alive: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition_id(&self) -> &str {
        &self.definition.id
    }

    pub fn max_health(&self) -> i32 {
        self.definition.base.health
    }

    pub fn max_resource(&self) -> i32 {
        self.definition.base.resource
    }

    pub fn is_boss(&self) -> bool {
        self.owner.is_none()
    }

    /// Alive flag and positive health. The boss only ever uses health.
    pub fn is_alive(&self) -> bool {
        self.alive && self.stats.health > 0
    }

    /// Current value of `stat` including every active effect.
    /// Accuracy and evasion have a base of zero.
    pub fn effective(&self, stat: StatKey) -> i32 {
        let base = match stat {
            StatKey::Attack => self.stats.attack,
            StatKey::Defense => self.stats.defense,
            StatKey::Speed => self.stats.speed,
            StatKey::Accuracy | StatKey::Evasion => 0,
        };
        self.effects.effective(base, stat)
    }

    pub fn control_state(&self) -> ControlState {
        self.effects.control_state()
    }

    pub fn apply_effect(&mut self, effect: TimedEffect) {
        self.effects.apply(effect);
    }

    /// Decay effects at turn start. Marks the combatant down if periodic
    /// damage empties its health.
    pub fn tick_effects(&mut self) -> TickOutcome {
        let outcome = self.effects.tick(&mut self.stats.health);
        if self.stats.health <= 0 {
            self.alive = false;
        }
        outcome
    }

    /// Decay stun, root and fear once the combatant's own turn is over.
    pub fn tick_control(&mut self) -> Vec<EffectKey> {
        self.effects.tick_control()
    }

    /// Remove `amount` health (floored at zero). Returns health lost.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let before = self.stats.health;
        self.stats.health = (before - amount.max(0)).max(0);
        if self.stats.health == 0 {
            self.alive = false;
        }
        before - self.stats.health
    }

    /// Restore health up to the definition's base maximum. Returns health gained.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.stats.health;
        self.stats.health = (before + amount.max(0)).min(self.max_health().max(before));
        self.stats.health - before
    }

    pub fn cooldown(&self, ability_id: &str) -> Option<u32> {
        self.cooldowns.get(ability_id).copied().filter(|&t| t > 0)
    }

    pub fn start_cooldown(&mut self, ability_id: &str, turns: u32) {
        if turns > 0 {
            self.cooldowns.insert(ability_id.to_string(), turns);
        }
    }

    /// Count every cooldown down by one turn, dropping those that finish.
    pub fn tick_cooldowns(&mut self) {
        self.cooldowns.retain(|_, turns| {
            *turns = turns.saturating_sub(1);
            *turns > 0
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AbilityDefinition, AbilityKind};

    fn definition(health: i32) -> Arc<CharacterDefinition> {
        Arc::new(CharacterDefinition {
            id: "test".into(),
            name: "Tester".into(),
            region: String::new(),
            base: BaseStats {
                health,
                attack: 10,
                defense: 10,
                speed: 10,
                resource: 20,
            },
            abilities: vec![AbilityDefinition {
                id: "poke".into(),
                name: "Poke".into(),
                kind: AbilityKind::Physical,
                power: Some(1),
                cost: 0,
                cooldown: 0,
                duration: None,
                effect: None,
                poison: None,
                bleed: None,
                root: None,
                fear: None,
                knockback: None,
            }],
        })
    }

    #[test]
    fn heal_never_exceeds_base_maximum() {
        let def = definition(100);
        let mut hero = Combatant::hero(ClientId::from("c1"), def.clone(), Stats::from(&def.base));
        hero.take_damage(15);
        assert_eq!(hero.heal(40), 15);
        assert_eq!(hero.stats.health, 100);
    }

    #[test]
    fn damage_floors_at_zero_and_marks_down() {
        let def = definition(30);
        let mut hero = Combatant::hero(ClientId::from("c1"), def.clone(), Stats::from(&def.base));
        assert_eq!(hero.take_damage(50), 30);
        assert_eq!(hero.stats.health, 0);
        assert!(!hero.is_alive());
    }

    #[test]
    fn cooldowns_count_down_and_clear() {
        let mut boss = Combatant::boss(definition(50));
        boss.start_cooldown("poke", 2);
        boss.start_cooldown("noop", 0);
        assert_eq!(boss.cooldown("poke"), Some(2));
        assert_eq!(boss.cooldown("noop"), None);

        boss.tick_cooldowns();
        assert_eq!(boss.cooldown("poke"), Some(1));
        boss.tick_cooldowns();
        assert_eq!(boss.cooldown("poke"), None);
        assert!(boss.cooldowns.is_empty());
    }
}
