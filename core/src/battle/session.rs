//! Battle session: turn order, turn pointer, win condition
//!
//! Owns the boss and every hero combatant for one fight and sequences
//! calls into the resolver and boss policy. Every public action either
//! returns an error with nothing mutated, or a `TurnOutcome` describing
//! what happened.

use std::iter;
use std::sync::Arc;

use ancestral_types::RulesConfig;
use serde::Serialize;
use tracing::debug;

use super::resolver::{resolve_boss_ability, resolve_hero_ability};
use super::{BattleError, LogEntry, LogKind, boss};
use crate::catalog::EnemyDefinition;
use crate::combatant::{ClientId, Combatant};
use crate::dice::{Dice, VillainPack, d20};
use crate::effects::{EffectKey, EffectKind, StatKey, TimedEffect};
use crate::narrative::StoryBuff;

/// Thin reference into the session's combatants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "side", content = "index", rename_all = "snake_case")]
pub enum TurnSlot {
    /// Index into the hero list
    Hero(usize),
    Boss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Heroes,
    Boss,
}

/// Result of one resolved action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Entries appended to the battle log by this action
    pub log: Vec<LogEntry>,
    /// Set when the action decided the battle
    pub winner: Option<Side>,
    pub turn_index: usize,
}

#[derive(Debug, Clone)]
pub struct BattleSession {
    boss: Combatant,
    heroes: Vec<Combatant>,
    order: Vec<TurnSlot>,
    turn_index: usize,
    log: Vec<LogEntry>,
    rules: RulesConfig,
}

impl BattleSession {
    /// Start a battle against `boss`.
    ///
    /// Every queued story blessing is applied to every hero as its own
    /// effect before the speed-sorted turn order is built. The order is
    /// fixed for the rest of the battle.
    pub fn start(
        boss: Arc<EnemyDefinition>,
        mut heroes: Vec<Combatant>,
        blessings: &[StoryBuff],
        rules: RulesConfig,
        dice: &mut dyn Dice,
    ) -> Self {
        for hero in &mut heroes {
            for (i, buff) in blessings.iter().enumerate() {
                hero.apply_effect(TimedEffect::new(
                    EffectKey::blessing(i),
                    EffectKind::Modifier(buff.modifiers()),
                    buff.duration.unwrap_or(rules.default_effect_turns),
                ));
            }
        }

        let boss = Combatant::boss(boss);
        let order = build_turn_order(&heroes, &boss, rules.max_tie_rerolls, dice);
        debug!(?order, "Turn order built");

        let mut session = Self {
            boss,
            heroes,
            order,
            turn_index: 0,
            log: Vec::new(),
            rules,
        };
        if !session.slot_alive(session.order[0]) {
            session.advance_turn();
        }
        session
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn boss(&self) -> &Combatant {
        &self.boss
    }

    pub fn heroes(&self) -> &[Combatant] {
        &self.heroes
    }

    pub fn hero_of(&self, client: &ClientId) -> Option<&Combatant> {
        self.hero_index(client).map(|i| &self.heroes[i])
    }

    pub fn order(&self) -> &[TurnSlot] {
        &self.order
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn current_slot(&self) -> Option<TurnSlot> {
        self.order.get(self.turn_index).copied()
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn combatant(&self, slot: TurnSlot) -> Option<&Combatant> {
        match slot {
            TurnSlot::Hero(i) => self.heroes.get(i),
            TurnSlot::Boss => Some(&self.boss),
        }
    }

    /// Boss side wins when no hero is standing; heroes win when the boss
    /// has no health left.
    pub fn winner(&self) -> Option<Side> {
        if !self.heroes.iter().any(|h| h.is_alive()) {
            return Some(Side::Boss);
        }
        if self.boss.stats.health <= 0 {
            return Some(Side::Heroes);
        }
        None
    }

    fn hero_index(&self, client: &ClientId) -> Option<usize> {
        self.heroes
            .iter()
            .position(|h| h.owner.as_ref() == Some(client))
    }

    fn slot_alive(&self, slot: TurnSlot) -> bool {
        match slot {
            TurnSlot::Hero(i) => self.heroes.get(i).is_some_and(|h| h.is_alive()),
            TurnSlot::Boss => self.boss.stats.health > 0,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Turn advancement
    // ─────────────────────────────────────────────────────────────────────────

    /// Move to the next living slot, skipping at most `max_skip_attempts`
    /// dead ones.
    pub fn advance_turn(&mut self) {
        let len = self.order.len();
        self.turn_index = (self.turn_index + 1) % len;
        for _ in 0..self.rules.max_skip_attempts {
            if self.slot_alive(self.order[self.turn_index]) {
                break;
            }
            self.turn_index = (self.turn_index + 1) % len;
        }
    }

    /// Tick the entering hero's effects. Returns false if the tick killed it.
    fn tick_hero(&mut self, index: usize, log: &mut Vec<LogEntry>) -> bool {
        let hero = &mut self.heroes[index];
        let outcome = hero.tick_effects();
        if outcome.damage > 0 {
            log.push(LogEntry::new(
                LogKind::Tick,
                format!("{} suffers {} from lingering effects", hero.name(), outcome.damage),
            ));
        }
        if !hero.is_alive() {
            log.push(LogEntry::new(LogKind::Defeat, format!("{} falls", hero.name())));
            return false;
        }
        true
    }

    /// Close the current actor's turn: its cooldowns and control effects
    /// tick, the pointer advances, and an entering hero has its effects
    /// ticked. A hero killed by its own tick is skipped after re-checking
    /// the win condition.
    fn end_turn(&mut self, log: &mut Vec<LogEntry>) -> Option<Side> {
        if let Some(slot) = self.current_slot() {
            let actor = match slot {
                TurnSlot::Hero(i) => &mut self.heroes[i],
                TurnSlot::Boss => &mut self.boss,
            };
            actor.tick_cooldowns();
            actor.tick_control();
        }

        for _ in 0..self.rules.max_skip_attempts {
            self.advance_turn();
            if let Some(winner) = self.winner() {
                return Some(winner);
            }
            let Some(TurnSlot::Hero(i)) = self.current_slot() else {
                return None;
            };
            if self.tick_hero(i, log) {
                return None;
            }
            if let Some(winner) = self.winner() {
                return Some(winner);
            }
        }
        None
    }

    fn finish(&mut self, log: Vec<LogEntry>, winner: Option<Side>) -> TurnOutcome {
        self.log.extend(log.iter().cloned());
        TurnOutcome {
            log,
            winner,
            turn_index: self.turn_index,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────

    /// Hero `client` casts `ability_id` against the boss.
    ///
    /// Checks, in order: hero turn, ownership, liveness, stun (loses the
    /// turn), ability exists, cooldown, resource.
    pub fn perform_hero_ability(
        &mut self,
        client: &ClientId,
        ability_id: &str,
        dice: &mut dyn Dice,
    ) -> Result<TurnOutcome, BattleError> {
        let Some(TurnSlot::Hero(index)) = self.current_slot() else {
            return Err(BattleError::NotHeroTurn);
        };
        let hero = &self.heroes[index];
        if hero.owner.as_ref() != Some(client) {
            return Err(BattleError::NotYourTurn);
        }
        if !hero.is_alive() {
            return Err(BattleError::Defeated);
        }

        let mut log = Vec::new();
        if hero.control_state().stunned {
            log.push(LogEntry::new(
                LogKind::Skip,
                format!("{} is stunned and loses the turn", hero.name()),
            ));
            let winner = self.end_turn(&mut log);
            return Ok(self.finish(log, winner));
        }

        let definition = hero.definition.clone();
        let ability = definition
            .ability(ability_id)
            .ok_or_else(|| BattleError::InvalidAbility {
                ability: ability_id.to_string(),
            })?;
        if let Some(turns) = hero.cooldown(&ability.id) {
            return Err(BattleError::OnCooldown {
                ability: ability.id.clone(),
                turns,
            });
        }
        if hero.stats.resource < ability.cost {
            return Err(BattleError::InsufficientResource {
                needed: ability.cost,
                available: hero.stats.resource,
            });
        }

        let hero = &mut self.heroes[index];
        hero.stats.resource -= ability.cost;
        hero.start_cooldown(&ability.id, ability.cooldown);

        log.extend(resolve_hero_ability(
            &mut self.heroes,
            index,
            &mut self.boss,
            ability,
            &self.rules,
            dice,
        ));

        let winner = match self.winner() {
            Some(winner) => Some(winner),
            None => self.end_turn(&mut log),
        };
        Ok(self.finish(log, winner))
    }

    /// Resolve the boss's turn: tick its effects, pick an ability and a
    /// living target, resolve.
    pub fn perform_boss_turn(&mut self, dice: &mut dyn Dice) -> Result<TurnOutcome, BattleError> {
        if self.current_slot() != Some(TurnSlot::Boss) {
            return Err(BattleError::NotBossTurn);
        }

        let mut log = Vec::new();
        let tick = self.boss.tick_effects();
        if tick.damage > 0 {
            log.push(LogEntry::new(
                LogKind::Tick,
                format!("{} suffers {} from lingering effects", self.boss.name(), tick.damage),
            ));
        }
        if self.boss.stats.health <= 0 {
            log.push(LogEntry::new(LogKind::Defeat, format!("{} falls", self.boss.name())));
            return Ok(self.finish(log, Some(Side::Heroes)));
        }

        if self.boss.control_state().stunned {
            log.push(LogEntry::new(
                LogKind::Skip,
                format!("{} is stunned and loses the turn", self.boss.name()),
            ));
            let winner = self.end_turn(&mut log);
            return Ok(self.finish(log, winner));
        }

        let Some(ability) = boss::choose_ability(&self.boss, dice) else {
            let winner = self.end_turn(&mut log);
            return Ok(self.finish(log, winner));
        };
        self.boss.start_cooldown(&ability.id, ability.cooldown);

        let pack = VillainPack::roll(dice);
        let Some(target) = boss::choose_target(&self.heroes, dice) else {
            return Ok(self.finish(log, Some(Side::Boss)));
        };
        debug!(ability = %ability.id, target, ?pack, "Boss acts");

        log.extend(resolve_boss_ability(
            &mut self.boss,
            &mut self.heroes[target],
            &ability,
            &pack,
            &self.rules,
        ));

        let winner = match self.winner() {
            Some(winner) => Some(winner),
            None => self.end_turn(&mut log),
        };
        Ok(self.finish(log, winner))
    }

    /// Remove a departing hero from play. Returns `None` if `client` has no
    /// hero in this battle.
    pub fn forfeit(&mut self, client: &ClientId) -> Option<TurnOutcome> {
        let index = self.hero_index(client)?;
        let was_current = self.current_slot() == Some(TurnSlot::Hero(index));

        let hero = &mut self.heroes[index];
        hero.alive = false;
        let mut log = vec![LogEntry::new(
            LogKind::Forfeit,
            format!("{} leaves the fight", hero.name()),
        )];

        let winner = match self.winner() {
            Some(winner) => Some(winner),
            None if was_current => self.end_turn(&mut log),
            None => None,
        };
        Some(self.finish(log, winner))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Turn order
// ─────────────────────────────────────────────────────────────────────────────

struct OrderEntry {
    slot: TurnSlot,
    speed: i32,
    tiebreak: u32,
    join: usize,
}

/// Sort heroes and boss by effective speed, descending.
///
/// Entries sharing a speed roll a d20 each; colliding rolls are re-rolled
/// up to `max_rerolls` times, after which join order decides.
fn build_turn_order(
    heroes: &[Combatant],
    boss: &Combatant,
    max_rerolls: usize,
    dice: &mut dyn Dice,
) -> Vec<TurnSlot> {
    let mut entries: Vec<OrderEntry> = heroes
        .iter()
        .enumerate()
        .map(|(i, hero)| (TurnSlot::Hero(i), hero))
        .chain(iter::once((TurnSlot::Boss, boss)))
        .enumerate()
        .map(|(join, (slot, c))| OrderEntry {
            slot,
            speed: c.effective(StatKey::Speed),
            tiebreak: 0,
            join,
        })
        .collect();

    for _ in 0..=max_rerolls {
        let colliding: Vec<usize> = (0..entries.len())
            .filter(|&i| {
                entries.iter().enumerate().any(|(j, other)| {
                    j != i
                        && other.speed == entries[i].speed
                        && other.tiebreak == entries[i].tiebreak
                })
            })
            .collect();
        if colliding.is_empty() {
            break;
        }
        for i in colliding {
            entries[i].tiebreak = d20(dice);
        }
    }

    entries.sort_by(|a, b| {
        b.speed
            .cmp(&a.speed)
            .then(b.tiebreak.cmp(&a.tiebreak))
            .then(a.join.cmp(&b.join))
    });
    entries.into_iter().map(|e| e.slot).collect()
}
