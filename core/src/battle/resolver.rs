//! Ability resolution
//!
//! Pure state transitions on combatants: hit rolls, damage, heals, and
//! effect payloads. Validation and turn bookkeeping live on `BattleSession`.

use ancestral_types::RulesConfig;

use super::{LogEntry, LogKind};
use crate::catalog::{AbilityDefinition, AbilityKind};
use crate::combatant::Combatant;
use crate::dice::{Dice, VillainPack, d20};
use crate::effects::{EffectCategory, EffectKey, EffectKind, StatKey, TimedEffect};

// ─────────────────────────────────────────────────────────────────────────────
// Defaults for omitted ability fields
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_HEAL_POWER: i32 = 30;
pub const DEFAULT_HEAL_SINGLE_POWER: i32 = 40;
pub const DEFAULT_HERO_SUMMON_POWER: i32 = 18;
pub const DEFAULT_BOSS_SUMMON_POWER: i32 = 20;

// ─────────────────────────────────────────────────────────────────────────────
// Hit and damage rules
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRoll {
    pub roll: u32,
    pub hit: bool,
    pub critical: bool,
}

/// `roll + accuracy - evasion >= threshold` hits. A natural 20 always hits
/// and crits; a natural 1 always misses.
pub fn roll_to_hit(roll: u32, accuracy: i32, evasion: i32, threshold: i32) -> HitRoll {
    let (hit, critical) = match roll {
        20 => (true, true),
        1 => (false, false),
        _ => (roll as i32 + accuracy - evasion >= threshold, false),
    };
    HitRoll {
        roll,
        hit,
        critical,
    }
}

/// `power + floor(attack / 5) + bonus - floor(defense / 6)`, floored at
/// zero, doubled on a critical.
pub fn attack_damage(power: i32, attack: i32, defense: i32, bonus: i32, critical: bool) -> i32 {
    let raw = power + attack.div_euclid(5) + bonus;
    let damage = (raw - defense.div_euclid(6)).max(0);
    if critical { damage * 2 } else { damage }
}

// ─────────────────────────────────────────────────────────────────────────────
// Effect construction
// ─────────────────────────────────────────────────────────────────────────────

fn modifier_effect(category: EffectCategory, ability: &AbilityDefinition, rules: &RulesConfig) -> TimedEffect {
    TimedEffect::new(
        EffectKey::new(category, &ability.id),
        EffectKind::Modifier(ability.effect.unwrap_or_default()),
        ability.duration_or(rules.default_effect_turns),
    )
}

fn dot_effect(category: EffectCategory, ability: &AbilityDefinition, damage: i32, rules: &RulesConfig) -> TimedEffect {
    TimedEffect::new(
        EffectKey::new(category, &ability.id),
        EffectKind::DamageOverTime { damage },
        ability.duration_or(rules.default_effect_turns),
    )
}

/// Control and damage-over-time payloads carried by an attack.
fn on_hit_payload(ability: &AbilityDefinition, rules: &RulesConfig) -> Vec<TimedEffect> {
    let mut effects = Vec::new();
    if let Some(damage) = ability.poison {
        effects.push(dot_effect(EffectCategory::Poison, ability, damage, rules));
    }
    if let Some(damage) = ability.bleed {
        effects.push(dot_effect(EffectCategory::Bleed, ability, damage, rules));
    }
    if let Some(turns) = ability.root {
        effects.push(TimedEffect::new(
            EffectKey::new(EffectCategory::Root, &ability.id),
            EffectKind::Root,
            turns,
        ));
    }
    if let Some(turns) = ability.fear {
        effects.push(TimedEffect::new(
            EffectKey::new(EffectCategory::Fear, &ability.id),
            EffectKind::Fear {
                accuracy_penalty: rules.fear_accuracy_penalty,
            },
            turns,
        ));
    }
    if let Some(turns) = ability.knockback {
        effects.push(TimedEffect::new(
            EffectKey::new(EffectCategory::Knockback, &ability.id),
            EffectKind::Stun,
            turns,
        ));
    }
    effects
}

fn crit_tag(critical: bool) -> &'static str {
    if critical { " CRIT" } else { "" }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hero abilities
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve an already-validated hero ability. Resource and cooldown are
/// charged by the caller.
pub fn resolve_hero_ability(
    heroes: &mut [Combatant],
    caster: usize,
    boss: &mut Combatant,
    ability: &AbilityDefinition,
    rules: &RulesConfig,
    dice: &mut dyn Dice,
) -> Vec<LogEntry> {
    let Some(actor) = heroes.get(caster) else {
        return Vec::new();
    };
    let name = actor.name().to_string();

    match ability.kind {
        AbilityKind::Buff => {
            heroes[caster].apply_effect(modifier_effect(EffectCategory::Buff, ability, rules));
            vec![LogEntry::new(LogKind::Buff, format!("{name} uses {}", ability.name))]
        }
        AbilityKind::Debuff => {
            boss.apply_effect(modifier_effect(EffectCategory::Debuff, ability, rules));
            vec![LogEntry::new(
                LogKind::Debuff,
                format!("{name} casts {} on {}", ability.name, boss.name()),
            )]
        }
        AbilityKind::Heal => {
            let amount = ability.power.unwrap_or(DEFAULT_HEAL_POWER);
            for hero in heroes.iter_mut().filter(|h| h.is_alive()) {
                hero.heal(amount);
            }
            vec![LogEntry::new(LogKind::Heal, format!("{name} heals the team (+{amount})"))]
        }
        AbilityKind::HealSingle => {
            let amount = ability.power.unwrap_or(DEFAULT_HEAL_SINGLE_POWER);
            heroes[caster].heal(amount);
            vec![LogEntry::new(LogKind::Heal, format!("{name} heals self (+{amount})"))]
        }
        AbilityKind::Summon => {
            let damage = ability.power.unwrap_or(DEFAULT_HERO_SUMMON_POWER);
            boss.apply_effect(dot_effect(EffectCategory::Summon, ability, damage, rules));
            vec![LogEntry::new(
                LogKind::Summon,
                format!("{name} summons {} ({damage} per turn)", ability.name),
            )]
        }
        AbilityKind::Physical | AbilityKind::Magic | AbilityKind::Ultimate => {
            let actor = &heroes[caster];
            let roll = roll_to_hit(
                d20(dice),
                actor.effective(StatKey::Accuracy),
                boss.effective(StatKey::Evasion),
                rules.hit_threshold,
            );
            if !roll.hit {
                return vec![LogEntry::new(
                    LogKind::Miss,
                    format!("{name} misses {} (d20={})", ability.name, roll.roll),
                )];
            }

            let damage = attack_damage(
                ability.power.unwrap_or(0),
                actor.effective(StatKey::Attack),
                boss.effective(StatKey::Defense),
                0,
                roll.critical,
            );
            for effect in on_hit_payload(ability, rules) {
                boss.apply_effect(effect);
            }
            boss.take_damage(damage);

            vec![LogEntry::new(
                LogKind::Hit,
                format!(
                    "{name} uses {} (d20={}{}) -> {damage} damage",
                    ability.name,
                    roll.roll,
                    crit_tag(roll.critical)
                ),
            )]
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Boss abilities
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve a boss ability against `target` using a pre-rolled villain pack.
pub fn resolve_boss_ability(
    boss: &mut Combatant,
    target: &mut Combatant,
    ability: &AbilityDefinition,
    pack: &VillainPack,
    rules: &RulesConfig,
) -> Vec<LogEntry> {
    let boss_name = boss.name().to_string();
    let target_name = target.name().to_string();

    match ability.kind {
        AbilityKind::Debuff => {
            target.apply_effect(modifier_effect(EffectCategory::Debuff, ability, rules));
            vec![LogEntry::new(
                LogKind::Debuff,
                format!("{boss_name} casts {} on {target_name}", ability.name),
            )]
        }
        AbilityKind::Summon => {
            let damage = ability.power.unwrap_or(DEFAULT_BOSS_SUMMON_POWER);
            target.apply_effect(dot_effect(EffectCategory::Summon, ability, damage, rules));
            vec![LogEntry::new(
                LogKind::Summon,
                format!("{boss_name} summons {} against {target_name}", ability.name),
            )]
        }
        AbilityKind::Buff => {
            boss.apply_effect(modifier_effect(EffectCategory::Buff, ability, rules));
            vec![LogEntry::new(LogKind::Buff, format!("{boss_name} uses {}", ability.name))]
        }
        AbilityKind::Heal | AbilityKind::HealSingle => {
            let fallback = if ability.kind == AbilityKind::Heal {
                DEFAULT_HEAL_POWER
            } else {
                DEFAULT_HEAL_SINGLE_POWER
            };
            let gained = boss.heal(ability.power.unwrap_or(fallback));
            vec![LogEntry::new(LogKind::Heal, format!("{boss_name} recovers (+{gained})"))]
        }
        AbilityKind::Physical | AbilityKind::Magic | AbilityKind::Ultimate => {
            let roll = roll_to_hit(
                pack.attack_roll(),
                0,
                target.effective(StatKey::Evasion),
                rules.hit_threshold,
            );
            if !roll.hit {
                return vec![LogEntry::new(
                    LogKind::Miss,
                    format!("{boss_name} misses {} (d20={})", ability.name, roll.roll),
                )];
            }

            let damage = attack_damage(
                ability.power.unwrap_or(0),
                boss.effective(StatKey::Attack),
                target.effective(StatKey::Defense),
                pack.flat_bonus(),
                roll.critical,
            );
            if pack.effect_roll() >= rules.secondary_effect_threshold {
                for effect in on_hit_payload(ability, rules) {
                    target.apply_effect(effect);
                }
            }
            target.take_damage(damage);

            let mut log = vec![LogEntry::new(
                LogKind::Hit,
                format!(
                    "{boss_name} uses {} (2d20={}/{}{}, 2d4={}) -> {damage} damage to {target_name}",
                    ability.name,
                    pack.attack_roll(),
                    pack.effect_roll(),
                    crit_tag(roll.critical),
                    pack.flat_bonus()
                ),
            )];
            if !target.is_alive() {
                log.push(LogEntry::new(LogKind::Defeat, format!("{target_name} falls")));
            }
            log
        }
    }
}
