//! Boss decision policy

use crate::catalog::AbilityDefinition;
use crate::combatant::Combatant;
use crate::dice::{Dice, choose};

/// Pick the boss's next ability.
///
/// An off-cooldown ultimate wins outright. Otherwise a uniform pick among
/// off-cooldown abilities, and if everything is cooling down, a uniform pick
/// among all abilities so the boss never stalls.
pub fn choose_ability(boss: &Combatant, dice: &mut dyn Dice) -> Option<AbilityDefinition> {
    let abilities = &boss.definition.abilities;
    let usable: Vec<&AbilityDefinition> = abilities
        .iter()
        .filter(|a| boss.cooldown(&a.id).is_none())
        .collect();

    if let Some(ultimate) = usable.iter().find(|a| a.is_ultimate()) {
        return Some((*ultimate).clone());
    }
    if !usable.is_empty() {
        return choose(dice, &usable).map(|a| (*a).clone());
    }
    choose(dice, abilities).cloned()
}

/// Uniform pick among living heroes. `None` when every hero is down.
pub fn choose_target(heroes: &[Combatant], dice: &mut dyn Dice) -> Option<usize> {
    let alive: Vec<usize> = heroes
        .iter()
        .enumerate()
        .filter(|(_, h)| h.is_alive())
        .map(|(i, _)| i)
        .collect();
    choose(dice, &alive).copied()
}
