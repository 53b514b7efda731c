//! Active effect instances (runtime state)
//!
//! A `TimedEffect` is one modifier, damage source, or control state on a
//! combatant. It lives for a number of turns and is removed on the tick
//! where its counter reaches zero.

use serde::Serialize;

use super::{EffectCategory, StatKey, StatModifiers};

/// What an effect does while it is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    /// Flat stat deltas (buffs, debuffs, blessings)
    Modifier(StatModifiers),
    /// Health lost on every tick
    DamageOverTime { damage: i32 },
    /// Loses the next action
    Stun,
    Root,
    /// Accuracy penalty while active
    Fear { accuracy_penalty: i32 },
}

/// Control flags derived from the active effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub stunned: bool,
    pub rooted: bool,
    pub feared: bool,
}

/// An active effect on a combatant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedEffect {
    pub key: EffectKey,
    pub kind: EffectKind,
    pub remaining_turns: u32,
}

impl TimedEffect {
    pub fn new(key: EffectKey, kind: EffectKind, turns: u32) -> Self {
        Self {
            key,
            kind,
            remaining_turns: turns,
        }
    }

    /// This effect's contribution to a stat
    pub fn contribution(&self, stat: StatKey) -> i32 {
        match (self.kind, stat) {
            (EffectKind::Modifier(mods), _) => mods.get(stat),
            (EffectKind::Fear { accuracy_penalty }, StatKey::Accuracy) => -accuracy_penalty,
            _ => 0,
        }
    }

    /// Stun, root and fear. These count turns served rather than ticks
    /// survived, so they decay at the end of the owner's turn.
    pub fn is_control(&self) -> bool {
        matches!(
            self.kind,
            EffectKind::Stun | EffectKind::Root | EffectKind::Fear { .. }
        )
    }

    pub fn periodic_damage(&self) -> Option<i32> {
        match self.kind {
            EffectKind::DamageOverTime { damage } => Some(damage),
            _ => None,
        }
    }
}

/// Key for identifying unique effect instances
///
/// An effect is unique per (category, source) pair on one combatant.
/// If the same effect is reapplied, it refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EffectKey {
    pub category: EffectCategory,
    /// Ability id, or `story:<n>` for blessings
    pub source: String,
}

impl EffectKey {
    pub fn new(category: EffectCategory, source: &str) -> Self {
        Self {
            category,
            source: source.to_string(),
        }
    }

    pub fn blessing(index: usize) -> Self {
        Self {
            category: EffectCategory::Blessing,
            source: format!("story:{index}"),
        }
    }
}

impl std::fmt::Display for EffectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.category.label(), self.source)
    }
}
