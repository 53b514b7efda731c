//! Effect definition types
//!
//! Stat deltas and effect categories shared by catalog abilities,
//! story blessings, and the runtime effect ledger.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════
// Stats
// ═══════════════════════════════════════════════════════════════════════════

/// Stats that timed effects can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Attack,
    Defense,
    Speed,
    Accuracy,
    Evasion,
}

/// A bundle of stat deltas (any subset; missing fields are zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatModifiers {
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub accuracy: i32,
    #[serde(default)]
    pub evasion: i32,
}

impl StatModifiers {
    pub fn get(&self, stat: StatKey) -> i32 {
        match stat {
            StatKey::Attack => self.attack,
            StatKey::Defense => self.defense,
            StatKey::Speed => self.speed,
            StatKey::Accuracy => self.accuracy,
            StatKey::Evasion => self.evasion,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Categories
// ═══════════════════════════════════════════════════════════════════════════

/// Where an effect came from. Together with the source id this forms
/// the effect's identity, so a re-application refreshes instead of stacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    /// Self-applied stat boost
    Buff,
    /// Stat penalty applied to an opponent
    Debuff,
    /// Summoned damage-over-time
    Summon,
    /// Poison attached to a damaging ability
    Poison,
    /// Bleed attached to a boss attack
    Bleed,
    Root,
    Fear,
    Knockback,
    /// Story reward applied at battle start
    Blessing,
}

impl EffectCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buff => "buff",
            Self::Debuff => "debuff",
            Self::Summon => "summon",
            Self::Poison => "poison",
            Self::Bleed => "bleed",
            Self::Root => "root",
            Self::Fear => "fear",
            Self::Knockback => "knockback",
            Self::Blessing => "blessing",
        }
    }
}
