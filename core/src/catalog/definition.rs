//! Character and ability definitions
//!
//! Read-only templates loaded from the catalog TOML. Runtime state lives on
//! `Combatant`; these are never mutated after load.

use serde::{Deserialize, Serialize};

use crate::effects::StatModifiers;

/// Base stats for a character or enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub health: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    /// Enemies carry no resource pool
    #[serde(default)]
    pub resource: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbilityKind {
    Physical,
    Magic,
    Ultimate,
    Buff,
    Debuff,
    Heal,
    #[serde(alias = "heal_single")]
    HealSingle,
    Summon,
}

impl AbilityKind {
    /// Kinds resolved with a to-hit roll and damage formula
    pub fn is_attack(&self) -> bool {
        matches!(self, Self::Physical | Self::Magic | Self::Ultimate)
    }
}

/// A single ability on a character or enemy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub id: String,
    pub name: String,
    pub kind: AbilityKind,

    /// Damage, heal amount, or periodic damage depending on kind.
    /// Omitted values fall back to per-kind defaults at resolution time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<i32>,

    /// Resource spent on cast
    #[serde(default)]
    pub cost: i32,

    /// Turns before the ability can be used again (0 = none)
    #[serde(default)]
    pub cooldown: u32,

    /// Duration for buff/debuff/summon/poison/bleed effects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,

    /// Stat deltas for buff/debuff kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<StatModifiers>,

    // ─── Attached payloads (applied on hit) ──────────────────────────────────
    /// Poison damage per tick
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poison: Option<i32>,
    /// Bleed damage per tick
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bleed: Option<i32>,
    /// Root duration in turns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<u32>,
    /// Fear duration in turns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fear: Option<u32>,
    /// Knockback (stun) duration in turns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knockback: Option<u32>,
}

impl AbilityDefinition {
    pub fn is_ultimate(&self) -> bool {
        self.kind == AbilityKind::Ultimate
    }

    pub fn duration_or(&self, default: u32) -> u32 {
        self.duration.unwrap_or(default)
    }
}

/// A playable character or an enemy. Both share one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub base: BaseStats,
    #[serde(default)]
    pub abilities: Vec<AbilityDefinition>,
}

pub type EnemyDefinition = CharacterDefinition;

impl CharacterDefinition {
    pub fn ability(&self, id: &str) -> Option<&AbilityDefinition> {
        self.abilities.iter().find(|a| a.id == id)
    }
}
