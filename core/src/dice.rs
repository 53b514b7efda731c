//! Randomness source
//!
//! Every random decision in the engine (to-hit rolls, tie breaks, boss target
//! and ability picks, room codes, vote fallbacks) goes through [`Dice::roll`].
//! Production rooms use [`RandDice`]; tests script exact rolls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Uniform die of configurable side count.
pub trait Dice: Send {
    /// Roll a die with `sides` faces, returning a value in `1..=sides`.
    /// A die with fewer than one side always returns 1.
    fn roll(&mut self, sides: u32) -> u32;
}

/// `rand`-backed dice. Seedable for reproducible sessions.
pub struct RandDice {
    rng: StdRng,
}

impl RandDice {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandDice {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Dice for RandDice {
    fn roll(&mut self, sides: u32) -> u32 {
        if sides <= 1 {
            return 1;
        }
        self.rng.random_range(1..=sides)
    }
}

pub fn d20(dice: &mut dyn Dice) -> u32 {
    dice.roll(20)
}

pub fn d4(dice: &mut dyn Dice) -> u32 {
    dice.roll(4)
}

/// Uniform index into a collection of `len` items. Returns 0 for `len <= 1`.
pub fn pick_index(dice: &mut dyn Dice, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    (dice.roll(len as u32) - 1) as usize
}

/// Uniform choice from a slice.
pub fn choose<'a, T>(dice: &mut dyn Dice, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(pick_index(dice, items.len()))
}

/// The villain roll: two d4 summed as flat bonus, one d20 to hit,
/// one d20 for secondary effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VillainPack {
    pub d4: [u32; 2],
    pub d20: [u32; 2],
}

impl VillainPack {
    pub fn roll(dice: &mut dyn Dice) -> Self {
        let d4 = [d4(dice), d4(dice)];
        let d20 = [d20(dice), d20(dice)];
        Self { d4, d20 }
    }

    pub fn attack_roll(&self) -> u32 {
        self.d20[0]
    }

    pub fn effect_roll(&self) -> u32 {
        self.d20[1]
    }

    pub fn flat_bonus(&self) -> i32 {
        (self.d4[0] + self.d4[1]) as i32
    }
}
