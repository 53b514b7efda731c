//! Per-combatant effect ledger
//!
//! Holds every timed effect on one combatant. Effects are keyed by
//! (category, source); applying an effect whose key is already present
//! replaces it and resets its duration instead of stacking.

use serde::Serialize;

use super::{ControlState, EffectKey, EffectKind, StatKey, TimedEffect};

/// Result of one decay tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Health actually removed by damage-over-time effects
    pub damage: i32,
    /// Keys of effects that reached zero and were dropped
    pub expired: Vec<EffectKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EffectLedger {
    effects: Vec<TimedEffect>,
}

impl EffectLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh an effect. Returns true if an existing effect
    /// with the same key was replaced.
    pub fn apply(&mut self, effect: TimedEffect) -> bool {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.key == effect.key) {
            *existing = effect;
            return true;
        }
        self.effects.push(effect);
        false
    }

    /// Turn-start decay for every non-control effect.
    ///
    /// Periodic damage is applied first (health floored at zero), then the
    /// counter is decremented and effects reaching zero are removed in the
    /// same tick. Control effects are left for [`EffectLedger::tick_control`].
    pub fn tick(&mut self, health: &mut i32) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        for effect in self.effects.iter_mut().filter(|e| !e.is_control()) {
            if let Some(damage) = effect.periodic_damage() {
                let before = *health;
                *health = (*health - damage.max(0)).max(0);
                outcome.damage += before - *health;
            }
            effect.remaining_turns = effect.remaining_turns.saturating_sub(1);
        }

        outcome.expired = self.drop_expired();
        outcome
    }

    /// Turn-end decay for stun, root and fear. Returns the expired keys.
    pub fn tick_control(&mut self) -> Vec<EffectKey> {
        for effect in self.effects.iter_mut().filter(|e| e.is_control()) {
            effect.remaining_turns = effect.remaining_turns.saturating_sub(1);
        }
        self.drop_expired()
    }

    fn drop_expired(&mut self) -> Vec<EffectKey> {
        let mut expired = Vec::new();
        self.effects.retain(|e| {
            if e.remaining_turns == 0 {
                expired.push(e.key.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Sum of every active effect's contribution to `stat`.
    pub fn contribution(&self, stat: StatKey) -> i32 {
        self.effects.iter().map(|e| e.contribution(stat)).sum()
    }

    /// `base` plus all contributions. Computed on demand so expiry is
    /// reflected immediately.
    pub fn effective(&self, base: i32, stat: StatKey) -> i32 {
        base + self.contribution(stat)
    }

    pub fn control_state(&self) -> ControlState {
        let mut state = ControlState::default();
        for effect in &self.effects {
            match effect.kind {
                EffectKind::Stun => state.stunned = true,
                EffectKind::Root => state.rooted = true,
                EffectKind::Fear { .. } => state.feared = true,
                EffectKind::Modifier(_) | EffectKind::DamageOverTime { .. } => {}
            }
        }
        state
    }

    pub fn get(&self, key: &EffectKey) -> Option<&TimedEffect> {
        self.effects.iter().find(|e| &e.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}
