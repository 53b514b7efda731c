//! Timed effect system
//!
//! This module provides:
//! - **Definitions**: Stat deltas and effect categories referenced by abilities and story rewards
//! - **Active instances**: Tagged runtime effects with their own remaining duration
//! - **Ledger**: Per-combatant collection with apply/refresh, decay, and stat queries
//!
//! # Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Ability / story reward payload                   │
//! │        "Muralla de Sal: defense +15 for 2 turns"                │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                     EffectLedger::apply
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  TimedEffect (runtime state)                     │
//! │   key = (buff, muralla)  kind = Modifier  remaining = 2          │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!               EffectLedger::tick at turn start
//!                              │
//!                              ▼
//!                 removed on the tick reaching zero
//! ```

mod active;
mod definition;
mod ledger;


pub use active::{ControlState, EffectKey, EffectKind, TimedEffect};
pub use definition::{EffectCategory, StatKey, StatModifiers};
pub use ledger::{EffectLedger, TickOutcome};
