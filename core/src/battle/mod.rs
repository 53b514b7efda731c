//! Turn-order battle engine
//!
//! This module provides:
//! - **Session**: fixed speed-sorted turn order, turn pointer, win condition
//! - **Resolver**: hit/miss, damage, heals, and effect payloads
//! - **Boss policy**: ability and target selection for the AI side
//! - **Log**: typed narration entries emitted by every action
//!
//! # Turn flow
//!
//! ```text
//!   hero intent ──► validate ──► resolve ──► win? ──yes──► battle over
//!                                              │
//!                                              no
//!                                              ▼
//!                     tick actor cooldowns, advance pointer,
//!                     tick entering hero's effects
//! ```

mod boss;
mod error;
mod log;
mod resolver;
mod session;


pub use boss::{choose_ability, choose_target};
pub use error::BattleError;
pub use log::{LogEntry, LogKind};
pub use resolver::{HitRoll, attack_damage, roll_to_hit};
pub use session::{BattleSession, Side, TurnOutcome, TurnSlot};
