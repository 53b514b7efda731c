//! Character and enemy catalog
//!
//! Static definitions keyed by id. Loaded once at startup from TOML (or the
//! bundled default) and shared read-only by every room.

mod definition;
mod error;
mod loader;

pub use definition::{
    AbilityDefinition, AbilityKind, BaseStats, CharacterDefinition, EnemyDefinition,
};
pub use error::DataError;
pub use loader::Catalog;
