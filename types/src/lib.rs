//! Shared configuration types for the Ancestral game server
//!
//! This crate contains serializable configuration types that are shared between
//! the engine (ancestral-core) and the frontends that host it (ancestral-cli).
//!
//! Note: Persistence methods (load/save) are provided by ancestral-core via the
//! `ServerConfigExt` trait, so this crate only depends on serde.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Data Sources
// ─────────────────────────────────────────────────────────────────────────────

/// Where the read-only game data is loaded from.
/// `None` means the bundled default shipped with ancestral-core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSources {
    /// TOML file with character and enemy definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    /// TOML file with the chapter/node narrative graph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_path: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Combat Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Tunable numbers used by the battle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// `roll + accuracy - evasion` must reach this to hit
    #[serde(default = "default_hit_threshold")]
    pub hit_threshold: i32,
    /// Secondary d20 needed for boss control effects (bleed/fear/root/knockback)
    #[serde(default = "default_secondary_threshold")]
    pub secondary_effect_threshold: u32,
    /// Upper bound on slots skipped while looking for the next living actor
    #[serde(default = "default_max_skip_attempts")]
    pub max_skip_attempts: usize,
    /// Upper bound on d20 re-rolls when resolving speed ties
    #[serde(default = "default_max_tie_rerolls")]
    pub max_tie_rerolls: usize,
    /// Duration used when an ability or blessing does not declare one
    #[serde(default = "default_effect_turns")]
    pub default_effect_turns: u32,
    /// Accuracy lost while feared
    #[serde(default = "default_fear_penalty")]
    pub fear_accuracy_penalty: i32,
}

fn default_hit_threshold() -> i32 {
    10
}

fn default_secondary_threshold() -> u32 {
    12
}

fn default_max_skip_attempts() -> usize {
    20
}

fn default_max_tie_rerolls() -> usize {
    8
}

fn default_effect_turns() -> u32 {
    2
}

fn default_fear_penalty() -> i32 {
    5
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            hit_threshold: default_hit_threshold(),
            secondary_effect_threshold: default_secondary_threshold(),
            max_skip_attempts: default_max_skip_attempts(),
            max_tie_rerolls: default_max_tie_rerolls(),
            default_effect_turns: default_effect_turns(),
            fear_accuracy_penalty: default_fear_penalty(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Config
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Players allowed in one room
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    /// Players required before the host can start the story
    #[serde(default = "default_min_players")]
    pub min_players_to_start: usize,
    /// Length of generated room codes
    #[serde(default = "default_code_length")]
    pub room_code_length: usize,
    /// Vote duration used when the host does not pick one
    #[serde(default = "default_vote_secs")]
    pub default_vote_secs: u64,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub data: DataSources,
}

fn default_max_players() -> usize {
    6
}

fn default_min_players() -> usize {
    2
}

fn default_code_length() -> usize {
    6
}

fn default_vote_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_players: default_max_players(),
            min_players_to_start: default_min_players(),
            room_code_length: default_code_length(),
            default_vote_secs: default_vote_secs(),
            rules: RulesConfig::default(),
            data: DataSources::default(),
        }
    }
}

impl ServerConfig {
    /// Config with the given data files and defaults everywhere else.
    pub fn with_data(data: DataSources) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_data_keeps_rule_defaults() {
        let config = ServerConfig::with_data(DataSources {
            catalog_path: Some(PathBuf::from("catalog.toml")),
            story_path: None,
        });
        assert_eq!(config.rules.hit_threshold, 10);
        assert_eq!(config.max_players, 6);
        assert!(config.data.catalog_path.is_some());
    }
}
