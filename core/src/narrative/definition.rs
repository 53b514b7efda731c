//! Narrative graph definitions
//!
//! Chapters hold named nodes. A node may reference a boss, link to a
//! successor node or chapter, offer vote options, and grant rewards when
//! entered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::effects::StatModifiers;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Chapter {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub narrative: String,
    /// Node entered when the chapter begins
    pub start: String,
    /// Boss whose defeat unlocks `next_chapter` on its node
    #[serde(default)]
    pub final_boss: Option<String>,
    #[serde(default)]
    pub nodes: BTreeMap<String, StoryNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoryNode {
    #[serde(default)]
    pub boss: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub next_chapter: Option<String>,
    #[serde(default)]
    pub options: Vec<StoryOption>,
    #[serde(default)]
    pub dialogue: Vec<DialogueLine>,
    #[serde(default)]
    pub reward: Option<Reward>,
}

impl StoryNode {
    pub fn option(&self, id: &str) -> Option<&StoryOption> {
        self.options.iter().find(|o| o.id == id)
    }

    pub fn option_ids(&self) -> Vec<String> {
        self.options.iter().map(|o| o.id.clone()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryOption {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub next_chapter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
}

/// Granted every time the node is entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Reward {
    /// Immediate heal for every player with a character
    #[serde(default)]
    pub heal: Option<i32>,
    /// Immediate resource restore for every player with a character
    #[serde(default)]
    pub resource: Option<i32>,
    /// Team blessing queued for the next battle
    #[serde(default)]
    pub buff: Option<StoryBuff>,
}

/// A deferred team buff. Applied to every hero at battle start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryBuff {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl StoryBuff {
    pub fn modifiers(&self) -> StatModifiers {
        StatModifiers {
            attack: self.attack,
            defense: self.defense,
            speed: self.speed,
            accuracy: self.accuracy,
            evasion: self.evasion,
        }
    }
}
