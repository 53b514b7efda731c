//! Narrative graph loading and navigation

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::{Chapter, StoryNode};
use crate::catalog::DataError;

const BUNDLED_STORY: &str = include_str!("../../data/story.toml");

/// Position used when the graph has no chapters
const FALLBACK_CHAPTER: &str = "prologue";
const FALLBACK_NODE: &str = "prologue_intro";

#[derive(Debug, Deserialize)]
struct StoryFile {
    #[serde(default, rename = "chapter")]
    chapters: Vec<Chapter>,
}

/// The full chapter/node graph. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct Story {
    chapters: Vec<Chapter>,
}

impl Story {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_chapters(chapters: Vec<Chapter>) -> Self {
        Self { chapters }
    }

    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, DataError> {
        let file: StoryFile = toml::from_str(content).map_err(|source| DataError::ParseToml {
            path: origin.to_path_buf(),
            source,
        })?;
        Ok(Self {
            chapters: file.chapters,
        })
    }

    pub fn load(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Load the configured story, or the bundled one when `path` is `None`.
    ///
    /// Never fails: a missing or malformed story degrades to an empty graph
    /// so rooms keep working.
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let result = match path {
            Some(path) => Self::load(path),
            None => Self::from_toml_str(BUNDLED_STORY, Path::new("<bundled story>")),
        };
        match result {
            Ok(story) => {
                info!(chapters = story.chapters.len(), "Loaded story");
                story
            }
            Err(e) => {
                warn!(error = %e, "Story unavailable, continuing without narrative");
                Self::empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    pub fn node(&self, chapter_id: &str, node_id: &str) -> Option<&StoryNode> {
        self.chapter(chapter_id).and_then(|c| c.nodes.get(node_id))
    }

    /// Chapter and node a new room starts at.
    pub fn opening(&self) -> (String, String) {
        match self.chapters.first() {
            Some(first) => (first.id.clone(), first.start.clone()),
            None => (FALLBACK_CHAPTER.to_string(), FALLBACK_NODE.to_string()),
        }
    }

    /// Start node of `chapter_id`, if the chapter exists.
    pub fn chapter_start(&self, chapter_id: &str) -> Option<&str> {
        self.chapter(chapter_id).map(|c| c.start.as_str())
    }
}
