//! Narrated battle log

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Skip,
    Buff,
    Debuff,
    Heal,
    Summon,
    Hit,
    Miss,
    Tick,
    Defeat,
    Forfeit,
}

/// One human-readable log line with a machine-readable kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub kind: LogKind,
    pub text: String,
}

impl LogEntry {
    pub fn new(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}
