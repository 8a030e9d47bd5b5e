use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    pub id: String, // stable hash of title|start|source-index when the source has none
    pub title: String,
    pub description: String,
    pub faculty: Faculty,
    pub tags: Vec<String>,
    pub level: Option<Level>,
    pub start: Option<String>, // RFC 3339
    pub end: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub organizer: Option<String>,
    pub is_custom: bool,
    pub created_at: Option<String>,
    pub raw: Value, // original source record, never interpreted again
}

/// Closed faculty vocabulary; `All` is the "applies to everyone" sentinel.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Faculty {
    Sauder,
    Engineering,
    Science,
    #[default]
    All,
}

impl Faculty {
    /// Unknown or empty values degrade to `All`, never error.
    pub fn parse(input: &str) -> Faculty {
        match input.trim().to_lowercase().as_str() {
            "sauder" => Faculty::Sauder,
            "engineering" => Faculty::Engineering,
            "science" => Faculty::Science,
            _ => Faculty::All,
        }
    }
}

impl fmt::Display for Faculty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Faculty::Sauder => "Sauder",
            Faculty::Engineering => "Engineering",
            Faculty::Science => "Science",
            Faculty::All => "All",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    /// Case-insensitive substring match against the difficulty vocabulary.
    /// The canonical names map to themselves so re-normalizing an already
    /// canonical record is a no-op. Returns `None` when nothing matches —
    /// callers must not confuse that with an explicit `Beginner`.
    pub fn from_text(input: &str) -> Option<Level> {
        let lower = input.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        if lower.contains("advanced") || lower.contains("hard") {
            Some(Level::Advanced)
        } else if lower.contains("intermediate") || lower.contains("medium") {
            Some(Level::Intermediate)
        } else if lower.contains("beginner") || lower.contains("easy") {
            Some(Level::Beginner)
        } else {
            None
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub faculty: Faculty,
    pub interests: Vec<String>,
}
