use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::tree::TreeInput;

/// Unique identifier for a bot, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BotId(pub Uuid);

impl BotId {
    /// Create a new BotId using UUID v7 (time-sortable, guaranteed ordering).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BotId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A chatbot owning an ordered forest of reply messages.
///
/// The message tree itself is not part of this record; see
/// [`crate::tree::BotTree`] for a bot together with its resolved messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    pub id: BotId,
    /// Display name, non-empty after trimming.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Set once at creation; edits never touch it.
    pub created_at: DateTime<Utc>,
}

impl Bot {
    /// Build a fresh bot record stamped with the current time.
    ///
    /// Callers are expected to have validated `name` already.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: BotId::new(),
            name: name.into(),
            description: normalize_description(description),
            created_at: Utc::now(),
        }
    }
}

/// Request to create or rebuild a bot. The tree replaces any existing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveBotRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub messages_tree: TreeInput,
}

/// Trim a description and collapse blank values to `None`.
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Generate a filename-friendly slug from a bot name.
///
/// Rules:
/// - Lowercase and trim
/// - Runs of characters outside `[a-z0-9-]` become a single hyphen
/// - Collapse consecutive hyphens, trim leading/trailing hyphens
/// - Fall back to `"chatbot"` when nothing survives
///
/// # Examples
///
/// ```
/// use replytree_types::bot::slugify;
///
/// assert_eq!(slugify("Support Bot"), "support-bot");
/// assert_eq!(slugify("  Olá, Mundo!  "), "ol-mundo");
/// assert_eq!(slugify("***"), "chatbot");
/// ```
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();

    let mut result = String::with_capacity(lowered.len());
    let mut prev_was_hyphen = true; // treat start as hyphen to trim leading
    for c in lowered.chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' {
            if !prev_was_hyphen {
                result.push('-');
            }
            prev_was_hyphen = true;
        } else {
            result.push(c);
            prev_was_hyphen = false;
        }
    }

    // Trim trailing hyphen
    if result.ends_with('-') {
        result.pop();
    }

    if result.is_empty() {
        "chatbot".to_string()
    } else {
        result
    }
}
