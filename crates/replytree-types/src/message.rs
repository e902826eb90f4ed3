//! Reply message types.
//!
//! A `Message` is one node of a bot's reply tree, stored flat with a parent
//! reference and a sibling position. Trees are rebuilt from these flat rows by
//! [`crate::tree::MessageArena`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::bot::BotId;

/// Unique identifier for a message (UUID v7).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A persisted reply message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub bot_id: BotId,
    /// `None` for root messages.
    pub parent_id: Option<MessageId>,
    /// Trimmed, non-empty text.
    pub content: String,
    /// Position among siblings sharing the same parent, starting at 0.
    pub order: i64,
}
