//! Reply-tree shapes.
//!
//! Three representations of the same tree live here:
//!
//! - [`TreeNode`]: a validated, id-less forest ready to be persisted.
//! - [`Message`] rows collected in a [`MessageArena`]: the stored form, flat
//!   with parent references, resolved back into sibling-ordered children.
//! - [`SerializedNode`]: the nested `{id, content, children}` wire form handed
//!   back to clients.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::bot::{Bot, BotId};
use crate::error::IntegrityError;
use crate::message::{Message, MessageId};

/// A validated tree node: trimmed, non-empty content plus ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub content: String,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(content: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            content: content.into(),
            children,
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + forest_size(&self.children)
    }

    /// Depth of this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + forest_depth(&self.children)
    }
}

/// Total node count of a forest.
pub fn forest_size(forest: &[TreeNode]) -> usize {
    forest.iter().map(TreeNode::size).sum()
}

/// Maximum depth of a forest; an empty forest has depth 0.
pub fn forest_depth(forest: &[TreeNode]) -> usize {
    forest.iter().map(TreeNode::depth).max().unwrap_or(0)
}

/// Nested wire form of a stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub id: MessageId,
    pub content: String,
    pub children: Vec<SerializedNode>,
}

/// Raw tree payload as submitted by a client.
///
/// Form posts carry the tree as a JSON-encoded string; JSON API clients may
/// send the nested array directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeInput {
    Raw(String),
    Value(serde_json::Value),
}

impl Default for TreeInput {
    fn default() -> Self {
        TreeInput::Raw(String::new())
    }
}

impl From<&str> for TreeInput {
    fn from(raw: &str) -> Self {
        TreeInput::Raw(raw.to_string())
    }
}

impl From<serde_json::Value> for TreeInput {
    fn from(value: serde_json::Value) -> Self {
        TreeInput::Value(value)
    }
}

/// Flat message rows of one bot, indexed for tree traversal.
///
/// Construction checks that every row belongs to the bot, every parent exists,
/// and every row is reachable from a root. Broken data is reported, never
/// silently dropped.
#[derive(Debug, Clone, Default)]
pub struct MessageArena {
    messages: Vec<Message>,
    roots: Vec<usize>,
    children: HashMap<MessageId, Vec<usize>>,
}

impl MessageArena {
    pub fn new(bot_id: &BotId, messages: Vec<Message>) -> Result<Self, IntegrityError> {
        let mut index = HashMap::with_capacity(messages.len());
        for (i, message) in messages.iter().enumerate() {
            if &message.bot_id != bot_id {
                return Err(IntegrityError::ForeignMessage {
                    message: message.id.to_string(),
                    bot: bot_id.to_string(),
                });
            }
            if index.insert(message.id.clone(), i).is_some() {
                return Err(IntegrityError::DuplicateId(message.id.to_string()));
            }
        }

        let mut roots = Vec::new();
        let mut children: HashMap<MessageId, Vec<usize>> = HashMap::new();
        for (i, message) in messages.iter().enumerate() {
            match &message.parent_id {
                None => roots.push(i),
                Some(parent) if index.contains_key(parent) => {
                    children.entry(parent.clone()).or_default().push(i);
                }
                Some(parent) => {
                    return Err(IntegrityError::MissingParent {
                        message: message.id.to_string(),
                        parent: parent.to_string(),
                    });
                }
            }
        }

        let by_position = |a: &usize, b: &usize| {
            let (ma, mb) = (&messages[*a], &messages[*b]);
            ma.order.cmp(&mb.order).then_with(|| ma.id.cmp(&mb.id))
        };
        roots.sort_by(by_position);
        for siblings in children.values_mut() {
            siblings.sort_by(by_position);
        }

        // Parent links may still form a cycle that never touches a root.
        let mut seen = HashSet::with_capacity(messages.len());
        let mut stack: Vec<usize> = roots.clone();
        while let Some(i) = stack.pop() {
            if !seen.insert(i) {
                continue;
            }
            if let Some(kids) = children.get(&messages[i].id) {
                stack.extend(kids.iter().copied());
            }
        }
        if seen.len() != messages.len() {
            return Err(IntegrityError::Unreachable(messages.len() - seen.len()));
        }

        Ok(Self {
            messages,
            roots,
            children,
        })
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Root messages sorted by `order`.
    pub fn roots(&self) -> Vec<&Message> {
        self.roots.iter().map(|&i| &self.messages[i]).collect()
    }

    /// Children of `id` sorted by `order`; empty for leaves and unknown ids.
    pub fn children(&self, id: &MessageId) -> Vec<&Message> {
        self.children
            .get(id)
            .map(|kids| kids.iter().map(|&i| &self.messages[i]).collect())
            .unwrap_or_default()
    }

    /// All rows in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn walk(arena: &MessageArena, message: &Message) -> usize {
            1 + arena
                .children(&message.id)
                .into_iter()
                .map(|child| walk(arena, child))
                .max()
                .unwrap_or(0)
        }
        self.roots()
            .into_iter()
            .map(|root| walk(self, root))
            .max()
            .unwrap_or(0)
    }
}

/// A bot together with its fully resolved message tree.
#[derive(Debug, Clone)]
pub struct BotTree {
    pub bot: Bot,
    pub messages: MessageArena,
}

impl BotTree {
    /// Resolve `messages` into a tree owned by `bot`.
    pub fn new(bot: Bot, messages: Vec<Message>) -> Result<Self, IntegrityError> {
        let messages = MessageArena::new(&bot.id, messages)?;
        Ok(Self { bot, messages })
    }

    /// Top level of the forest: messages without a parent, sorted by `order`.
    pub fn root_messages(&self) -> Vec<&Message> {
        self.messages.roots()
    }
}

/// Payload for re-populating an edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditForm {
    pub bot: Bot,
    pub initial_tree: Vec<SerializedNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(bot: &BotId, parent: Option<&MessageId>, content: &str, order: i64) -> Message {
        Message {
            id: MessageId::new(),
            bot_id: bot.clone(),
            parent_id: parent.cloned(),
            content: content.to_string(),
            order,
        }
    }

    #[test]
    fn test_forest_size_and_depth() {
        let forest = vec![
            TreeNode::with_children("A", vec![TreeNode::with_children(
                "A1",
                vec![TreeNode::leaf("A1a")],
            )]),
            TreeNode::leaf("B"),
        ];
        assert_eq!(forest_size(&forest), 4);
        assert_eq!(forest_depth(&forest), 3);
        assert_eq!(forest_depth(&[]), 0);
    }

    #[test]
    fn test_arena_sorts_siblings_by_order() {
        let bot = BotId::new();
        let root = message(&bot, None, "root", 0);
        let second = message(&bot, Some(&root.id), "second", 1);
        let first = message(&bot, Some(&root.id), "first", 0);
        let later_root = message(&bot, None, "later", 1);

        let arena = MessageArena::new(
            &bot,
            vec![later_root.clone(), second.clone(), root.clone(), first.clone()],
        )
        .unwrap();

        let roots: Vec<&str> = arena.roots().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(roots, vec!["root", "later"]);

        let kids: Vec<&str> = arena
            .children(&root.id)
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(kids, vec!["first", "second"]);
        assert!(arena.children(&first.id).is_empty());
        assert_eq!(arena.depth(), 2);
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_arena_rejects_foreign_message() {
        let bot = BotId::new();
        let other = BotId::new();
        let stray = message(&other, None, "stray", 0);

        let err = MessageArena::new(&bot, vec![stray]).unwrap_err();
        assert!(matches!(err, IntegrityError::ForeignMessage { .. }));
    }

    #[test]
    fn test_arena_rejects_missing_parent() {
        let bot = BotId::new();
        let ghost = MessageId::new();
        let orphan = message(&bot, Some(&ghost), "orphan", 0);

        let err = MessageArena::new(&bot, vec![orphan]).unwrap_err();
        assert!(matches!(err, IntegrityError::MissingParent { .. }));
    }

    #[test]
    fn test_arena_rejects_cycle() {
        let bot = BotId::new();
        let mut a = message(&bot, None, "a", 0);
        let b = message(&bot, Some(&a.id), "b", 0);
        a.parent_id = Some(b.id.clone());

        let err = MessageArena::new(&bot, vec![a, b]).unwrap_err();
        assert!(matches!(err, IntegrityError::Unreachable(2)));
    }

    #[test]
    fn test_arena_rejects_duplicate_id() {
        let bot = BotId::new();
        let a = message(&bot, None, "a", 0);
        let err = MessageArena::new(&bot, vec![a.clone(), a]).unwrap_err();
        assert!(matches!(err, IntegrityError::DuplicateId(_)));
    }

    #[test]
    fn test_tree_input_untagged() {
        let raw: TreeInput = serde_json::from_str(r#""[]""#).unwrap();
        assert_eq!(raw, TreeInput::Raw("[]".to_string()));

        let value: TreeInput = serde_json::from_str(r#"[{"content":"Hi"}]"#).unwrap();
        assert!(matches!(value, TreeInput::Value(serde_json::Value::Array(_))));
    }

    #[test]
    fn test_bot_tree_root_messages() {
        let bot = Bot::new("Helper", None);
        let root = message(&bot.id, None, "Hi", 0);
        let tree = BotTree::new(bot, vec![root.clone()]).unwrap();
        assert_eq!(tree.root_messages(), vec![&root]);
    }
}
