//! Reply-tree codec.
//!
//! Parses and validates client-submitted trees, flattens validated forests into
//! storable rows, and serializes stored rows back into the nested wire form.
//!
//! Validation is all-or-nothing: one bad node anywhere rejects the whole tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use replytree_types::bot::{Bot, BotId};
use replytree_types::error::TreeError;
use replytree_types::message::{Message, MessageId};
use replytree_types::tree::{
    forest_depth, forest_size, BotTree, MessageArena, SerializedNode, TreeInput, TreeNode,
};

/// Parse a JSON-encoded tree as submitted by a form field.
///
/// A missing (empty) field counts as an empty forest; anything else must be
/// valid JSON, so whitespace alone is malformed.
pub fn parse_tree(raw: &str) -> Result<Vec<TreeNode>, TreeError> {
    if raw.is_empty() {
        return Err(TreeError::Empty);
    }
    let value: Value =
        serde_json::from_str(raw).map_err(|e| TreeError::Malformed(e.to_string()))?;
    validate_tree(&value)
}

/// Validate an already-decoded JSON tree.
pub fn validate_tree(value: &Value) -> Result<Vec<TreeNode>, TreeError> {
    if is_blank(value) {
        return Err(TreeError::Empty);
    }
    let Value::Array(nodes) = value else {
        return Err(TreeError::Incomplete);
    };
    let forest = validate_nodes(nodes).ok_or(TreeError::Incomplete)?;

    debug!(
        nodes = forest_size(&forest),
        depth = forest_depth(&forest),
        "parsed message tree"
    );
    Ok(forest)
}

/// Decode either form of client input.
pub fn decode(input: &TreeInput) -> Result<Vec<TreeNode>, TreeError> {
    match input {
        TreeInput::Raw(raw) => parse_tree(raw),
        TreeInput::Value(value) => validate_tree(value),
    }
}

fn validate_nodes(nodes: &[Value]) -> Option<Vec<TreeNode>> {
    nodes.iter().map(validate_node).collect()
}

fn validate_node(value: &Value) -> Option<TreeNode> {
    let Value::Object(fields) = value else {
        return None;
    };

    let content = fields
        .get("content")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if content.is_empty() {
        return None;
    }

    let children = match fields.get("children") {
        None => Vec::new(),
        Some(v) if is_blank(v) => Vec::new(),
        Some(Value::Array(kids)) => validate_nodes(kids)?,
        Some(_) => return None,
    };

    Some(TreeNode {
        content: content.to_string(),
        children,
    })
}

/// Values a form would consider "nothing submitted".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Flatten a validated forest into message rows for `bot_id`.
///
/// Rows come out depth-first pre-order, so every parent precedes its children.
/// Sibling `order` is the position in the submitted sequence; ids are always
/// freshly generated. Top-level nodes are numbered from `first_order` so they
/// follow siblings already stored under `parent`; nested levels start at 0.
pub fn flatten_forest(
    bot_id: &BotId,
    forest: &[TreeNode],
    parent: Option<&MessageId>,
    first_order: i64,
) -> Vec<Message> {
    fn walk(
        bot_id: &BotId,
        nodes: &[TreeNode],
        parent: Option<&MessageId>,
        first_order: i64,
        out: &mut Vec<Message>,
    ) {
        for (idx, node) in nodes.iter().enumerate() {
            let message = Message {
                id: MessageId::new(),
                bot_id: bot_id.clone(),
                parent_id: parent.cloned(),
                content: node.content.trim().to_string(),
                order: first_order + idx as i64,
            };
            let id = message.id.clone();
            out.push(message);
            walk(bot_id, &node.children, Some(&id), 0, out);
        }
    }

    let mut out = Vec::with_capacity(forest_size(forest));
    walk(bot_id, forest, parent, first_order, &mut out);
    out
}

/// Serialize `messages` and their descendants into nested wire nodes.
pub fn serialize_messages(arena: &MessageArena, messages: &[&Message]) -> Vec<SerializedNode> {
    messages
        .iter()
        .map(|message| SerializedNode {
            id: message.id.clone(),
            content: message.content.clone(),
            children: serialize_messages(arena, &arena.children(&message.id)),
        })
        .collect()
}

/// Serialize the whole forest, starting from the sorted roots.
pub fn serialize_roots(arena: &MessageArena) -> Vec<SerializedNode> {
    serialize_messages(arena, &arena.roots())
}

/// Drop ids from serialized nodes, yielding a forest that can be resubmitted.
pub fn to_forest(nodes: &[SerializedNode]) -> Vec<TreeNode> {
    nodes
        .iter()
        .map(|node| TreeNode {
            content: node.content.clone(),
            children: to_forest(&node.children),
        })
        .collect()
}

/// A bot with its nested tree, as returned by listing and detail views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotView {
    #[serde(flatten)]
    pub bot: Bot,
    pub message_count: usize,
    pub messages: Vec<SerializedNode>,
}

pub fn bot_view(tree: &BotTree) -> BotView {
    BotView {
        bot: tree.bot.clone(),
        message_count: tree.messages.len(),
        messages: serialize_roots(&tree.messages),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(parse_tree(""), Err(TreeError::Empty));
        assert_eq!(parse_tree("[]"), Err(TreeError::Empty));
        assert_eq!(parse_tree("null"), Err(TreeError::Empty));
    }

    #[test]
    fn test_malformed_input_is_distinct() {
        let err = parse_tree("[{\"content\": ").unwrap_err();
        assert!(matches!(err, TreeError::Malformed(_)));
    }

    #[test]
    fn test_whitespace_only_input_is_malformed() {
        let err = parse_tree("   \n").unwrap_err();
        assert!(matches!(err, TreeError::Malformed(_)));
        assert_eq!(
            err.to_string(),
            "Could not read the submitted messages. Please try again."
        );
    }

    #[test]
    fn test_single_root_without_children() {
        let forest = parse_tree(r#"[{"content":"Hi","children":[]}]"#).unwrap();
        assert_eq!(forest, vec![TreeNode::leaf("Hi")]);
    }

    #[test]
    fn test_content_is_trimmed_and_ids_ignored() {
        let forest = validate_tree(&json!([
            {"id": 41, "content": "  Hello  ", "children": [{"id": 42, "content": "\tWorld\n"}]}
        ]))
        .unwrap();
        assert_eq!(
            forest,
            vec![TreeNode::with_children("Hello", vec![TreeNode::leaf("World")])]
        );
    }

    #[test]
    fn test_one_empty_child_rejects_whole_tree() {
        let raw = r#"[{"content":"A","children":[{"content":"A1","children":[]},{"content":"","children":[]}]}]"#;
        assert_eq!(parse_tree(raw), Err(TreeError::Incomplete));
    }

    #[test]
    fn test_blank_grandchild_rejects_whole_tree() {
        let value = json!([
            {"content": "A", "children": [
                {"content": "A1", "children": [{"content": "   "}]}
            ]},
            {"content": "B"}
        ]);
        assert_eq!(validate_tree(&value), Err(TreeError::Incomplete));
    }

    #[test]
    fn test_non_object_nodes_are_invalid() {
        assert_eq!(validate_tree(&json!(["Hi"])), Err(TreeError::Incomplete));
        assert_eq!(
            validate_tree(&json!([{"content": "A", "children": [1]}])),
            Err(TreeError::Incomplete)
        );
    }

    #[test]
    fn test_non_array_top_level_is_invalid() {
        assert_eq!(
            validate_tree(&json!({"content": "Hi"})),
            Err(TreeError::Incomplete)
        );
    }

    #[test]
    fn test_missing_or_null_content_is_invalid() {
        assert_eq!(validate_tree(&json!([{}])), Err(TreeError::Incomplete));
        assert_eq!(
            validate_tree(&json!([{"content": null}])),
            Err(TreeError::Incomplete)
        );
        assert_eq!(
            validate_tree(&json!([{"content": 7}])),
            Err(TreeError::Incomplete)
        );
    }

    #[test]
    fn test_blank_children_values_mean_childless() {
        let forest = validate_tree(&json!([
            {"content": "A", "children": null},
            {"content": "B"},
            {"content": "C", "children": []}
        ]))
        .unwrap();
        assert!(forest.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn test_non_array_children_are_invalid() {
        assert_eq!(
            validate_tree(&json!([{"content": "A", "children": "B"}])),
            Err(TreeError::Incomplete)
        );
    }

    #[test]
    fn test_decode_accepts_both_inputs() {
        let raw = TreeInput::from(r#"[{"content":"Hi"}]"#);
        let value = TreeInput::from(json!([{"content": "Hi"}]));
        assert_eq!(decode(&raw).unwrap(), decode(&value).unwrap());
    }

    fn sample_forest() -> Vec<TreeNode> {
        vec![
            TreeNode::with_children(
                "Welcome",
                vec![
                    TreeNode::leaf("Prices"),
                    TreeNode::with_children("Support", vec![TreeNode::leaf("Call us")]),
                ],
            ),
            TreeNode::leaf("Goodbye"),
        ]
    }

    #[test]
    fn test_flatten_assigns_sibling_order_and_parents() {
        let bot_id = BotId::new();
        let rows = flatten_forest(&bot_id, &sample_forest(), None, 0);

        let contents: Vec<&str> = rows.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["Welcome", "Prices", "Support", "Call us", "Goodbye"]
        );
        let orders: Vec<i64> = rows.iter().map(|m| m.order).collect();
        assert_eq!(orders, vec![0, 0, 1, 0, 1]);

        assert_eq!(rows[1].parent_id.as_ref(), Some(&rows[0].id));
        assert_eq!(rows[2].parent_id.as_ref(), Some(&rows[0].id));
        assert_eq!(rows[3].parent_id.as_ref(), Some(&rows[2].id));
        assert!(rows[4].parent_id.is_none());
        assert!(rows.iter().all(|m| m.bot_id == bot_id));
    }

    #[test]
    fn test_flatten_offsets_only_top_level() {
        let bot = BotId::new();
        let forest = vec![
            TreeNode::with_children("C", vec![TreeNode::leaf("C1"), TreeNode::leaf("C2")]),
            TreeNode::leaf("D"),
        ];

        let rows = flatten_forest(&bot, &forest, None, 2);
        let orders: Vec<(&str, i64)> = rows.iter().map(|m| (m.content.as_str(), m.order)).collect();
        assert_eq!(orders, vec![("C", 2), ("C1", 0), ("C2", 1), ("D", 3)]);
    }

    #[test]
    fn test_flatten_under_existing_parent() {
        let bot_id = BotId::new();
        let parent = MessageId::new();
        let rows = flatten_forest(&bot_id, &[TreeNode::leaf("x")], Some(&parent), 0);
        assert_eq!(rows[0].parent_id, Some(parent));
    }

    #[test]
    fn test_serialize_round_trip_preserves_structure() {
        let bot_id = BotId::new();
        let forest = sample_forest();
        let rows = flatten_forest(&bot_id, &forest, None, 0);
        let arena = MessageArena::new(&bot_id, rows).unwrap();

        let serialized = serialize_roots(&arena);
        assert_eq!(to_forest(&serialized), forest);
        assert_eq!(serialize_roots(&arena), serialized);
    }

    #[test]
    fn test_bot_view_counts_messages() {
        let bot = Bot::new("Helper", None);
        let rows = flatten_forest(&bot.id, &sample_forest(), None, 0);
        let tree = BotTree::new(bot, rows).unwrap();

        let view = bot_view(&tree);
        assert_eq!(view.message_count, 5);
        assert_eq!(view.messages.len(), 2);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "Helper");
        assert_eq!(json["messages"][0]["children"][1]["content"], "Support");
    }
}
