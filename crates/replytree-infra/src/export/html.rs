//! Standalone HTML mind map rendered with Tera.
//!
//! The tree is flattened into one branch per root message, each branch a list
//! of indented rows in depth-first order, so the template never recurses.

use std::error::Error as _;

use serde::Serialize;
use tera::{Context, Tera};

use replytree_core::export::MapRenderer;
use replytree_types::error::ExportError;
use replytree_types::message::Message;
use replytree_types::tree::{BotTree, MessageArena};

const TEMPLATE_NAME: &str = "map.html";
const TEMPLATE: &str = include_str!("../../templates/map.html");
const INDENT_PX: usize = 24;

#[derive(Debug, Serialize)]
struct MapRow<'a> {
    indent: usize,
    content: &'a str,
    leaf: bool,
}

#[derive(Debug, Serialize)]
struct MapBranch<'a> {
    root: &'a str,
    rows: Vec<MapRow<'a>>,
}

/// Renders a bot tree as a self-contained HTML page.
pub struct HtmlMapRenderer {
    tera: Tera,
}

impl HtmlMapRenderer {
    /// Compile the embedded template. The `.html` name turns autoescaping on.
    pub fn new() -> Result<Self, ExportError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)
            .map_err(template_error)?;
        Ok(Self { tera })
    }
}

/// Flatten tera's error chain; the top-level message alone rarely names the cause.
fn template_error(err: tera::Error) -> ExportError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    ExportError::Template(message)
}

fn collect_rows<'a>(
    arena: &'a MessageArena,
    parent: &Message,
    depth: usize,
    rows: &mut Vec<MapRow<'a>>,
) {
    for child in arena.children(&parent.id) {
        let grandchildren = arena.children(&child.id);
        rows.push(MapRow {
            indent: depth * INDENT_PX,
            content: &child.content,
            leaf: grandchildren.is_empty(),
        });
        collect_rows(arena, child, depth + 1, rows);
    }
}

fn branches(tree: &BotTree) -> Vec<MapBranch<'_>> {
    tree.messages
        .roots()
        .into_iter()
        .map(|root| {
            let mut rows = Vec::new();
            collect_rows(&tree.messages, root, 1, &mut rows);
            MapBranch {
                root: &root.content,
                rows,
            }
        })
        .collect()
}

impl MapRenderer for HtmlMapRenderer {
    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }

    fn extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, tree: &BotTree, base_url: &str) -> Result<Vec<u8>, ExportError> {
        let mut context = Context::new();
        context.insert("name", &tree.bot.name);
        context.insert("description", &tree.bot.description);
        context.insert("base_url", base_url);
        context.insert("message_count", &tree.messages.len());
        context.insert("branches", &branches(tree));

        let html = self
            .tera
            .render(TEMPLATE_NAME, &context)
            .map_err(template_error)?;

        tracing::debug!(bot_id = %tree.bot.id, bytes = html.len(), "rendered html mind map");
        Ok(html.into_bytes())
    }
}
