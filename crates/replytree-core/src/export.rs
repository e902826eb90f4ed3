//! Mind-map export port.
//!
//! Renderers turn a fully fetched [`BotTree`] into a document. They never
//! validate or persist anything.

use replytree_types::bot::slugify;
use replytree_types::error::ExportError;
use replytree_types::tree::BotTree;

use crate::tree::codec;

/// Turns a resolved bot tree into a downloadable document.
pub trait MapRenderer: Send + Sync {
    /// MIME type of the rendered body.
    fn content_type(&self) -> &'static str;

    /// File extension without the leading dot.
    fn extension(&self) -> &'static str;

    /// Render `tree`; `base_url` resolves relative links inside the document.
    fn render(&self, tree: &BotTree, base_url: &str) -> Result<Vec<u8>, ExportError>;
}

/// A rendered export ready to be written or served.
#[derive(Debug, Clone)]
pub struct ExportedMap {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// `"{slug}-mind-map.{extension}"`, e.g. `support-bot-mind-map.html`.
pub fn export_filename(name: &str, extension: &str) -> String {
    format!("{}-mind-map.{extension}", slugify(name))
}

/// Renders the nested JSON view of a bot.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonMapRenderer;

impl MapRenderer for JsonMapRenderer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, tree: &BotTree, _base_url: &str) -> Result<Vec<u8>, ExportError> {
        serde_json::to_vec_pretty(&codec::bot_view(tree))
            .map_err(|e| ExportError::Template(e.to_string()))
    }
}
