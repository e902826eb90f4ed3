//! Mind-map renderers backed by templates.

pub mod html;

pub use html::HtmlMapRenderer;
