//! CLI command definitions and dispatch for the `rtree` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a verb-noun
//! pattern (e.g., `rtree create bot`, `rtree list bots`).

pub mod bot;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Build chatbots from trees of canned replies.
#[derive(Parser)]
#[command(name = "rtree", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new resource.
    Create {
        #[command(subcommand)]
        resource: CreateResource,
    },

    /// List resources.
    #[command(alias = "ls")]
    List {
        #[command(subcommand)]
        resource: ListResource,
    },

    /// Show every bot with its reply tree.
    Maps,

    /// Show details and the reply tree of a bot.
    Show {
        /// Bot ID to display.
        id: String,
    },

    /// Rename a bot or rebuild its reply tree.
    Edit {
        /// Bot ID to edit.
        id: String,

        /// New name (keeps the current one if omitted).
        #[arg(long)]
        name: Option<String>,

        /// New description (keeps the current one if omitted; pass "" to clear).
        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        tree: TreeSource,
    },

    /// Delete a resource.
    #[command(alias = "rm")]
    Delete {
        #[command(subcommand)]
        resource: DeleteResource,
    },

    /// Export a bot's mind map as a standalone HTML page or as JSON.
    Export {
        /// Bot ID to export.
        id: String,

        /// Output file (default: `<slug>-mind-map.<format>` in the current directory).
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Export format.
        #[arg(long, short, value_enum, default_value_t = MapFormat::Html)]
        format: MapFormat,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides config).
        #[arg(long, short)]
        port: Option<u16>,

        /// Host to bind to (overrides config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Output format for `rtree export`.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapFormat {
    /// Standalone HTML mind map.
    #[default]
    Html,
    /// Nested JSON view of the bot.
    Json,
}

/// Where a reply tree comes from: inline JSON or a file.
#[derive(clap::Args, Debug, Default)]
pub struct TreeSource {
    /// Reply tree as JSON, e.g. '[{"content":"Hi","children":[]}]'.
    #[arg(long, conflicts_with = "tree_file")]
    pub tree: Option<String>,

    /// Read the reply tree JSON from a file.
    #[arg(long)]
    pub tree_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum CreateResource {
    /// Create a new bot with its reply tree.
    Bot {
        /// Bot name (prompted if omitted).
        #[arg(long)]
        name: Option<String>,

        /// Optional description.
        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        tree: TreeSource,
    },
}

#[derive(Subcommand)]
pub enum ListResource {
    /// List all bots, newest first.
    Bots,
}

#[derive(Subcommand)]
pub enum DeleteResource {
    /// Delete a bot and all of its messages permanently.
    Bot {
        /// Bot ID to delete.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}
