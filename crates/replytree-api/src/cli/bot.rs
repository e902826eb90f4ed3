//! Bot lifecycle CLI commands: create, list, maps, show, edit, delete, export.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};

use replytree_core::export::JsonMapRenderer;
use replytree_core::tree::codec;
use replytree_types::bot::{BotId, SaveBotRequest};
use replytree_types::error::BotError;
use replytree_types::message::Message;
use replytree_types::tree::{BotTree, MessageArena, TreeInput};

use crate::cli::{MapFormat, TreeSource};
use crate::state::AppState;

/// Create a new bot from a JSON reply tree.
///
/// # Examples
///
/// ```bash
/// rtree create bot --name "Front desk" --tree '[{"content":"Hi!","children":[]}]'
/// rtree create bot --name "Front desk" --tree-file tree.json
/// ```
pub async fn create_bot(
    state: &AppState,
    name: Option<String>,
    description: Option<String>,
    source: TreeSource,
    json: bool,
) -> Result<()> {
    let name = match name {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("Bot name")
            .interact_text()?,
    };

    let messages_tree = read_tree(source).await?.unwrap_or_default();
    let request = SaveBotRequest {
        name,
        description,
        messages_tree,
    };

    let spinner = spinner("cyan", "Saving bot...")?;
    let result = state.bot_service.create_bot(request).await;
    spinner.finish_and_clear();
    let tree = saved(result)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&codec::bot_view(&tree))?);
        return Ok(());
    }

    println!();
    println!("  {} Bot created successfully!", style("✓").green().bold());
    println!();
    print_summary(&tree);
    println!();
    println!(
        "  Export the mind map: {}",
        style(format!("rtree export {}", tree.bot.id)).yellow()
    );
    println!();

    Ok(())
}

/// List all bots in a table, newest first.
pub async fn list_bots(state: &AppState, json: bool) -> Result<()> {
    let trees = state.bot_service.list_bots().await?;

    if json {
        let views: Vec<_> = trees.iter().map(codec::bot_view).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if trees.is_empty() {
        print_empty_hint();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Roots").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for tree in &trees {
        table.add_row(vec![
            Cell::new(&tree.bot.name).fg(Color::Cyan),
            Cell::new(tree.bot.id.to_string()).fg(Color::DarkGrey),
            Cell::new(tree.root_messages().len()),
            Cell::new(tree.messages.len()),
            Cell::new(format_relative_time(&tree.bot.created_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} bot{}",
        style(trees.len()).bold(),
        if trees.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Print every bot with its full reply tree.
pub async fn show_maps(state: &AppState, json: bool) -> Result<()> {
    let trees = state.bot_service.list_bots().await?;

    if json {
        let views: Vec<_> = trees.iter().map(codec::bot_view).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if trees.is_empty() {
        print_empty_hint();
        return Ok(());
    }

    println!();
    for tree in &trees {
        println!(
            "  {} {}",
            style(&tree.bot.name).cyan().bold(),
            style(format!("({})", tree.bot.id)).dim()
        );
        for line in outline(&tree.messages) {
            println!("    {line}");
        }
        println!();
    }

    Ok(())
}

/// Show a bot's details and reply tree.
pub async fn show_bot(state: &AppState, id: &str, json: bool) -> Result<()> {
    let tree = state.bot_service.get_bot(&parse_id(id)?).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&codec::bot_view(&tree))?);
        return Ok(());
    }

    println!();
    print_summary(&tree);
    println!(
        "  {}  {}",
        style("Created:").bold(),
        tree.bot.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();
    if tree.messages.is_empty() {
        println!("  {}", style("No messages.").dim());
    }
    for line in outline(&tree.messages) {
        println!("  {line}");
    }
    println!();

    Ok(())
}

/// Rename a bot and/or rebuild its reply tree.
///
/// Omitted fields keep their current values. Without a new tree the current
/// one is re-submitted, which still rebuilds it with fresh message ids.
pub async fn edit_bot(
    state: &AppState,
    id: &str,
    name: Option<String>,
    description: Option<String>,
    source: TreeSource,
    json: bool,
) -> Result<()> {
    let id = parse_id(id)?;
    let form = state.bot_service.edit_form(&id).await?;

    let messages_tree = match read_tree(source).await? {
        Some(tree) => tree,
        None => TreeInput::Value(serde_json::to_value(&form.initial_tree)?),
    };
    let request = SaveBotRequest {
        name: name.unwrap_or(form.bot.name),
        description: description.or(form.bot.description),
        messages_tree,
    };

    let spinner = spinner("cyan", "Saving bot...")?;
    let result = state.bot_service.update_bot(&id, request).await;
    spinner.finish_and_clear();
    let tree = saved(result)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&codec::bot_view(&tree))?);
        return Ok(());
    }

    println!();
    println!("  {} Bot updated.", style("✓").green().bold());
    println!();
    print_summary(&tree);
    println!();

    Ok(())
}

/// Delete a bot with confirmation.
pub async fn delete_bot(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    let tree = state.bot_service.get_bot(&id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete bot '{}' and its {} message(s)?",
                style(&tree.bot.name).red().bold(),
                tree.messages.len()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let spinner = spinner("red", &format!("Deleting {}...", tree.bot.name))?;
    state.bot_service.delete_bot(&id).await?;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": id.to_string()}));
    } else {
        println!("  {} Bot '{}' deleted.", style("✓").red().bold(), tree.bot.name);
    }

    Ok(())
}

/// Write a bot's HTML mind map to disk.
pub async fn export_map(
    state: &AppState,
    id: &str,
    output: Option<PathBuf>,
    format: MapFormat,
    json: bool,
) -> Result<()> {
    let id = parse_id(id)?;
    let base_url = state.base_url();
    let map = match format {
        MapFormat::Html => {
            state
                .bot_service
                .export_map(&id, state.renderer.as_ref(), &base_url)
                .await?
        }
        MapFormat::Json => {
            state
                .bot_service
                .export_map(&id, &JsonMapRenderer, &base_url)
                .await?
        }
    };

    let path = output.unwrap_or_else(|| PathBuf::from(&map.filename));
    tokio::fs::write(&path, &map.body)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        println!(
            "{}",
            serde_json::json!({"path": path.display().to_string(), "bytes": map.body.len()})
        );
    } else {
        println!(
            "  {} Mind map written to {}",
            style("✓").green().bold(),
            style(path.display()).cyan()
        );
    }

    Ok(())
}

// --- Helpers ---

/// Parse a bot id, reporting an unknown id the same way as a missing bot.
fn parse_id(raw: &str) -> Result<BotId> {
    raw.parse::<BotId>()
        .map_err(|_| anyhow::anyhow!("Bot not found: {raw}"))
}

/// Inline JSON wins; otherwise read the file. `None` when neither was given.
async fn read_tree(source: TreeSource) -> Result<Option<TreeInput>> {
    if let Some(raw) = source.tree {
        return Ok(Some(TreeInput::Raw(raw)));
    }
    match source.tree_file {
        Some(path) => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Some(TreeInput::Raw(raw)))
        }
        None => Ok(None),
    }
}

/// Print each validation message before failing, so the user sees them all.
fn saved(result: Result<BotTree, BotError>) -> Result<BotTree> {
    match result {
        Err(BotError::Validation(messages)) => {
            for message in &messages {
                eprintln!("  {} {message}", style("✗").red().bold());
            }
            anyhow::bail!("bot was not saved")
        }
        other => Ok(other?),
    }
}

fn spinner(color: &str, message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner().template(&format!("{{spinner:.{color}}} {{msg}}"))?,
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    Ok(spinner)
}

fn print_summary(tree: &BotTree) {
    println!("  {}  {}", style("Name:").bold(), style(&tree.bot.name).cyan());
    if let Some(description) = &tree.bot.description {
        println!("  {}  {}", style("Description:").bold(), description);
    }
    println!(
        "  {}  {} ({} root{})",
        style("Messages:").bold(),
        tree.messages.len(),
        tree.root_messages().len(),
        if tree.root_messages().len() == 1 { "" } else { "s" }
    );
    println!("  {}  {}", style("Depth:").bold(), tree.messages.depth());
    println!(
        "  {}  {}",
        style("ID:").bold(),
        style(tree.bot.id.to_string()).dim()
    );
}

fn print_empty_hint() {
    println!();
    println!(
        "  {} No bots found. Create one with: {}",
        style("i").blue().bold(),
        style("rtree create bot").yellow()
    );
    println!();
}

/// Text outline of a tree with box-drawing connectors.
fn outline(arena: &MessageArena) -> Vec<String> {
    let mut lines = Vec::new();
    let roots = arena.roots();
    for (i, root) in roots.iter().enumerate() {
        outline_node(arena, root, "", i + 1 == roots.len(), &mut lines);
    }
    lines
}

fn outline_node(
    arena: &MessageArena,
    message: &Message,
    prefix: &str,
    last: bool,
    lines: &mut Vec<String>,
) {
    let connector = if last { "└─ " } else { "├─ " };
    lines.push(format!("{prefix}{connector}{}", message.content));

    let child_prefix = format!("{prefix}{}", if last { "   " } else { "│  " });
    let children = arena.children(&message.id);
    for (i, child) in children.iter().enumerate() {
        outline_node(arena, child, &child_prefix, i + 1 == children.len(), lines);
    }
}

fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let diff = now - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use chrono::{Duration, Utc};
    use replytree_types::tree::TreeNode;

    fn sample_tree() -> BotTree {
        let bot = replytree_types::bot::Bot::new("Helper", None);
        let rows = codec::flatten_forest(
            &bot.id,
            &[
                TreeNode::with_children(
                    "Hello",
                    vec![
                        TreeNode::with_children("Pricing", vec![TreeNode::leaf("Plans")]),
                        TreeNode::leaf("Support"),
                    ],
                ),
                TreeNode::leaf("Bye"),
            ],
            None,
            0,
        );
        BotTree::new(bot, rows).unwrap()
    }

    #[test]
    fn outline_draws_connectors() {
        let lines = outline(&sample_tree().messages);
        assert_eq!(
            lines,
            vec![
                "├─ Hello",
                "│  ├─ Pricing",
                "│  │  └─ Plans",
                "│  └─ Support",
                "└─ Bye",
            ]
        );
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(format_relative_time(&now), "just now");
        assert_eq!(format_relative_time(&(now - Duration::minutes(5))), "5m ago");
        assert_eq!(format_relative_time(&(now - Duration::hours(3))), "3h ago");
        assert_eq!(format_relative_time(&(now - Duration::days(2))), "2d ago");
    }

    #[test]
    fn unparsable_id_reads_as_not_found() {
        let err = parse_id("nope").unwrap_err();
        assert!(err.to_string().contains("Bot not found"));
    }

    #[tokio::test]
    async fn read_tree_prefers_inline_json() {
        let source = TreeSource {
            tree: Some("[]".to_string()),
            tree_file: None,
        };
        assert_eq!(
            read_tree(source).await.unwrap(),
            Some(TreeInput::Raw("[]".to_string()))
        );
        assert_eq!(read_tree(TreeSource::default()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_tree_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        tokio::fs::write(&path, r#"[{"content":"Hi"}]"#).await.unwrap();

        let source = TreeSource {
            tree: None,
            tree_file: Some(path),
        };
        assert_eq!(
            read_tree(source).await.unwrap(),
            Some(TreeInput::Raw(r#"[{"content":"Hi"}]"#.to_string()))
        );
    }

    #[tokio::test]
    async fn edit_without_tree_keeps_current_tree() {
        let state = test_state().await;
        let created = state
            .bot_service
            .create_bot(SaveBotRequest {
                name: "Helper".to_string(),
                description: Some("Desk".to_string()),
                messages_tree: TreeInput::Raw(
                    r#"[{"content":"Hello","children":[{"content":"Hours"}]}]"#.to_string(),
                ),
            })
            .await
            .unwrap();
        let old_ids: Vec<_> = created.messages.iter().map(|m| m.id.clone()).collect();

        edit_bot(
            &state,
            &created.bot.id.to_string(),
            Some("Renamed".to_string()),
            None,
            TreeSource::default(),
            true,
        )
        .await
        .unwrap();

        let tree = state.bot_service.get_bot(&created.bot.id).await.unwrap();
        assert_eq!(tree.bot.name, "Renamed");
        assert_eq!(tree.bot.description.as_deref(), Some("Desk"));
        assert_eq!(outline(&tree.messages), vec!["└─ Hello", "   └─ Hours"]);
        assert!(tree.messages.iter().all(|m| !old_ids.contains(&m.id)));
    }

    #[tokio::test]
    async fn export_writes_html_file() {
        let state = test_state().await;
        let created = state
            .bot_service
            .create_bot(SaveBotRequest {
                name: "Support Bot".to_string(),
                description: None,
                messages_tree: TreeInput::Raw(r#"[{"content":"Hi"}]"#.to_string()),
            })
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.html");
        export_map(
            &state,
            &created.bot.id.to_string(),
            Some(path.clone()),
            MapFormat::Html,
            true,
        )
        .await
        .unwrap();

        let html = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(html.contains("Support Bot"));
    }

    #[tokio::test]
    async fn export_writes_json_view() {
        let state = test_state().await;
        let created = state
            .bot_service
            .create_bot(SaveBotRequest {
                name: "Support Bot".to_string(),
                description: None,
                messages_tree: TreeInput::Raw(
                    r#"[{"content":"Hi","children":[{"content":"Bye"}]}]"#.to_string(),
                ),
            })
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        export_map(
            &state,
            &created.bot.id.to_string(),
            Some(path.clone()),
            MapFormat::Json,
            true,
        )
        .await
        .unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let view: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(view["name"], "Support Bot");
        assert_eq!(view["messages"][0]["children"][0]["content"], "Bye");
    }

    #[tokio::test]
    async fn create_rejects_invalid_tree() {
        let state = test_state().await;
        let source = TreeSource {
            tree: Some(r#"[{"content":"  "}]"#.to_string()),
            tree_file: None,
        };

        let err = create_bot(&state, Some("Helper".to_string()), None, source, true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bot was not saved");
        assert!(state.bot_service.list_bots().await.unwrap().is_empty());
    }
}
