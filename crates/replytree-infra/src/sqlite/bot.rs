//! SQLite bot repository implementation.
//!
//! Implements `BotRepository` from `replytree-core` using sqlx with split
//! read/write pools. Every write that touches more than one row runs inside a
//! single writer transaction; an early return drops the transaction, which
//! rolls it back, so a half-written forest is never visible.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqliteConnection};

use replytree_core::repository::bot::BotRepository;
use replytree_core::tree::codec;
use replytree_types::bot::{Bot, BotId};
use replytree_types::error::RepositoryError;
use replytree_types::message::{Message, MessageId};
use replytree_types::tree::{BotTree, TreeNode};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `BotRepository`.
pub struct SqliteBotRepository {
    pool: DatabasePool,
}

impl SqliteBotRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Bot.
struct BotRow {
    id: String,
    name: String,
    description: Option<String>,
    created_at: String,
}

impl BotRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_bot(self) -> Result<Bot, RepositoryError> {
        let id = self
            .id
            .parse::<BotId>()
            .map_err(|e| RepositoryError::Query(format!("invalid bot id: {e}")))?;

        Ok(Bot {
            id,
            name: self.name,
            description: self.description,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_error)?;
    let bot_id: String = row.try_get("bot_id").map_err(query_error)?;
    let parent_id: Option<String> = row.try_get("parent_id").map_err(query_error)?;
    let content: String = row.try_get("content").map_err(query_error)?;
    let order: i64 = row.try_get("order").map_err(query_error)?;

    Ok(Message {
        id: id
            .parse::<MessageId>()
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?,
        bot_id: bot_id
            .parse::<BotId>()
            .map_err(|e| RepositoryError::Query(format!("invalid bot id: {e}")))?,
        parent_id: parent_id
            .as_deref()
            .map(str::parse::<MessageId>)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid parent id: {e}")))?,
        content,
        order,
    })
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so that `ORDER BY created_at` is chronological.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.message().contains("FOREIGN KEY") {
            return RepositoryError::Integrity(db_err.message().to_string());
        }
    }
    RepositoryError::Query(e.to_string())
}

const SELECT_MESSAGES: &str =
    "SELECT id, bot_id, parent_id, content, \"order\" FROM bot_messages";

async fn bot_exists(conn: &mut SqliteConnection, id: &BotId) -> Result<bool, RepositoryError> {
    let row = sqlx::query("SELECT 1 FROM bots WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(query_error)?;
    Ok(row.is_some())
}

/// Refuse to attach new messages under a parent owned by another bot.
async fn check_parent(
    conn: &mut SqliteConnection,
    bot_id: &BotId,
    parent: &MessageId,
) -> Result<(), RepositoryError> {
    let owner: Option<(String,)> = sqlx::query_as("SELECT bot_id FROM bot_messages WHERE id = ?")
        .bind(parent.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(query_error)?;

    match owner {
        None => Err(RepositoryError::Integrity(format!(
            "parent message {parent} does not exist"
        ))),
        Some((owner,)) if owner != bot_id.to_string() => Err(RepositoryError::Integrity(format!(
            "parent message {parent} belongs to bot {owner}, not {bot_id}"
        ))),
        Some(_) => Ok(()),
    }
}

/// First free sibling position under `parent` (the roots when `None`).
async fn next_order(
    conn: &mut SqliteConnection,
    bot_id: &BotId,
    parent: Option<&MessageId>,
) -> Result<i64, RepositoryError> {
    let (next,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(MAX(\"order\") + 1, 0) FROM bot_messages
         WHERE bot_id = ? AND parent_id IS ?",
    )
    .bind(bot_id.to_string())
    .bind(parent.map(|p| p.to_string()))
    .fetch_one(&mut *conn)
    .await
    .map_err(query_error)?;
    Ok(next)
}

/// Insert `forest` under `parent` for `bot_id` on an open transaction.
///
/// New top-level rows are appended after any existing siblings. Rows are
/// inserted parents-first, so the foreign keys hold at every step.
async fn persist_forest(
    conn: &mut SqliteConnection,
    bot_id: &BotId,
    forest: &[TreeNode],
    parent: Option<&MessageId>,
) -> Result<Vec<Message>, RepositoryError> {
    if let Some(parent) = parent {
        check_parent(conn, bot_id, parent).await?;
    }

    let first_order = next_order(conn, bot_id, parent).await?;
    let rows = codec::flatten_forest(bot_id, forest, parent, first_order);
    for message in &rows {
        debug_assert_eq!(&message.bot_id, bot_id);
        sqlx::query(
            "INSERT INTO bot_messages (id, content, \"order\", bot_id, parent_id)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(&message.content)
        .bind(message.order)
        .bind(message.bot_id.to_string())
        .bind(message.parent_id.as_ref().map(|p| p.to_string()))
        .execute(&mut *conn)
        .await
        .map_err(query_error)?;
    }

    tracing::debug!(bot_id = %bot_id, rows = rows.len(), "persisted message forest");
    Ok(rows)
}

impl BotRepository for SqliteBotRepository {
    async fn create(&self, bot: &Bot, forest: &[TreeNode]) -> Result<BotTree, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let result = sqlx::query(
            "INSERT INTO bots (id, name, description, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(bot.id.to_string())
        .bind(&bot.name)
        .bind(&bot.description)
        .bind(format_datetime(&bot.created_at))
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                return Err(RepositoryError::Conflict(format!(
                    "bot '{}' already exists",
                    bot.id
                )));
            }
            Err(e) => return Err(query_error(e)),
        }

        let rows = persist_forest(&mut tx, &bot.id, forest, None).await?;

        tx.commit().await.map_err(query_error)?;

        Ok(BotTree::new(bot.clone(), rows)?)
    }

    async fn persist(
        &self,
        bot_id: &BotId,
        forest: &[TreeNode],
        parent: Option<&MessageId>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        if !bot_exists(&mut tx, bot_id).await? {
            return Err(RepositoryError::NotFound);
        }
        let rows = persist_forest(&mut tx, bot_id, forest, parent).await?;

        tx.commit().await.map_err(query_error)?;
        Ok(rows)
    }

    async fn replace(&self, bot: &Bot, forest: &[TreeNode]) -> Result<BotTree, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        // created_at is deliberately not part of the update.
        let result = sqlx::query("UPDATE bots SET name = ?, description = ? WHERE id = ?")
            .bind(&bot.name)
            .bind(&bot.description)
            .bind(bot.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let removed = sqlx::query("DELETE FROM bot_messages WHERE bot_id = ?")
            .bind(bot.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?
            .rows_affected();

        let rows = persist_forest(&mut tx, &bot.id, forest, None).await?;

        // Return the stored record, not the caller's copy.
        let row = sqlx::query("SELECT * FROM bots WHERE id = ?")
            .bind(bot.id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(query_error)?;
        let stored = BotRow::from_row(&row).map_err(query_error)?.into_bot()?;

        tx.commit().await.map_err(query_error)?;

        tracing::debug!(bot_id = %bot.id, removed, inserted = rows.len(), "replaced message tree");
        Ok(BotTree::new(stored, rows)?)
    }

    async fn get(&self, id: &BotId) -> Result<Option<BotTree>, RepositoryError> {
        // One read transaction so the bot and its rows come from the same snapshot.
        let mut tx = self.pool.reader.begin().await.map_err(query_error)?;

        let row = sqlx::query("SELECT * FROM bots WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let bot = BotRow::from_row(&row).map_err(query_error)?.into_bot()?;

        let rows = sqlx::query(&format!("{SELECT_MESSAGES} WHERE bot_id = ? ORDER BY \"order\""))
            .bind(id.to_string())
            .fetch_all(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        let messages = rows
            .iter()
            .map(row_to_message)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(BotTree::new(bot, messages)?))
    }

    async fn list(&self) -> Result<Vec<BotTree>, RepositoryError> {
        let mut tx = self.pool.reader.begin().await.map_err(query_error)?;

        let bot_rows = sqlx::query("SELECT * FROM bots ORDER BY created_at DESC, id DESC")
            .fetch_all(&mut *tx)
            .await
            .map_err(query_error)?;

        let message_rows = sqlx::query(&format!("{SELECT_MESSAGES} ORDER BY bot_id, \"order\""))
            .fetch_all(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        let mut by_bot: HashMap<BotId, Vec<Message>> = HashMap::new();
        for row in &message_rows {
            let message = row_to_message(row)?;
            by_bot.entry(message.bot_id.clone()).or_default().push(message);
        }

        let mut trees = Vec::with_capacity(bot_rows.len());
        for row in &bot_rows {
            let bot = BotRow::from_row(row).map_err(query_error)?.into_bot()?;
            let messages = by_bot.remove(&bot.id).unwrap_or_default();
            trees.push(BotTree::new(bot, messages)?);
        }

        Ok(trees)
    }

    async fn delete(&self, id: &BotId) -> Result<(), RepositoryError> {
        // Messages go with the bot via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM bots WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
