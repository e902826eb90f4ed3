//! Bot repository trait definition.
//!
//! The repository is the tree store: it owns bots and their message rows and
//! guarantees that every multi-row write is atomic.

use replytree_types::bot::{Bot, BotId};
use replytree_types::error::RepositoryError;
use replytree_types::message::{Message, MessageId};
use replytree_types::tree::{BotTree, TreeNode};

/// Repository trait for bot and message-tree persistence.
///
/// Implementations live in replytree-infra (e.g., SqliteBotRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait BotRepository: Send + Sync {
    /// Insert a new bot and its whole forest in one transaction.
    fn create(
        &self,
        bot: &Bot,
        forest: &[TreeNode],
    ) -> impl std::future::Future<Output = Result<BotTree, RepositoryError>> + Send;

    /// Persist `forest` under `parent` (or as new roots when `None`) for an
    /// existing bot, atomically. Sibling order follows sequence position.
    ///
    /// Fails with `Integrity` if `parent` is unknown or owned by another bot.
    fn persist(
        &self,
        bot_id: &BotId,
        forest: &[TreeNode],
        parent: Option<&MessageId>,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Update the bot's name/description and rebuild its tree from scratch:
    /// every existing message is deleted and `forest` is persisted with fresh
    /// ids, all in one transaction.
    fn replace(
        &self,
        bot: &Bot,
        forest: &[TreeNode],
    ) -> impl std::future::Future<Output = Result<BotTree, RepositoryError>> + Send;

    /// Get a bot with its full tree.
    fn get(
        &self,
        id: &BotId,
    ) -> impl std::future::Future<Output = Result<Option<BotTree>, RepositoryError>> + Send;

    /// All bots, newest first, each with its full tree eagerly loaded.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<BotTree>, RepositoryError>> + Send;

    /// Delete a bot and, by cascade, all of its messages.
    fn delete(
        &self,
        id: &BotId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
