//! Bot management service.
//!
//! Orchestrates create, edit, list, delete, and export of bots with their
//! reply trees. Submissions are validated in full before the store is touched,
//! so a rejected request never mutates anything.

use tracing::{info, warn};

use replytree_types::bot::{normalize_description, Bot, BotId, SaveBotRequest};
use replytree_types::error::{BotError, TreeError};
use replytree_types::tree::{BotTree, EditForm, TreeNode};

use crate::export::{export_filename, ExportedMap, MapRenderer};
use crate::repository::bot::BotRepository;
use crate::tree::codec;

/// Shown when a submission has a blank name.
pub const NAME_REQUIRED: &str = "Enter a name for the chatbot.";

/// A submission that passed validation.
struct ValidSubmission {
    name: String,
    description: Option<String>,
    forest: Vec<TreeNode>,
}

/// Service orchestrating the bot lifecycle.
///
/// Generic over the repository trait to maintain clean architecture --
/// replytree-core never depends on replytree-infra.
pub struct BotService<B: BotRepository> {
    bot_repo: B,
}

impl<B: BotRepository> BotService<B> {
    pub fn new(bot_repo: B) -> Self {
        Self { bot_repo }
    }

    /// Check name and tree, collecting every problem before rejecting.
    fn validate(request: &SaveBotRequest) -> Result<ValidSubmission, BotError> {
        let mut errors = Vec::new();

        let name = request.name.trim().to_string();
        if name.is_empty() {
            errors.push(NAME_REQUIRED.to_string());
        }

        let forest = match codec::decode(&request.messages_tree) {
            Ok(forest) => Some(forest),
            Err(e) => {
                if let TreeError::Malformed(detail) = &e {
                    warn!(%detail, "unreadable message tree");
                }
                errors.push(e.to_string());
                None
            }
        };

        match forest {
            Some(forest) if errors.is_empty() => Ok(ValidSubmission {
                name,
                description: normalize_description(request.description.clone()),
                forest,
            }),
            _ => {
                warn!(problems = errors.len(), "rejected bot submission");
                Err(BotError::Validation(errors))
            }
        }
    }

    /// Create a bot and its reply tree in one atomic write.
    pub async fn create_bot(&self, request: SaveBotRequest) -> Result<BotTree, BotError> {
        let valid = Self::validate(&request)?;
        let bot = Bot::new(valid.name, valid.description);

        let tree = self.bot_repo.create(&bot, &valid.forest).await?;
        info!(bot_id = %tree.bot.id, messages = tree.messages.len(), "bot created");
        Ok(tree)
    }

    /// Rename/redescribe a bot and rebuild its tree from the submission.
    ///
    /// The previous tree is discarded entirely; no message id survives.
    pub async fn update_bot(
        &self,
        id: &BotId,
        request: SaveBotRequest,
    ) -> Result<BotTree, BotError> {
        let existing = self.get_bot(id).await?.bot;
        let valid = Self::validate(&request)?;

        let bot = Bot {
            name: valid.name,
            description: valid.description,
            ..existing
        };

        let tree = self.bot_repo.replace(&bot, &valid.forest).await?;
        info!(bot_id = %tree.bot.id, messages = tree.messages.len(), "bot tree replaced");
        Ok(tree)
    }

    /// Get a bot with its tree.
    pub async fn get_bot(&self, id: &BotId) -> Result<BotTree, BotError> {
        self.bot_repo.get(id).await?.ok_or(BotError::NotFound)
    }

    /// All bots, newest first.
    pub async fn list_bots(&self) -> Result<Vec<BotTree>, BotError> {
        Ok(self.bot_repo.list().await?)
    }

    /// Delete a bot and all of its messages.
    pub async fn delete_bot(&self, id: &BotId) -> Result<(), BotError> {
        self.bot_repo.delete(id).await?;
        info!(bot_id = %id, "bot deleted");
        Ok(())
    }

    /// Current bot fields plus its serialized tree, for pre-filling an edit form.
    pub async fn edit_form(&self, id: &BotId) -> Result<EditForm, BotError> {
        let tree = self.get_bot(id).await?;
        let initial_tree = codec::serialize_roots(&tree.messages);
        Ok(EditForm {
            bot: tree.bot,
            initial_tree,
        })
    }

    /// Render a bot's mind map with `renderer`.
    pub async fn export_map<R: MapRenderer>(
        &self,
        id: &BotId,
        renderer: &R,
        base_url: &str,
    ) -> Result<ExportedMap, BotError> {
        let tree = self.get_bot(id).await?;
        let body = renderer.render(&tree, base_url)?;
        Ok(ExportedMap {
            filename: export_filename(&tree.bot.name, renderer.extension()),
            content_type: renderer.content_type(),
            body,
        })
    }
}
