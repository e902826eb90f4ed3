use thiserror::Error;

/// Reasons a submitted reply tree is rejected.
///
/// The display strings are shown to users as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Add at least one message and sub-option before saving.")]
    Empty,

    #[error("Fill in all messages and sub-options before saving.")]
    Incomplete,

    /// Payload is not valid JSON. The parser detail is kept for logs only.
    #[error("Could not read the submitted messages. Please try again.")]
    Malformed(String),
}

/// Stored or submitted messages that do not form a valid tree for their bot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("message {message} does not belong to bot {bot}")]
    ForeignMessage { message: String, bot: String },

    #[error("message {message} references missing parent {parent}")]
    MissingParent { message: String, parent: String },

    #[error("duplicate message id {0}")]
    DuplicateId(String),

    #[error("{0} message(s) unreachable from any root")]
    Unreachable(usize),
}

/// Errors related to bot operations.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("bot not found")]
    NotFound,

    /// Every problem found in a submission, in the order they were detected.
    #[error("validation failed: {}", .0.join(" "))]
    Validation(Vec<String>),

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("export error: {0}")]
    ExportError(String),
}

/// Errors from repository operations (used by trait definitions in replytree-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("integrity violation: {0}")]
    Integrity(String),
}

impl From<IntegrityError> for RepositoryError {
    fn from(e: IntegrityError) -> Self {
        RepositoryError::Integrity(e.to_string())
    }
}

impl From<RepositoryError> for BotError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => BotError::NotFound,
            RepositoryError::Integrity(msg) => BotError::Integrity(msg),
            other => BotError::StorageError(other.to_string()),
        }
    }
}

/// Errors raised while rendering an export document.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("template error: {0}")]
    Template(String),
}

impl From<ExportError> for BotError {
    fn from(e: ExportError) -> Self {
        BotError::ExportError(e.to_string())
    }
}
