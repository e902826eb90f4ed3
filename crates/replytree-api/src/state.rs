//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! `BotService` is generic over the repository trait; AppState pins it to the
//! SQLite implementation.

use std::path::PathBuf;
use std::sync::Arc;

use replytree_core::service::bot::BotService;
use replytree_infra::config::{database_url, load_config, resolve_data_dir};
use replytree_infra::export::HtmlMapRenderer;
use replytree_infra::sqlite::bot::SqliteBotRepository;
use replytree_infra::sqlite::pool::DatabasePool;
use replytree_types::config::AppConfig;

/// Concrete type alias for the service generic pinned to the infra implementation.
pub type ConcreteBotService = BotService<SqliteBotRepository>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub bot_service: Arc<ConcreteBotService>,
    pub renderer: Arc<HtmlMapRenderer>,
    pub config: AppConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&config, &data_dir)).await?;

        Self::from_parts(db_pool, config, data_dir)
    }

    /// Wire services over an already opened pool.
    pub fn from_parts(
        db_pool: DatabasePool,
        config: AppConfig,
        data_dir: PathBuf,
    ) -> anyhow::Result<Self> {
        let bot_service = BotService::new(SqliteBotRepository::new(db_pool));
        let renderer = HtmlMapRenderer::new()?;

        Ok(Self {
            bot_service: Arc::new(bot_service),
            renderer: Arc::new(renderer),
            config,
            data_dir,
        })
    }

    /// Base URL written into exported maps.
    pub fn base_url(&self) -> String {
        self.config.base_url()
    }
}
