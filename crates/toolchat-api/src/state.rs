//! Application state wiring the services together.
//!
//! `AppState` pins the generic core services to the SQLite store and holds
//! the tool catalog. The model provider is built on demand, since only the
//! chat command needs an API key.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use toolchat_core::chat::service::ChatService;
use toolchat_core::session::controller::{ConversationDeps, ConversationSettings};
use toolchat_core::tool::catalog::ToolCatalog;
use toolchat_infra::config::{load_app_config, resolve_data_dir};
use toolchat_infra::llm::build_provider;
use toolchat_infra::sqlite::pool::{DatabasePool, database_url};
use toolchat_infra::sqlite::session::SqliteSessionStore;
use toolchat_infra::tools::builtin_catalog;
use toolchat_types::config::AppConfig;

pub type ConcreteChatService = ChatService<SqliteSessionStore>;

/// Shared state for every CLI command.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub chat_service: Arc<ConcreteChatService>,
    pub catalog: Arc<ToolCatalog>,
}

impl AppState {
    /// Resolve the data directory, load config, open the database.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_app_config(&data_dir).await;

        let db_url = format!("{}?mode=rwc", database_url(&data_dir));
        let db_pool = DatabasePool::new(&db_url)
            .await
            .context("Failed to open the session database")?;

        let chat_service = ChatService::new(SqliteSessionStore::new(db_pool), config.title_max_chars);
        let catalog = builtin_catalog(&config.tools);

        tracing::debug!(
            data_dir = %data_dir.display(),
            owner_id = %config.owner_id,
            tools = catalog.len(),
            "App state ready"
        );

        Ok(Self {
            chat_service: Arc::new(chat_service),
            catalog: Arc::new(catalog),
            config,
        })
    }

    /// Everything a conversation needs, including a live model provider.
    pub fn conversation_deps(&self) -> anyhow::Result<ConversationDeps<SqliteSessionStore>> {
        let provider = build_provider(&self.config, Arc::clone(&self.catalog)).with_context(|| {
            format!(
                "Model provider unavailable. Set {} to your API key.",
                self.config.model.api_key_env
            )
        })?;

        let system_prompt = Some(self.config.system_prompt.clone()).filter(|p| !p.trim().is_empty());

        Ok(ConversationDeps {
            service: Arc::clone(&self.chat_service),
            provider,
            settings: ConversationSettings {
                owner_id: self.config.owner_id.clone(),
                system_prompt,
                tools: self.catalog.definitions(),
                stream_timeout: Duration::from_secs(self.config.stream_timeout_secs),
            },
        })
    }
}
