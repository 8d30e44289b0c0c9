//! Shared state for command handlers.

use std::sync::Arc;

use anyhow::Context;
use phyto_config::PhytoConfig;
use phyto_db::service::PhytoService;

use crate::cli::GlobalFlags;

pub struct AppContext {
    pub config: PhytoConfig,
    pub store: Arc<PhytoService>,
}

impl AppContext {
    /// Open the database named by `--database` or `database.path`.
    pub async fn init(mut config: PhytoConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        if let Some(path) = &flags.database {
            config.database.path.clone_from(path);
        }

        let store = PhytoService::new_local(&config.database.path)
            .await
            .with_context(|| format!("failed to open database at {}", config.database.path))?;

        if !config.vision.is_configured() {
            tracing::warn!(
                "vision.api_key is not set; requests the knowledge base and cache cannot answer will fail"
            );
        }

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }
}
