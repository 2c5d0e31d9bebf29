use std::sync::Arc;

use crate::config::{AppConfig, SessionConfig};
use crate::storage::{MemStorage, PgStorage, Storage};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Configuration from the environment, Postgres store, migrations.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = PgStorage::connect(&config.database_url).await?;
        if let Err(e) = store.migrate().await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }
        Ok(Self {
            store: Arc::new(store),
            config,
        })
    }

    pub fn from_parts(store: Arc<dyn Storage>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// In-memory state for tests and database-less runs.
    pub fn in_memory() -> Self {
        let config = Arc::new(AppConfig {
            database_url: String::new(),
            session: SessionConfig {
                secret: "test-secret".into(),
                ttl_days: 14,
            },
        });
        Self {
            store: Arc::new(MemStorage::new()),
            config,
        }
    }
}
