use crate::config::PersistenceConfig;
use crate::runs::domain::RunRecord;
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::Arc;

pub mod providers;

use providers::{postgres::PostgresRunStore, sqlite::SqliteRunStore};

/// Read access to the run log written by pipeline runs.
///
/// Implementations only read; rows are owned by whichever process recorded
/// the runs.
#[async_trait]
pub trait RunStore: Send + Sync + std::fmt::Debug {
    /// Fetch a single run record by identifier.
    async fn find_by_id(&self, id: &str) -> Result<Option<RunRecord>>;

    /// Fetch every run record, in the order the store returns them.
    async fn find_all(&self) -> Result<Vec<RunRecord>>;
}

/// Connect to the store selected by `persistence.provider`.
pub async fn connect_store(config: &PersistenceConfig) -> Result<Arc<dyn RunStore>> {
    let store: Arc<dyn RunStore> = match config.provider.as_str() {
        "sqlite" => Arc::new(
            SqliteRunStore::new(
                &config.database_url,
                config.max_connections,
                config.run_migrations,
            )
            .await?,
        ),
        "postgres" => Arc::new(
            PostgresRunStore::new(
                &config.database_url,
                config.max_connections,
                config.run_migrations,
            )
            .await?,
        ),
        other => bail!("Unknown persistence provider: {other}"),
    };
    Ok(store)
}
