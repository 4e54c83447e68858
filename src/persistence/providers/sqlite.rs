use crate::persistence::RunStore;
use crate::runs::domain::RunRecord;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

#[derive(Debug)]
pub struct SqliteRunStore {
    pool: SqlitePool,
}

impl SqliteRunStore {
    /// Open an existing database. A missing file is a connection error.
    pub async fn new(
        connection_string: &str,
        max_connections: u32,
        run_migrations: bool,
    ) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(connection_string)?;
        Self::from_options(options, max_connections, run_migrations).await
    }

    pub async fn from_options(
        options: SqliteConnectOptions,
        max_connections: u32,
        run_migrations: bool,
    ) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        if run_migrations {
            sqlx::migrate!("./migrations/sqlite").run(&pool).await?;
        }

        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RunStore for SqliteRunStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<RunRecord>> {
        let record = sqlx::query_as::<_, RunRecord>("SELECT id, blob FROM runs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_all(&self) -> Result<Vec<RunRecord>> {
        let records = sqlx::query_as::<_, RunRecord>("SELECT id, blob FROM runs")
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}
