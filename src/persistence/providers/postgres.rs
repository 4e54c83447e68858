use crate::persistence::RunStore;
use crate::runs::domain::RunRecord;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

#[derive(Debug)]
pub struct PostgresRunStore {
    pool: PgPool,
}

impl PostgresRunStore {
    pub async fn new(
        connection_string: &str,
        max_connections: u32,
        run_migrations: bool,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await?;

        if run_migrations {
            sqlx::migrate!("./migrations/postgres").run(&pool).await?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl RunStore for PostgresRunStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<RunRecord>> {
        let record = sqlx::query_as::<_, RunRecord>("SELECT id, blob FROM runs WHERE id = $1")
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
