use super::{StoreError, WordRecord, WordStore};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;
use tracing::info;

/// `word` table access over a connection pool.
#[derive(Debug, Clone)]
pub struct PgWordStore {
    pool: PgPool,
}

impl PgWordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `dsn` and checks the connection before returning.
    pub async fn connect(dsn: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .test_before_acquire(true)
            .connect(dsn)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        info!("connected to word store");

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl WordStore for PgWordStore {
    async fn create_word(&self, word: &str) -> Result<WordRecord, StoreError> {
        let row = sqlx::query(
            r"
            INSERT INTO word (word)
            VALUES ($1)
            RETURNING id, word, partofspeech
            ",
        )
        .bind(word)
        .fetch_one(&self.pool)
        .await?;

        Ok(WordRecord {
            id: row.try_get("id")?,
            word: row.try_get("word")?,
            part_of_speech: row.try_get("partofspeech")?,
        })
    }

    async fn get_word(&self, id: i32) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT word
            FROM word
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row.try_get("word"))
            .transpose()
            .map_err(StoreError::from)
    }
}
