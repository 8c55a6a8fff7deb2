use async_trait::async_trait;
use sqlx::{migrate::MigrateDatabase, Row, SqlitePool};
use tracing::info;

use super::{JobRepository, StorageError};
use crate::jobs::types::Job;

/// SQLite-backed repository (enabled with the `database` feature)
pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    /// Connect, creating the database file and running migrations if asked
    pub async fn connect(database_url: &str, auto_migrate: bool) -> Result<Self, StorageError> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| StorageError::Database(e.to_string()))?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub async fn shutdown(&self) {
        info!("Shutting down database connections...");
        self.pool.close().await;
        info!("Database connections closed");
    }

    fn decode(body: &str) -> Result<Job, StorageError> {
        Ok(serde_json::from_str(body)?)
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn get(&self, id: &str) -> Result<Job, StorageError> {
        let row = sqlx::query("SELECT body FROM jobs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::decode(row.get::<String, _>("body").as_str()),
            None => Err(StorageError::NotFound { id: id.to_string() }),
        }
    }

    async fn create(&self, job: &Job) -> Result<(), StorageError> {
        let body = serde_json::to_string(job)?;
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (id, version, status, created_at, body)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&job.id)
        .bind(job.version as i64)
        .bind(job.status.as_str())
        .bind(job.created_at.to_rfc3339())
        .bind(body)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AlreadyExists { id: job.id.clone() });
        }
        Ok(())
    }

    async fn put(&self, job: &Job) -> Result<(), StorageError> {
        let body = serde_json::to_string(job)?;
        let result = sqlx::query(
            r#"
            UPDATE jobs SET version = ?1, status = ?2, body = ?3
            WHERE id = ?4 AND version = ?5
            "#,
        )
        .bind(job.version as i64)
        .bind(job.status.as_str())
        .bind(body)
        .bind(&job.id)
        .bind(job.version.saturating_sub(1) as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let stored = sqlx::query("SELECT version FROM jobs WHERE id = ?1")
            .bind(&job.id)
            .fetch_optional(&self.pool)
            .await?;
        match stored {
            Some(row) => Err(StorageError::VersionConflict {
                id: job.id.clone(),
                stored: row.get::<i64, _>("version") as u64,
                incoming: job.version,
            }),
            None => Err(StorageError::NotFound { id: job.id.clone() }),
        }
    }

    async fn list(&self) -> Result<Vec<Job>, StorageError> {
        let rows = sqlx::query("SELECT body FROM jobs ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| Self::decode(row.get::<String, _>("body").as_str()))
            .collect()
    }
}
