//! Checkpoint repository implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use tally_core::error::{StorageError, StorageResult};
use tally_core::models::{Checkpoint, StreamKind, Watermark};
use tally_core::ports::CheckpointRepository;

use super::database::Database;
use super::helpers::is_unique_violation;

/// PostgreSQL implementation of CheckpointRepository.
pub struct PgCheckpointRepository {
    pool: PgPool,
}

impl PgCheckpointRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl CheckpointRepository for PgCheckpointRepository {
    async fn get(&self, stream: StreamKind) -> StorageResult<Option<Checkpoint>> {
        let row = sqlx::query_as::<_, CheckpointRow>(
            r#"
            SELECT stream, watermark, last_event_id, updated_at
            FROM stream_checkpoints
            WHERE stream = $1
            "#,
        )
        .bind(stream.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        row.map(CheckpointRow::into_model).transpose()
    }

    async fn create(&self, stream: StreamKind) -> StorageResult<Checkpoint> {
        let checkpoint = Checkpoint::initial(stream);

        sqlx::query(
            r#"
            INSERT INTO stream_checkpoints (stream, watermark, last_event_id, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(stream.as_str())
        .bind(checkpoint.watermark.timestamp)
        .bind(&checkpoint.watermark.last_event_id)
        .bind(checkpoint.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::AlreadyExists(stream.to_string())
            } else {
                StorageError::QueryError(e.to_string())
            }
        })?;

        Ok(checkpoint)
    }

    async fn update(&self, checkpoint: &Checkpoint) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE stream_checkpoints
            SET watermark = $1, last_event_id = $2, updated_at = $3
            WHERE stream = $4
            "#,
        )
        .bind(checkpoint.watermark.timestamp)
        .bind(&checkpoint.watermark.last_event_id)
        .bind(checkpoint.updated_at)
        .bind(checkpoint.stream.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(checkpoint.stream.to_string()));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CheckpointRow {
    stream: String,
    watermark: chrono::NaiveDateTime,
    last_event_id: String,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl CheckpointRow {
    fn into_model(self) -> StorageResult<Checkpoint> {
        let stream = StreamKind::parse(&self.stream).ok_or_else(|| {
            StorageError::SerializationError(format!("unknown stream key: {}", self.stream))
        })?;
        Ok(Checkpoint {
            stream,
            watermark: Watermark {
                timestamp: self.watermark,
                last_event_id: self.last_event_id,
            },
            updated_at: self.updated_at,
        })
    }
}
