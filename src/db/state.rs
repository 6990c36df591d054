//! The current batch record.

use crate::catalog::Batch;
use crate::error::DatabaseError;
use crate::{Error, Result};

use super::{Database, decode_batch, encode_batch};

/// Key of the batch record in `batch_state`
const BATCH_KEY: &str = "batch";

impl Database {
    /// Load the current batch record
    ///
    /// A record that no longer decodes is reported as
    /// [`DatabaseError::CorruptState`] rather than silently dropped.
    pub async fn get_batch(&self) -> Result<Option<Batch>> {
        let value: Option<String> = sqlx::query_scalar(
            r#"
            SELECT value FROM batch_state WHERE key = ?
            "#,
        )
        .bind(BATCH_KEY)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to load batch: {}",
                e
            )))
        })?;

        value.as_deref().map(decode_batch).transpose()
    }

    /// Replace the current batch record in a single statement
    pub async fn set_batch(&self, batch: &Batch) -> Result<()> {
        let value = encode_batch(batch)?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO batch_state (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(BATCH_KEY)
        .bind(&value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to save batch: {}",
                e
            )))
        })?;

        tracing::trace!(bytes = value.len(), "Batch record saved");
        Ok(())
    }

    /// Remove the current batch record
    pub async fn delete_batch(&self) -> Result<()> {
        sqlx::query("DELETE FROM batch_state WHERE key = ?")
            .bind(BATCH_KEY)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to clear batch: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Unix timestamp of the last batch write, if a record exists
    pub async fn batch_updated_at(&self) -> Result<Option<i64>> {
        sqlx::query_scalar("SELECT updated_at FROM batch_state WHERE key = ?")
            .bind(BATCH_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Sqlx)
    }
}
