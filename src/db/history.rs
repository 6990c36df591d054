//! Archive of finished batches.

use crate::catalog::Batch;
use crate::{Error, Result};

use super::{ArchiveRow, ArchivedBatch, Database, encode_batch};

impl Database {
    /// Insert a finished batch into the archive
    ///
    /// Called when a finished batch is superseded by a new export or reset.
    /// Archiving an identical record again returns the existing row, so a
    /// step retried after a failed save does not archive twice.
    pub async fn insert_archive(&self, batch: &Batch) -> Result<i64> {
        let record = encode_batch(batch)?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM batch_archive WHERE record = ? LIMIT 1")
                .bind(&record)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Sqlx)?;
        if let Some(id) = existing {
            tracing::debug!(id, batch = ?batch.identity, "Batch already archived");
            return Ok(id);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO batch_archive (identity, record, archived_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&batch.identity)
        .bind(&record)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        tracing::info!(batch = ?batch.identity, parts = batch.parts.len(), "Batch archived");
        Ok(result.last_insert_rowid())
    }

    /// Archived batches ordered by archive time (most recent first)
    pub async fn query_archive(&self) -> Result<Vec<ArchivedBatch>> {
        let rows = sqlx::query_as::<_, ArchiveRow>(
            r#"
            SELECT id, identity, record, archived_at
            FROM batch_archive
            ORDER BY archived_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        rows.into_iter().map(ArchivedBatch::try_from).collect()
    }

    /// Archived batch by identity token
    pub async fn find_archived(&self, identity: &str) -> Result<Option<ArchivedBatch>> {
        let row = sqlx::query_as::<_, ArchiveRow>(
            r#"
            SELECT id, identity, record, archived_at
            FROM batch_archive
            WHERE identity = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        row.map(ArchivedBatch::try_from).transpose()
    }
}
