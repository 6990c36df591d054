//! Database layer for takeout-dl
//!
//! The whole reconciliation state is one [`Batch`] record, so persistence is
//! a single whole-record get/set. Every reconciliation step does exactly one
//! load and at most one save, which keeps a step atomic even if the process
//! is torn down between steps.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`state`] - The current batch record
//! - [`history`] - Archive of finished batches
//!
//! [`MemoryStore`] implements the same [`StateStore`] contract in memory.

use crate::catalog::Batch;
use crate::error::DatabaseError;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod history;
mod memory;
mod migrations;
mod state;

pub use memory::MemoryStore;

/// Persistent storage for the batch record
///
/// Implementations must make `save_batch` atomic: a reader sees either the
/// previous record or the new one, never a mix.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the current batch, if any
    async fn load_batch(&self) -> Result<Option<Batch>>;

    /// Replace the current batch
    async fn save_batch(&self, batch: &Batch) -> Result<()>;

    /// Remove the current batch
    async fn clear_batch(&self) -> Result<()>;

    /// Keep a finished batch for later inspection
    async fn archive_batch(&self, batch: &Batch) -> Result<()>;

    /// Archived batches, most recent first
    async fn archived_batches(&self) -> Result<Vec<ArchivedBatch>>;

    /// Name of this store implementation
    fn name(&self) -> &'static str;
}

/// Finished batch kept in the archive
#[derive(Clone, Debug, PartialEq)]
pub struct ArchivedBatch {
    /// Archive row ID
    pub id: i64,
    /// The batch as it was when archived
    pub batch: Batch,
    /// When it was archived
    pub archived_at: DateTime<Utc>,
}

/// Archive record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct ArchiveRow {
    /// Unique database ID
    pub id: i64,
    /// Batch identity token, if one was ever observed
    pub identity: Option<String>,
    /// JSON-encoded batch
    pub record: String,
    /// Unix timestamp when archived
    pub archived_at: i64,
}

impl TryFrom<ArchiveRow> for ArchivedBatch {
    type Error = Error;

    fn try_from(row: ArchiveRow) -> Result<Self> {
        let batch = decode_batch(&row.record)?;

        Ok(ArchivedBatch {
            id: row.id,
            batch,
            archived_at: Utc
                .timestamp_opt(row.archived_at, 0)
                .single()
                .unwrap_or_else(Utc::now),
        })
    }
}

pub(crate) fn encode_batch(batch: &Batch) -> Result<String> {
    Ok(serde_json::to_string(batch)?)
}

pub(crate) fn decode_batch(record: &str) -> Result<Batch> {
    serde_json::from_str(record)
        .map_err(|e| Error::Database(DatabaseError::CorruptState(e.to_string())))
}

/// Database handle for takeout-dl
pub struct Database {
    pool: SqlitePool,
}

#[async_trait]
impl StateStore for Database {
    async fn load_batch(&self) -> Result<Option<Batch>> {
        self.get_batch().await
    }

    async fn save_batch(&self, batch: &Batch) -> Result<()> {
        self.set_batch(batch).await
    }

    async fn clear_batch(&self) -> Result<()> {
        self.delete_batch().await
    }

    async fn archive_batch(&self, batch: &Batch) -> Result<()> {
        self.insert_archive(batch).await.map(|_| ())
    }

    async fn archived_batches(&self) -> Result<Vec<ArchivedBatch>> {
        self.query_archive().await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
