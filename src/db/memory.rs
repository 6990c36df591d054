//! In-memory state store.

use super::{ArchivedBatch, StateStore};
use crate::Result;
use crate::catalog::Batch;
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    current: Option<Batch>,
    archive: Vec<ArchivedBatch>,
}

/// [`StateStore`] that lives only as long as the process
///
/// Useful for tests and for embedders that persist the batch themselves.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding an existing batch
    pub fn with_batch(batch: Batch) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current: Some(batch),
                archive: Vec::new(),
            }),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_batch(&self) -> Result<Option<Batch>> {
        Ok(self.inner.lock().await.current.clone())
    }

    async fn save_batch(&self, batch: &Batch) -> Result<()> {
        self.inner.lock().await.current = Some(batch.clone());
        Ok(())
    }

    async fn clear_batch(&self) -> Result<()> {
        self.inner.lock().await.current = None;
        Ok(())
    }

    async fn archive_batch(&self, batch: &Batch) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.archive.iter().any(|archived| archived.batch == *batch) {
            return Ok(());
        }
        let id = inner.archive.len() as i64 + 1;
        inner.archive.push(ArchivedBatch {
            id,
            batch: batch.clone(),
            archived_at: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn archived_batches(&self) -> Result<Vec<ArchivedBatch>> {
        Ok(self.inner.lock().await.archive.iter().rev().cloned().collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
