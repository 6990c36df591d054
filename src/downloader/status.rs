//! Status polls.

use crate::error::{Error, Result};
use crate::reconcile::{Input, Lookups, Reply, pull_targets};
use crate::types::{NativeDownloadId, StatusReport};
use futures::future::join_all;

use super::BulkDownloader;

impl BulkDownloader {
    /// Answer a status poll
    ///
    /// Each poll is one reconciliation step:
    /// 1. Looks up every bound, unfinished part in the host, concurrently
    /// 2. Reconciles parts against those records (complete, paused, lost)
    /// 3. Ticks the cooldown and, when allowed, picks the next part to start
    /// 4. Renders the progress text
    ///
    /// With no catalog staged the report is empty and nothing is persisted.
    pub async fn status(&self) -> Result<StatusReport> {
        self.ensure_running()?;
        let _guard = self.step_lock.lock().await;

        let batch = self.store.load_batch().await?;
        let targets = batch.as_ref().map(pull_targets).unwrap_or_default();
        let lookups = self.lookup_all(&targets).await;

        match self.commit(batch, Input::Poll(lookups)).await? {
            Reply::Status(report) => Ok(report),
            other => Err(Error::Other(format!(
                "unexpected reply to status request: {:?}",
                other
            ))),
        }
    }

    /// Point lookups for all targets; failed lookups are left out
    async fn lookup_all(&self, targets: &[NativeDownloadId]) -> Lookups {
        let results = join_all(targets.iter().map(|&id| async move {
            (id, self.native.search(id).await)
        }))
        .await;

        let mut lookups = Lookups::with_capacity(results.len());
        for (id, result) in results {
            match result {
                Ok(records) => {
                    lookups.insert(id, records);
                }
                Err(e) => {
                    tracing::warn!(
                        download_id = id.0,
                        host = self.native.name(),
                        error = %e,
                        "Native lookup failed, retrying on next poll"
                    );
                }
            }
        }

        tracing::debug!(
            targets = targets.len(),
            answered = lookups.len(),
            "Pull lookups complete"
        );
        lookups
    }
}
