//! Host push events.

use crate::error::Result;
use crate::types::HostEvent;

use super::BulkDownloader;

impl BulkDownloader {
    /// Apply one host event as its own reconciliation step
    ///
    /// Events for downloads outside the batch are ignored.
    pub async fn handle_host_event(&self, event: HostEvent) -> Result<()> {
        tracing::trace!(download_id = event.id().0, ?event, "Host event");
        self.step(event.into()).await?;
        Ok(())
    }
}
