//! Event pump and shutdown coordination.

use crate::error::{Error, Result};
use crate::host::DownloadEventSource;
use crate::types::Event;
use futures::StreamExt;

use super::BulkDownloader;

impl BulkDownloader {
    /// Consume host events until the source ends or the downloader shuts down
    ///
    /// Each event is applied as its own step. A failing step is logged and
    /// the pump moves on; the next status poll reconciles whatever the failed
    /// event would have changed.
    pub async fn run(&self, source: &dyn DownloadEventSource) -> Result<()> {
        let mut events = source.events();
        let mut handled = 0usize;
        tracing::info!("Event pump started");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    tracing::info!(handled, "Event pump stopped by shutdown");
                    break;
                }
                next = events.next() => {
                    let Some(event) = next else {
                        tracing::info!(handled, "Host event source ended");
                        break;
                    };
                    match self.handle_host_event(event).await {
                        Ok(()) => handled += 1,
                        Err(Error::ShuttingDown) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to apply host event, continuing");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Gracefully shut down the downloader
    ///
    /// Stops the event pump, waits for the step in progress to be persisted,
    /// then emits [`Event::Shutdown`]. Later calls to any step return
    /// [`Error::ShuttingDown`].
    pub async fn shutdown(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Ok(());
        }
        tracing::info!("Initiating graceful shutdown");
        self.shutdown.cancel();

        // Any step holding the lock finishes its save before we return
        drop(self.step_lock.lock().await);

        self.emit_event(Event::Shutdown);
        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether [`BulkDownloader::shutdown`] has been called
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
