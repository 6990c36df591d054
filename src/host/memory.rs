//! In-memory emulation of a native download manager.

use super::{DownloadEventSource, NativeDownloads};
use crate::types::{
    DownloadCreated, DownloadDelta, HostEvent, NativeDownload, NativeDownloadId, NativeState,
};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Mutex, broadcast};
use tokio_stream::wrappers::BroadcastStream;

/// Native download manager kept entirely in memory
///
/// Every mutation that a real host would announce is broadcast to
/// subscribers of [`DownloadEventSource::events`]; byte progress is not,
/// matching hosts that only report it through lookups. Cloning shares the
/// underlying state.
#[derive(Clone)]
pub struct InMemoryHost {
    records: Arc<Mutex<Vec<NativeDownload>>>,
    unreachable: Arc<Mutex<HashSet<NativeDownloadId>>>,
    next_id: Arc<AtomicI64>,
    event_tx: broadcast::Sender<HostEvent>,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHost {
    /// Create an empty host
    pub fn new() -> Self {
        let (event_tx, _rx) = broadcast::channel(1000);
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            unreachable: Arc::new(Mutex::new(HashSet::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            event_tx,
        }
    }

    /// Start a new download of `total_bytes` from `final_url`
    pub async fn create(&self, final_url: &str, total_bytes: u64) -> NativeDownloadId {
        let id = NativeDownloadId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.records.lock().await.push(NativeDownload {
            id,
            state: NativeState::InProgress,
            bytes_received: 0,
            total_bytes,
            paused: false,
            error: None,
        });

        self.emit(HostEvent::Created(DownloadCreated {
            id,
            final_url: final_url.to_string(),
        }));
        id
    }

    /// Settle the download's local filename
    pub async fn rename(&self, id: NativeDownloadId, filename: &str) -> Result<()> {
        self.update(id, |_| {}).await?;
        self.emit(HostEvent::Changed(DownloadDelta {
            id,
            filename: Some(filename.to_string()),
            ..Default::default()
        }));
        Ok(())
    }

    /// Record received bytes, silently
    pub async fn progress(&self, id: NativeDownloadId, bytes_received: u64) -> Result<()> {
        self.update(id, |record| record.bytes_received = bytes_received)
            .await
    }

    /// Pause or unpause the download, as a user would
    pub async fn pause(&self, id: NativeDownloadId, paused: bool) -> Result<()> {
        self.update(id, |record| record.paused = paused).await?;
        self.emit(HostEvent::Changed(DownloadDelta {
            id,
            paused: Some(paused),
            can_resume: Some(paused),
            ..Default::default()
        }));
        Ok(())
    }

    /// Interrupt the download with an error
    pub async fn interrupt(&self, id: NativeDownloadId, error: &str) -> Result<()> {
        self.update(id, |record| {
            record.state = NativeState::Interrupted;
            record.error = Some(error.to_string());
        })
        .await?;
        self.emit(HostEvent::Changed(DownloadDelta {
            id,
            state: Some(NativeState::Interrupted),
            error: Some(error.to_string()),
            can_resume: Some(false),
            ..Default::default()
        }));
        Ok(())
    }

    /// Finish the download
    pub async fn complete(&self, id: NativeDownloadId) -> Result<()> {
        self.update(id, |record| {
            record.state = NativeState::Complete;
            record.bytes_received = record.total_bytes;
            record.paused = false;
        })
        .await?;
        self.emit(HostEvent::Changed(DownloadDelta {
            id,
            state: Some(NativeState::Complete),
            ..Default::default()
        }));
        Ok(())
    }

    /// Forget the download, as clearing the host's download list would
    pub async fn erase(&self, id: NativeDownloadId) {
        self.records.lock().await.retain(|record| record.id != id);
    }

    /// Insert a raw record without any event (e.g. to fake duplicates)
    pub async fn insert_record(&self, record: NativeDownload) {
        self.records.lock().await.push(record);
    }

    /// Make lookups for `id` fail until [`InMemoryHost::restore`] is called
    pub async fn make_unreachable(&self, id: NativeDownloadId) {
        self.unreachable.lock().await.insert(id);
    }

    /// Undo [`InMemoryHost::make_unreachable`]
    pub async fn restore(&self, id: NativeDownloadId) {
        self.unreachable.lock().await.remove(&id);
    }

    /// Snapshot of every record
    pub async fn records(&self) -> Vec<NativeDownload> {
        self.records.lock().await.clone()
    }

    async fn update(
        &self,
        id: NativeDownloadId,
        apply: impl FnOnce(&mut NativeDownload),
    ) -> Result<()> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| Error::Host(format!("no native download with id {}", id)))?;
        apply(record);
        Ok(())
    }

    fn emit(&self, event: HostEvent) {
        // No subscriber means nobody is listening; the event is lost as on a real host
        self.event_tx.send(event).ok();
    }
}

#[async_trait]
impl NativeDownloads for InMemoryHost {
    async fn search(&self, id: NativeDownloadId) -> Result<Vec<NativeDownload>> {
        if self.unreachable.lock().await.contains(&id) {
            return Err(Error::Host(format!("lookup for download {} failed", id)));
        }

        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| record.id == id)
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

impl DownloadEventSource for InMemoryHost {
    fn events(&self) -> BoxStream<'static, HostEvent> {
        BroadcastStream::new(self.event_tx.subscribe())
            .filter_map(|item| async move {
                match item {
                    Ok(event) => Some(event),
                    Err(e) => {
                        tracing::warn!(error = %e, "Host event subscriber lagged, events dropped");
                        None
                    }
                }
            })
            .boxed()
    }
}
