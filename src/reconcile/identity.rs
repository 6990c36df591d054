//! Batch identity tracking: which new downloads belong to the export.

use super::{Outcome, Reconciler};
use crate::catalog::{Batch, PendingEntry};
use crate::types::{DownloadCreated, Event};

impl Reconciler {
    /// Extract the batch identity token from a download's final URL
    ///
    /// Only the first match is used.
    pub fn batch_identity(&self, final_url: &str) -> Option<String> {
        self.export_url
            .captures(final_url)
            .and_then(|captures| captures.name("timestamp"))
            .map(|token| token.as_str().to_string())
    }

    /// Handle a download-created event
    ///
    /// The host only exposes the final URL at creation time, so this is the
    /// one chance to decide whether the download is ours.
    pub(crate) fn track_created(&self, out: &mut Outcome, created: &DownloadCreated) {
        let Some(token) = self.batch_identity(&created.final_url) else {
            tracing::debug!(download_id = created.id.0, "Download is not part of an export");
            return;
        };

        let mut batch = match out.batch.take() {
            None => {
                tracing::info!(batch = %token, "New export batch");
                out.events.push(Event::BatchStarted {
                    identity: token.clone(),
                });
                Batch::from_identity(token)
            }
            Some(mut staged) if staged.identity.is_none() => {
                tracing::info!(batch = %token, parts = staged.parts.len(), "Export batch identified");
                out.events.push(Event::BatchStarted {
                    identity: token.clone(),
                });
                staged.identity = Some(token);
                staged
            }
            Some(active) if active.identity.as_deref() == Some(token.as_str()) => active,
            Some(finished) if finished.is_finished() => {
                tracing::info!(
                    previous = ?finished.identity,
                    batch = %token,
                    "Previous batch finished, starting new export batch"
                );
                out.archived = Some(finished);
                out.events.push(Event::BatchStarted {
                    identity: token.clone(),
                });
                Batch::from_identity(token)
            }
            Some(active) => {
                let active_identity = active.identity.clone().unwrap_or_default();
                tracing::warn!(
                    download_id = created.id.0,
                    batch = %token,
                    active = %active_identity,
                    "Download belongs to a different export than the active batch, ignoring"
                );
                out.events.push(Event::BatchRejected {
                    identity: token,
                    active: active_identity,
                });
                out.batch = Some(active);
                return;
            }
        };

        // Ours, but which part is only known once the filename settles
        batch
            .pending
            .entry(created.id)
            .or_insert(PendingEntry::Unresolved);
        tracing::debug!(download_id = created.id.0, "Tracking export download");

        out.batch = Some(batch);
        out.changed = true;
    }
}
