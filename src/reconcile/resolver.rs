//! Filename-to-part resolution.

use super::Reconciler;
use crate::catalog::{Batch, PendingEntry};
use crate::types::{Event, NativeDownloadId, PartState, Tracking};

impl Reconciler {
    /// Extract the 1-based part ordinal from a download filename
    ///
    /// Only the final path component is inspected, so directory names can't
    /// produce a false match.
    pub fn part_ordinal(&self, filename: &str) -> Option<u32> {
        let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
        self.part_filename
            .captures(name)
            .and_then(|captures| captures.name("part"))
            .and_then(|ordinal| ordinal.as_str().parse().ok())
    }

    /// Bind a pending download to the part its filename names
    ///
    /// Returns whether the batch changed. A filename that doesn't match
    /// leaves the download pending, since the host may still rename it.
    pub(crate) fn resolve_filename(
        &self,
        batch: &mut Batch,
        id: NativeDownloadId,
        filename: &str,
        events: &mut Vec<Event>,
    ) -> bool {
        if batch.tracking(id) != Tracking::PendingResolution {
            return false;
        }

        let Some(ordinal) = self.part_ordinal(filename) else {
            tracing::debug!(download_id = id.0, filename, "Filename does not name a part yet");
            return false;
        };

        let Some(part) = batch.part_mut(ordinal) else {
            tracing::debug!(
                download_id = id.0,
                ordinal,
                "Filename names a part outside the catalog, leaving unresolved"
            );
            return false;
        };

        if part.state == PartState::Complete {
            tracing::warn!(
                download_id = id.0,
                ordinal,
                "Duplicate download of a completed part, no longer tracking it"
            );
            batch.pending.remove(&id);
            return true;
        }

        let from = match part.transition(PartState::InProgress) {
            Ok(from) => from,
            Err(e) => {
                tracing::warn!(download_id = id.0, error = %e, "Cannot bind download to part");
                return false;
            }
        };

        let replaced = part.download_id.replace(id).filter(|old| *old != id);
        part.bytes_received = Some(0);
        part.paused = None;
        tracing::info!(download_id = id.0, ordinal, "Part started");

        if let Some(old) = replaced {
            tracing::warn!(
                download_id = id.0,
                previous = old.0,
                ordinal,
                "Part was bound to another download, rebinding"
            );
            batch.pending.remove(&old);
        }

        batch.pending.insert(id, PendingEntry::Part(ordinal));
        batch.is_downloading = true;
        // A live, matched download means the auth flow worked; no need to wait
        batch.cool_down_ticks = 0;

        events.push(Event::PartResolved {
            ordinal,
            download_id: id,
        });
        if from != PartState::InProgress {
            events.push(Event::PartStateChanged {
                ordinal,
                from,
                to: PartState::InProgress,
            });
        }

        true
    }
}
