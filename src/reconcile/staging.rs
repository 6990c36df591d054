//! Staging a scraped part catalog ("start bulk download").

use super::{Outcome, Reconciler, Reply};
use crate::catalog::{Batch, Part, validate_catalog};
use crate::error::Result;
use crate::types::{Event, StartResponse};

impl Reconciler {
    /// Handle a start request
    ///
    /// While an unfinished batch is downloading, the request is answered
    /// with [`StartResponse::TrackingActive`] and nothing changes. An
    /// unfinished batch that already has an identity keeps it, along with
    /// its pending downloads, and takes the new catalog.
    pub(crate) fn start(&self, out: &mut Outcome, mut parts: Vec<Part>) -> Result<()> {
        validate_catalog(&parts)?;

        let mut batch = match out.batch.take() {
            Some(active) if active.is_downloading && !active.is_finished() => {
                tracing::info!(batch = ?active.identity, "Batch already tracked in the background");
                out.batch = Some(active);
                out.reply = Reply::Start(StartResponse::TrackingActive);
                return Ok(());
            }
            Some(mut early)
                if early.parts.is_empty()
                    || (early.identity.is_some() && !early.is_finished()) =>
            {
                // Matching downloads were seen before any part bound; they
                // stay tracked under the new catalog
                tracing::debug!(
                    batch = ?early.identity,
                    pending = early.pending.len(),
                    "Adopting catalog into identified batch"
                );
                parts.sort_by_key(|part| part.ordinal);
                early.parts = parts;
                early
            }
            Some(previous) => {
                if previous.is_finished() {
                    out.archived = Some(previous);
                }
                Batch::staged(parts)
            }
            None => Batch::staged(parts),
        };

        batch.cool_down_ticks = self.admission.cool_down_ticks;
        let total = batch.parts.len() as u32;
        tracing::info!(parts = total, batch = ?batch.identity, "Part catalog staged");
        out.events.push(Event::CatalogStaged { parts: total });

        out.reply = Reply::Start(
            match batch.parts.iter().find(|part| part.download_id.is_none()) {
                Some(first) => StartResponse::Navigate {
                    url: first.source_url.clone(),
                },
                None => StartResponse::TrackingActive,
            },
        );
        out.batch = Some(batch);
        out.changed = true;

        Ok(())
    }
}
