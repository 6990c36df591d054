//! Part lifecycle reconciliation.
//!
//! Push events from the host are a latency optimization: they are not
//! guaranteed to arrive, since the host may tear the process down between
//! events. The pull path, run on every status poll, is the authoritative
//! reconciliation against the native download manager.

use super::{Lookups, Outcome, Reconciler};
use crate::catalog::{Batch, Part};
use crate::types::{
    DownloadDelta, Event, NativeDownload, NativeDownloadId, NativeState, PartState, RevertReason,
    Tracking,
};

/// Native downloads the next poll must look up
///
/// Every part bound to a download that hasn't completed is checked, including
/// paused and errored ones.
pub fn pull_targets(batch: &Batch) -> Vec<NativeDownloadId> {
    batch
        .parts
        .iter()
        .filter(|part| needs_pull(part))
        .filter_map(|part| part.download_id)
        .collect()
}

fn needs_pull(part: &Part) -> bool {
    part.download_id.is_some()
        && matches!(
            part.state,
            PartState::InProgress | PartState::Paused | PartState::Errored
        )
}

impl Reconciler {
    /// Push path: apply a download-changed event
    pub(crate) fn apply_delta(&self, out: &mut Outcome, delta: &DownloadDelta) {
        let Some(batch) = out.batch.as_mut() else {
            return;
        };
        if batch.tracking(delta.id) == Tracking::NotTracked {
            tracing::trace!(download_id = delta.id.0, "Ignoring change for untracked download");
            return;
        }

        if let Some(filename) = &delta.filename
            && self.resolve_filename(batch, delta.id, filename, &mut out.events)
        {
            out.changed = true;
        }

        // Still unresolved, or dropped as a duplicate
        let Tracking::ResolvedTo(ordinal) = batch.tracking(delta.id) else {
            return;
        };
        let Some(part) = batch.part_mut(ordinal) else {
            return;
        };

        if let Some(state) = delta.state {
            let next = state.as_part_state();
            match part.transition(next) {
                Ok(from) => {
                    if from != next {
                        out.events.push(Event::PartStateChanged {
                            ordinal,
                            from,
                            to: next,
                        });
                    }
                    if next == PartState::Complete {
                        tracing::info!(download_id = delta.id.0, ordinal, "Part complete");
                        out.events.push(Event::PartCompleted { ordinal });
                    }
                }
                Err(e) => {
                    tracing::warn!(download_id = delta.id.0, error = %e, "Ignoring state change");
                }
            }
        }

        if let Some(error) = &delta.error {
            part.last_error = Some(error.clone());
        }
        if let Some(paused) = delta.paused {
            part.paused = Some(paused);
        }
        if let Some(can_resume) = delta.can_resume {
            part.can_resume = Some(can_resume);
        }

        if part.state == PartState::Complete {
            batch.pending.remove(&delta.id);
        }
        out.changed = true;
    }

    /// Pull path: align every bound, unfinished part with its native record
    pub(crate) fn reconcile_pull(&self, batch: &mut Batch, lookups: &Lookups, events: &mut Vec<Event>) {
        for part in batch.parts.iter_mut().filter(|part| needs_pull(part)) {
            let Some(id) = part.download_id else {
                continue;
            };
            let Some(records) = lookups.get(&id) else {
                // Lookup failed this round; try again next poll rather than guess
                continue;
            };

            match records.as_slice() {
                [record] => {
                    if let Some(reason) = apply_record(part, record, events) {
                        revert(part, id, reason, events);
                        batch.pending.remove(&id);
                    } else if part.state == PartState::Complete {
                        batch.pending.remove(&id);
                    }
                }
                [] => {
                    revert(part, id, RevertReason::Lost, events);
                    batch.pending.remove(&id);
                }
                _ => {
                    revert(part, id, RevertReason::Ambiguous, events);
                    batch.pending.remove(&id);
                }
            }
        }
    }
}

/// Copy one native record onto its part
///
/// Returns a revert reason when the download will not progress any further.
fn apply_record(
    part: &mut Part,
    record: &NativeDownload,
    events: &mut Vec<Event>,
) -> Option<RevertReason> {
    part.bytes_received = Some(record.bytes_received);

    let finished = record.state == NativeState::Complete
        || (record.total_bytes > 0 && record.bytes_received == record.total_bytes);
    let next = if finished {
        PartState::Complete
    } else {
        match record.state {
            NativeState::InProgress if record.paused => PartState::Paused,
            NativeState::InProgress => PartState::InProgress,
            _ => {
                if let Some(error) = &record.error {
                    part.last_error = Some(error.clone());
                }
                return Some(RevertReason::Interrupted);
            }
        }
    };

    part.paused = Some(record.paused);
    match part.transition(next) {
        Ok(from) if from != next => {
            events.push(Event::PartStateChanged {
                ordinal: part.ordinal,
                from,
                to: next,
            });
            if next == PartState::Complete {
                tracing::info!(ordinal = part.ordinal, "Part complete");
                events.push(Event::PartCompleted {
                    ordinal: part.ordinal,
                });
            }
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring native state"),
    }

    None
}

fn revert(part: &mut Part, id: NativeDownloadId, reason: RevertReason, events: &mut Vec<Event>) {
    tracing::warn!(
        download_id = id.0,
        ordinal = part.ordinal,
        ?reason,
        "Native download will not finish, part is eligible for retry"
    );
    let from = part.state;
    part.revert();
    events.push(Event::PartReverted {
        ordinal: part.ordinal,
        reason,
    });
    if from != PartState::Unstarted {
        events.push(Event::PartStateChanged {
            ordinal: part.ordinal,
            from,
            to: PartState::Unstarted,
        });
    }
}
