//! Admission control: whether another part may start, and which one.

use super::Reconciler;
use crate::catalog::{Batch, Part};
use crate::types::Event;

/// Choose the next part to start, in strict ordinal order
///
/// Returns `None` once `in_flight` reaches `ceiling`, or when every part
/// already has a native download bound to it.
pub fn next_part_to_start(parts: &[Part], in_flight: usize, ceiling: usize) -> Option<&Part> {
    if in_flight >= ceiling {
        return None;
    }
    parts
        .iter()
        .filter(|part| part.download_id.is_none())
        .min_by_key(|part| part.ordinal)
}

/// Source URL of [`next_part_to_start`]
pub fn next_url_to_start(parts: &[Part], in_flight: usize, ceiling: usize) -> Option<&str> {
    next_part_to_start(parts, in_flight, ceiling).map(|part| part.source_url.as_str())
}

impl Reconciler {
    /// Cooldown-gated admission, run once per status poll
    ///
    /// The cooldown ticks down on every poll and nothing is proposed while it
    /// is running. Proposing a part restarts it, so a navigation that never
    /// produced a download is retried once the interval has passed.
    pub(crate) fn admit(&self, batch: &mut Batch, events: &mut Vec<Event>) -> Option<String> {
        if batch.cool_down_ticks > 0 {
            batch.cool_down_ticks -= 1;
            return None;
        }
        let in_flight = batch.in_flight_count();
        let ceiling = self.admission.max_concurrent_downloads;
        let Some(part) = next_part_to_start(&batch.parts, in_flight, ceiling) else {
            tracing::trace!(in_flight, ceiling, "No part admitted");
            return None;
        };

        let (ordinal, url) = (part.ordinal, part.source_url.clone());
        tracing::info!(
            ordinal,
            total = part.total,
            in_flight,
            "Selecting part for next fetch"
        );
        batch.cool_down_ticks = self.admission.cool_down_ticks;
        events.push(Event::PartAdmitted {
            ordinal,
            url: url.clone(),
        });

        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NativeDownloadId, PartState};

    fn parts(count: u32) -> Vec<Part> {
        (1..=count)
            .map(|ordinal| {
                Part::new(ordinal, count, format!("https://example.com/p{ordinal}"), 100)
            })
            .collect()
    }

    fn bind(part: &mut Part, id: i64) {
        part.download_id = Some(NativeDownloadId(id));
        part.state = PartState::InProgress;
    }

    #[test]
    fn test_picks_lowest_unbound_ordinal() {
        let mut parts = parts(4);
        bind(&mut parts[0], 1);
        bind(&mut parts[2], 3);

        assert_eq!(
            next_url_to_start(&parts, 2, 9),
            Some("https://example.com/p2")
        );
    }

    #[test]
    fn test_ceiling_blocks_admission() {
        let parts = parts(3);
        assert_eq!(next_url_to_start(&parts, 9, 9), None);
        assert_eq!(next_url_to_start(&parts, 10, 9), None);
        assert!(next_url_to_start(&parts, 8, 9).is_some());
    }

    #[test]
    fn test_nothing_left_to_start() {
        let mut parts = parts(2);
        bind(&mut parts[0], 1);
        bind(&mut parts[1], 2);
        parts[1].state = PartState::Complete;

        assert_eq!(next_part_to_start(&parts, 1, 9), None);
    }

    #[test]
    fn test_never_returns_a_bound_part() {
        // Every subset of bound parts, every in-flight count around the ceiling
        let total = 6;
        for mask in 0u32..(1 << total) {
            let mut parts = parts(total);
            for (i, part) in parts.iter_mut().enumerate() {
                if mask & (1 << i) != 0 {
                    bind(part, i as i64 + 1);
                }
            }
            for in_flight in 0..12 {
                match next_part_to_start(&parts, in_flight, 9) {
                    Some(part) => {
                        assert!(part.download_id.is_none());
                        assert!(in_flight < 9);
                        let lower_unbound = parts
                            .iter()
                            .any(|p| p.download_id.is_none() && p.ordinal < part.ordinal);
                        assert!(!lower_unbound, "skipped a lower unbound part");
                    }
                    None => assert!(
                        in_flight >= 9 || parts.iter().all(|p| p.download_id.is_some())
                    ),
                }
            }
        }
    }
}
