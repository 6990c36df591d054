//! Part catalog and batch record
//!
//! A [`Batch`] is the whole persisted state of one export run: the ordered
//! part catalog, the index of native downloads that belong to the run, and
//! the admission cooldown. It is loaded and saved wholesale on every step.

use crate::error::{Error, Result, TransitionError};
use crate::types::{NativeDownloadId, PartState, Tracking};
use crate::utils::{SizeUnit, size_as_bytes};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

/// Label printed next to each download link on the export page
static PART_LABEL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"Part (?P<part>\d+) of (?P<parts>\d+) \((?P<size>[\d.]+) (?P<unit>[KMGT]?B)\)")
        .ok()
});

/// One downloadable segment of an export
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// 1-based position within the export
    pub ordinal: u32,
    /// Number of parts in the export
    pub total: u32,
    /// Navigating here triggers the native download for this part
    pub source_url: String,
    /// Expected size in bytes
    pub size_bytes: u64,

    /// Native download bound to this part
    #[serde(default)]
    pub download_id: Option<NativeDownloadId>,
    /// Lifecycle state
    #[serde(default)]
    pub state: PartState,
    /// Bytes received, while transferring
    #[serde(default)]
    pub bytes_received: Option<u64>,
    /// Last error reported by the host
    #[serde(default)]
    pub last_error: Option<String>,
    /// Host-side paused flag
    #[serde(default)]
    pub paused: Option<bool>,
    /// Host-side can-resume flag
    #[serde(default)]
    pub can_resume: Option<bool>,
}

impl Part {
    /// Create an unstarted part
    pub fn new(ordinal: u32, total: u32, source_url: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            ordinal,
            total,
            source_url: source_url.into(),
            size_bytes,
            download_id: None,
            state: PartState::Unstarted,
            bytes_received: None,
            last_error: None,
            paused: None,
            can_resume: None,
        }
    }

    /// Move to `next`, rejecting moves the transition table doesn't allow
    ///
    /// Returns the previous state.
    pub fn transition(&mut self, next: PartState) -> std::result::Result<PartState, TransitionError> {
        let from = self.state;
        if !from.can_transition_to(next) {
            return Err(TransitionError::Invalid {
                ordinal: self.ordinal,
                from,
                to: next,
            });
        }
        self.state = next;
        Ok(from)
    }

    /// Forget the native download and go back to unstarted
    ///
    /// `last_error` is kept for display.
    pub(crate) fn revert(&mut self) {
        self.state = PartState::Unstarted;
        self.download_id = None;
        self.bytes_received = None;
        self.paused = None;
        self.can_resume = None;
    }

    /// Bytes counted towards overall progress
    pub fn downloaded_bytes(&self) -> u64 {
        match self.state {
            PartState::Complete => self.size_bytes,
            PartState::InProgress | PartState::Paused => self.bytes_received.unwrap_or(0),
            PartState::Unstarted | PartState::Errored => 0,
        }
    }
}

/// Parse a scraped part label such as `"Part 2 of 5 (1.5 GB)"`
///
/// Returns `None` when the label doesn't follow that shape.
///
/// # Examples
///
/// ```
/// use takeout_dl::catalog::parse_part_label;
///
/// let part = parse_part_label("Part 2 of 5 (1.5 GB)", "https://example.com/p2").unwrap();
/// assert_eq!((part.ordinal, part.total), (2, 5));
/// assert_eq!(part.size_bytes, 1_610_612_736);
/// assert!(parse_part_label("Download", "https://example.com").is_none());
/// ```
pub fn parse_part_label(label: &str, source_url: &str) -> Option<Part> {
    let captures = PART_LABEL_RE.as_ref()?.captures(label)?;
    let ordinal = captures.name("part")?.as_str().parse().ok()?;
    let total = captures.name("parts")?.as_str().parse().ok()?;
    let size: f64 = captures.name("size")?.as_str().parse().ok()?;
    let unit = SizeUnit::parse(captures.name("unit")?.as_str());

    Some(Part::new(ordinal, total, source_url, size_as_bytes(size, unit)))
}

/// Check that a scraped catalog is usable
///
/// Ordinals must be unique and dense over `1..=total`, every part must agree
/// on `total`, and every source URL must be absolute.
pub fn validate_catalog(parts: &[Part]) -> Result<()> {
    let first = parts
        .first()
        .ok_or_else(|| Error::InvalidCatalog("catalog contains no parts".to_string()))?;
    let total = first.total;

    if total as usize != parts.len() {
        return Err(Error::InvalidCatalog(format!(
            "catalog lists {} parts but declares {} in total",
            parts.len(),
            total
        )));
    }

    let mut seen = HashSet::with_capacity(parts.len());
    for part in parts {
        if part.total != total {
            return Err(Error::InvalidCatalog(format!(
                "part {} declares {} parts in total, expected {}",
                part.ordinal, part.total, total
            )));
        }
        if part.ordinal == 0 || part.ordinal > total {
            return Err(Error::InvalidCatalog(format!(
                "part ordinal {} is outside 1..={}",
                part.ordinal, total
            )));
        }
        if !seen.insert(part.ordinal) {
            return Err(Error::InvalidCatalog(format!(
                "part ordinal {} appears twice",
                part.ordinal
            )));
        }
        url::Url::parse(&part.source_url).map_err(|e| {
            Error::InvalidCatalog(format!(
                "part {} has an invalid source URL '{}': {}",
                part.ordinal, part.source_url, e
            ))
        })?;
    }

    Ok(())
}

/// Pending-index entry for a native download that belongs to the batch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "ordinal", rename_all = "snake_case")]
pub enum PendingEntry {
    /// Filename not yet matched to a part
    Unresolved,
    /// Bound to the part with this ordinal
    Part(u32),
}

/// One export run, persisted as a single record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Token taken from the first matching download URL; `None` while a
    /// catalog is staged but no download has been observed yet
    #[serde(default)]
    pub identity: Option<String>,
    /// Parts ordered by ordinal
    #[serde(default)]
    pub parts: Vec<Part>,
    /// Native downloads that belong to this batch
    #[serde(default)]
    pub pending: BTreeMap<NativeDownloadId, PendingEntry>,
    /// Polls left before the next part may be proposed
    #[serde(default)]
    pub cool_down_ticks: u32,
    /// Set once the first part has been bound to a download
    #[serde(default)]
    pub is_downloading: bool,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When every part was first observed complete
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Batch {
    /// Batch created from the first matching download, before any catalog
    pub fn from_identity(identity: impl Into<String>) -> Self {
        Self {
            identity: Some(identity.into()),
            ..Self::staged(Vec::new())
        }
    }

    /// Batch created from a scraped catalog, before any download is seen
    pub fn staged(mut parts: Vec<Part>) -> Self {
        parts.sort_by_key(|part| part.ordinal);
        Self {
            identity: None,
            parts,
            pending: BTreeMap::new(),
            cool_down_ticks: 0,
            is_downloading: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Look up a part by its 1-based ordinal
    pub fn part(&self, ordinal: u32) -> Option<&Part> {
        let index = usize::try_from(ordinal).ok()?.checked_sub(1)?;
        self.parts.get(index).filter(|part| part.ordinal == ordinal)
    }

    /// Mutable lookup by 1-based ordinal
    pub fn part_mut(&mut self, ordinal: u32) -> Option<&mut Part> {
        let index = usize::try_from(ordinal).ok()?.checked_sub(1)?;
        self.parts.get_mut(index).filter(|part| part.ordinal == ordinal)
    }

    /// How a native download relates to this batch
    pub fn tracking(&self, id: NativeDownloadId) -> Tracking {
        match self.pending.get(&id) {
            None => Tracking::NotTracked,
            Some(PendingEntry::Unresolved) => Tracking::PendingResolution,
            Some(PendingEntry::Part(ordinal)) => Tracking::ResolvedTo(*ordinal),
        }
    }

    /// Number of parts holding a host download slot
    pub fn in_flight_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| part.state.is_in_flight())
            .count()
    }

    /// Sum of expected part sizes
    pub fn total_bytes(&self) -> u64 {
        self.parts.iter().map(|part| part.size_bytes).sum()
    }

    /// Sum of bytes counted towards overall progress
    pub fn downloaded_bytes(&self) -> u64 {
        self.parts.iter().map(Part::downloaded_bytes).sum()
    }

    /// Every part is complete
    pub fn all_parts_complete(&self) -> bool {
        !self.parts.is_empty() && self.parts.iter().all(|part| part.state.is_terminal())
    }

    /// A finished batch no longer blocks a new export
    pub fn is_finished(&self) -> bool {
        self.completed_at.is_some() || self.all_parts_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(sizes: &[u64]) -> Vec<Part> {
        let total = sizes.len() as u32;
        sizes
            .iter()
            .enumerate()
            .map(|(i, size)| {
                let ordinal = i as u32 + 1;
                Part::new(ordinal, total, format!("https://example.com/p{ordinal}"), *size)
            })
            .collect()
    }

    #[test]
    fn test_part_label_pattern_compiles() {
        let re = PART_LABEL_RE.as_ref().expect("label pattern must compile");
        let names: Vec<_> = re.capture_names().flatten().collect();
        assert_eq!(names, vec!["part", "parts", "size", "unit"]);
    }

    #[test]
    fn test_parse_part_label_units() {
        let part = parse_part_label("Part 1 of 3 (10 MB)", "https://example.com/1").unwrap();
        assert_eq!(part.ordinal, 1);
        assert_eq!(part.total, 3);
        assert_eq!(part.size_bytes, 10 * 1024 * 1024);
        assert_eq!(part.state, PartState::Unstarted);

        let part = parse_part_label("Part 12 of 40 (512 B)", "https://example.com/12").unwrap();
        assert_eq!(part.size_bytes, 512);

        let part = parse_part_label("Part 3 of 3 (49.99 GB)", "https://example.com/3").unwrap();
        assert_eq!(part.size_bytes, size_as_bytes(49.99, SizeUnit::Gigabytes));
    }

    #[test]
    fn test_parse_part_label_rejects_other_text() {
        assert!(parse_part_label("Part one of three", "https://example.com").is_none());
        assert!(parse_part_label("Part 1 of 3 (10 PB)", "https://example.com").is_none());
    }

    #[test]
    fn test_validate_catalog_accepts_dense_catalog() {
        validate_catalog(&catalog(&[1, 2, 3])).unwrap();
    }

    #[test]
    fn test_validate_catalog_rejects_bad_catalogs() {
        assert!(matches!(
            validate_catalog(&[]),
            Err(Error::InvalidCatalog(_))
        ));

        let mut duplicate = catalog(&[1, 2, 3]);
        duplicate[2].ordinal = 2;
        assert!(validate_catalog(&duplicate).is_err());

        let mut gap = catalog(&[1, 2]);
        gap[1].ordinal = 3;
        assert!(validate_catalog(&gap).is_err());

        let mut inconsistent = catalog(&[1, 2]);
        inconsistent[0].total = 5;
        assert!(validate_catalog(&inconsistent).is_err());

        let mut relative = catalog(&[1]);
        relative[0].source_url = "/takeout/download?part=1".into();
        match validate_catalog(&relative) {
            Err(Error::InvalidCatalog(msg)) => assert!(msg.contains("source URL"), "{msg}"),
            other => panic!("expected InvalidCatalog, got {other:?}"),
        }
    }

    #[test]
    fn test_staged_batch_orders_parts() {
        let mut parts = catalog(&[1, 2, 3]);
        parts.reverse();
        let batch = Batch::staged(parts);

        let ordinals: Vec<u32> = batch.parts.iter().map(|p| p.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert_eq!(batch.part(2).unwrap().ordinal, 2);
        assert!(batch.part(0).is_none());
        assert!(batch.part(4).is_none());
    }

    #[test]
    fn test_tracking_is_three_way() {
        let mut batch = Batch::from_identity("20240101T000000");
        batch.pending.insert(NativeDownloadId(1), PendingEntry::Unresolved);
        batch.pending.insert(NativeDownloadId(2), PendingEntry::Part(4));

        assert_eq!(batch.tracking(NativeDownloadId(1)), Tracking::PendingResolution);
        assert_eq!(batch.tracking(NativeDownloadId(2)), Tracking::ResolvedTo(4));
        assert_eq!(batch.tracking(NativeDownloadId(3)), Tracking::NotTracked);
    }

    #[test]
    fn test_progress_aggregates_by_state() {
        let mut batch = Batch::staged(catalog(&[100, 200, 300, 400]));
        batch.parts[0].state = PartState::Complete;
        batch.parts[1].state = PartState::InProgress;
        batch.parts[1].bytes_received = Some(50);
        batch.parts[2].state = PartState::Errored;
        batch.parts[2].bytes_received = Some(70);

        assert_eq!(batch.total_bytes(), 1000);
        assert_eq!(batch.downloaded_bytes(), 150);
        assert_eq!(batch.in_flight_count(), 1);
        assert!(!batch.all_parts_complete());
    }

    #[test]
    fn test_transition_rejects_leaving_complete() {
        let mut part = Part::new(1, 1, "https://example.com/1", 10);
        assert_eq!(part.transition(PartState::InProgress).unwrap(), PartState::Unstarted);
        part.transition(PartState::Complete).unwrap();

        let err = part.transition(PartState::InProgress).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Invalid {
                ordinal: 1,
                from: PartState::Complete,
                to: PartState::InProgress,
            }
        );
        assert_eq!(part.state, PartState::Complete);
    }

    #[test]
    fn test_batch_record_roundtrips_through_json() {
        let mut batch = Batch::staged(catalog(&[10, 20]));
        batch.identity = Some("20240101T000000".into());
        batch.pending.insert(NativeDownloadId(41), PendingEntry::Unresolved);
        batch.pending.insert(NativeDownloadId(42), PendingEntry::Part(2));

        let json = serde_json::to_string(&batch).unwrap();
        let restored: Batch = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, batch);
    }
}
