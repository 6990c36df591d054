//! Core types for takeout-dl

use serde::{Deserialize, Serialize};

/// Identifier the host's native download manager assigns to a download
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NativeDownloadId(pub i64);

impl NativeDownloadId {
    /// Create a new NativeDownloadId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for NativeDownloadId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<NativeDownloadId> for i64 {
    fn from(id: NativeDownloadId) -> Self {
        id.0
    }
}

impl std::fmt::Display for NativeDownloadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NativeDownloadId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Lifecycle state of a single part
///
/// Moves are checked against [`PartState::can_transition_to`]:
///
/// | from          | allowed targets                                     |
/// |---------------|-----------------------------------------------------|
/// | `unstarted`   | `in_progress`                                       |
/// | `in_progress` | `paused`, `complete`, `errored`, `unstarted`        |
/// | `paused`      | `in_progress`, `complete`, `errored`, `unstarted`   |
/// | `errored`     | `in_progress`, `paused`, `complete`, `unstarted`    |
/// | `complete`    | nothing                                             |
///
/// Staying in the same state is always allowed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartState {
    /// Not yet bound to a native download
    #[default]
    Unstarted,
    /// Bound and transferring
    InProgress,
    /// Bound, paused on the host side
    Paused,
    /// Transfer finished
    Complete,
    /// Host reported the transfer as interrupted
    Errored,
}

impl PartState {
    /// Whether the transition table allows moving from `self` to `next`
    pub fn can_transition_to(self, next: PartState) -> bool {
        use PartState::*;

        if self == next {
            return true;
        }
        match self {
            Unstarted => next == InProgress,
            InProgress | Paused | Errored => true,
            Complete => false,
        }
    }

    /// Terminal states never change again
    pub fn is_terminal(self) -> bool {
        self == PartState::Complete
    }

    /// In-flight parts hold one of the host's concurrent download slots
    pub fn is_in_flight(self) -> bool {
        matches!(self, PartState::InProgress | PartState::Paused)
    }

    /// Snake-case name, as persisted
    pub fn as_str(self) -> &'static str {
        match self {
            PartState::Unstarted => "unstarted",
            PartState::InProgress => "in_progress",
            PartState::Paused => "paused",
            PartState::Complete => "complete",
            PartState::Errored => "errored",
        }
    }
}

impl std::fmt::Display for PartState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Download state as reported by the host's native download manager
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeState {
    /// Transferring (or paused, see [`NativeDownload::paused`])
    InProgress,
    /// Stopped with an error; will not progress on its own
    Interrupted,
    /// Finished
    Complete,
}

impl NativeState {
    /// The part state a push event with this native state moves the part to
    pub fn as_part_state(self) -> PartState {
        match self {
            NativeState::InProgress => PartState::InProgress,
            NativeState::Interrupted => PartState::Errored,
            NativeState::Complete => PartState::Complete,
        }
    }
}

/// Point-in-time record returned by a native download lookup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeDownload {
    /// Native identifier
    pub id: NativeDownloadId,
    /// Reported state
    pub state: NativeState,
    /// Bytes received so far
    pub bytes_received: u64,
    /// Total expected bytes (0 when the host doesn't know yet)
    pub total_bytes: u64,
    /// Whether the user paused the download
    #[serde(default)]
    pub paused: bool,
    /// Interrupt reason, if any
    #[serde(default)]
    pub error: Option<String>,
}

/// A native download was created
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadCreated {
    /// Native identifier
    pub id: NativeDownloadId,
    /// Resolved target URL (only exposed at creation time)
    pub final_url: String,
}

/// Partial update for a native download; absent fields did not change
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadDelta {
    /// Native identifier
    pub id: NativeDownloadId,
    /// New local filename
    #[serde(default)]
    pub filename: Option<String>,
    /// New lifecycle state
    #[serde(default)]
    pub state: Option<NativeState>,
    /// New error string
    #[serde(default)]
    pub error: Option<String>,
    /// New paused flag
    #[serde(default)]
    pub paused: Option<bool>,
    /// New can-resume flag
    #[serde(default)]
    pub can_resume: Option<bool>,
}

/// Lifecycle event delivered by the host's native download manager
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A native download was created
    Created(DownloadCreated),
    /// A native download changed
    Changed(DownloadDelta),
}

impl HostEvent {
    /// Native identifier the event refers to
    pub fn id(&self) -> NativeDownloadId {
        match self {
            HostEvent::Created(created) => created.id,
            HostEvent::Changed(delta) => delta.id,
        }
    }
}

/// Whether, and how, a native download belongs to the current batch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tracking {
    /// Not part of this export
    NotTracked,
    /// Ours, but its filename hasn't identified the part yet
    PendingResolution,
    /// Bound to the part with this ordinal
    ResolvedTo(u32),
}

/// Why a part was reverted to unstarted by the pull path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertReason {
    /// The host no longer knows the download
    Lost,
    /// The lookup returned more than one record
    Ambiguous,
    /// The host reports the download as interrupted
    Interrupted,
}

/// Answer to the "start bulk download" request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StartResponse {
    /// Navigate to this URL to trigger the first part
    Navigate {
        /// Source URL of the first part to fetch
        url: String,
    },
    /// A batch is already being tracked in the background
    TrackingActive,
}

impl StartResponse {
    /// URL to navigate to, if any
    pub fn start_next_download_url(&self) -> Option<&str> {
        match self {
            StartResponse::Navigate { url } => Some(url),
            StartResponse::TrackingActive => None,
        }
    }
}

/// Answer to the "status" request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Rendered human-readable progress
    pub status_string: String,
    /// Whether a batch is actively being downloaded
    pub is_downloading: bool,
    /// URL to navigate to in order to start the next part
    pub start_next_download_url: Option<String>,
}

/// Event emitted by the reconciliation engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A part catalog was staged by a start request
    CatalogStaged {
        /// Number of parts in the catalog
        parts: u32,
    },

    /// The first download of a new export was observed
    BatchStarted {
        /// Batch identity token
        identity: String,
    },

    /// A download from a different export was dropped
    BatchRejected {
        /// Identity token of the rejected download
        identity: String,
        /// Identity token of the batch being tracked
        active: String,
    },

    /// A native download was bound to a part
    PartResolved {
        /// Part ordinal
        ordinal: u32,
        /// Native identifier
        download_id: NativeDownloadId,
    },

    /// A part moved between lifecycle states
    PartStateChanged {
        /// Part ordinal
        ordinal: u32,
        /// Previous state
        from: PartState,
        /// New state
        to: PartState,
    },

    /// A part finished downloading
    PartCompleted {
        /// Part ordinal
        ordinal: u32,
    },

    /// A part lost its native download and is eligible for retry
    PartReverted {
        /// Part ordinal
        ordinal: u32,
        /// Why it was reverted
        reason: RevertReason,
    },

    /// The admission controller proposed the next part
    PartAdmitted {
        /// Part ordinal
        ordinal: u32,
        /// Source URL to navigate to
        url: String,
    },

    /// Every part of the batch is complete
    BatchComplete {
        /// Batch identity token, if one was observed
        identity: Option<String>,
    },

    /// The downloader is shutting down
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use PartState::*;

        assert!(Unstarted.can_transition_to(InProgress));
        assert!(!Unstarted.can_transition_to(Complete));
        assert!(!Unstarted.can_transition_to(Paused));

        assert!(InProgress.can_transition_to(Paused));
        assert!(InProgress.can_transition_to(Complete));
        assert!(InProgress.can_transition_to(Unstarted));
        assert!(Paused.can_transition_to(InProgress));

        assert!(Errored.can_transition_to(Unstarted));
        assert!(Errored.can_transition_to(InProgress));
        assert!(Errored.can_transition_to(Paused));

        for next in [Unstarted, InProgress, Paused, Errored] {
            assert!(!Complete.can_transition_to(next), "complete -> {next}");
        }
        assert!(Complete.can_transition_to(Complete));
    }

    #[test]
    fn test_part_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PartState::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(PartState::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_host_event_json_shape() {
        let event: HostEvent = serde_json::from_str(
            r#"{"type":"changed","id":7,"filename":"takeout-001.zip"}"#,
        )
        .unwrap();

        assert_eq!(
            event,
            HostEvent::Changed(DownloadDelta {
                id: NativeDownloadId(7),
                filename: Some("takeout-001.zip".into()),
                ..Default::default()
            })
        );
        assert_eq!(event.id(), NativeDownloadId(7));
    }

    #[test]
    fn test_status_report_uses_ui_field_names() {
        let report = StatusReport {
            status_string: "Overall".into(),
            is_downloading: true,
            start_next_download_url: None,
        };
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["isDownloading"], true);
        assert!(json["startNextDownloadUrl"].is_null());
    }
}
