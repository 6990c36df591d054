//! Download-session reconciliation engine
//!
//! Everything in this module is pure: [`Reconciler::apply`] takes the
//! persisted [`Batch`] (if any) and one [`Input`], and returns the new batch
//! together with the events and reply the step produced. Loading and saving
//! the batch, querying the host and broadcasting events are left to the
//! caller, so the engine can be driven by recorded event logs in tests.
//!
//! `Reconciler` methods are organized by concern:
//! - `staging` - accepting the scraped part catalog
//! - `identity` - recognizing the export's downloads and the batch token
//! - `resolver` - binding a download to a part through its filename
//! - `lifecycle` - push events and pull-path reconciliation
//! - [`admission`] - concurrency ceiling, cooldown and next-part choice
//! - `progress` - status rendering

pub mod admission;
mod identity;
mod lifecycle;
mod progress;
mod resolver;
mod staging;


pub use admission::{next_part_to_start, next_url_to_start};
pub use lifecycle::pull_targets;
pub use progress::render_status;

use crate::catalog::{Batch, Part};
use crate::config::{AdmissionConfig, Config, compile_pattern};
use crate::error::Result;
use crate::types::{
    DownloadCreated, DownloadDelta, Event, HostEvent, NativeDownload, NativeDownloadId,
    StartResponse, StatusReport,
};
use regex::Regex;
use std::collections::HashMap;

/// Native lookup results gathered for one poll
///
/// A missing key means the lookup for that download could not be made; an
/// empty vector means the host returned no record.
pub type Lookups = HashMap<NativeDownloadId, Vec<NativeDownload>>;

/// One unit of work for the engine
#[derive(Clone, Debug)]
pub enum Input {
    /// "Start bulk download" request with the scraped catalog
    Start(Vec<Part>),
    /// Host reported a new download
    Created(DownloadCreated),
    /// Host reported a download change
    Changed(DownloadDelta),
    /// "Status" request, with native lookups for [`pull_targets`]
    Poll(Lookups),
    /// Drop the current batch
    Reset,
}

impl From<HostEvent> for Input {
    fn from(event: HostEvent) -> Self {
        match event {
            HostEvent::Created(created) => Input::Created(created),
            HostEvent::Changed(delta) => Input::Changed(delta),
        }
    }
}

/// Reply to the request that triggered a step
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Reply {
    /// Host events have no reply
    #[default]
    None,
    /// Reply to [`Input::Start`]
    Start(StartResponse),
    /// Reply to [`Input::Poll`]
    Status(StatusReport),
}

/// Result of applying one input
#[derive(Clone, Debug, Default)]
pub struct Outcome {
    /// Batch after the step (`None` = no batch)
    pub batch: Option<Batch>,
    /// Whether the batch must be written back
    pub changed: bool,
    /// Events to broadcast once the batch is persisted
    pub events: Vec<Event>,
    /// Finished batch superseded by this step, to be archived
    pub archived: Option<Batch>,
    /// Reply for the caller
    pub reply: Reply,
}

impl Outcome {
    fn unchanged(batch: Option<Batch>) -> Self {
        Self {
            batch,
            ..Default::default()
        }
    }
}

/// Pure reconciliation core
#[derive(Clone, Debug)]
pub struct Reconciler {
    export_url: Regex,
    part_filename: Regex,
    admission: AdmissionConfig,
}

impl Reconciler {
    /// Build a reconciler, compiling the configured signatures
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            export_url: compile_pattern(
                &config.matching.export_url_pattern,
                "timestamp",
                "export_url_pattern",
            )?,
            part_filename: compile_pattern(
                &config.matching.part_filename_pattern,
                "part",
                "part_filename_pattern",
            )?,
            admission: config.admission.clone(),
        })
    }

    /// Apply one input to the persisted batch
    ///
    /// Only [`Input::Start`] can fail (on an invalid catalog), in which case
    /// the batch is left untouched.
    pub fn apply(&self, batch: Option<Batch>, input: Input) -> Result<Outcome> {
        let mut out = Outcome::unchanged(batch);

        match input {
            Input::Start(parts) => self.start(&mut out, parts)?,
            Input::Created(created) => self.track_created(&mut out, &created),
            Input::Changed(delta) => self.apply_delta(&mut out, &delta),
            Input::Poll(lookups) => self.poll(&mut out, &lookups),
            Input::Reset => self.reset(&mut out),
        }

        Ok(out)
    }

    fn reset(&self, out: &mut Outcome) {
        if let Some(batch) = out.batch.take() {
            tracing::info!(batch = ?batch.identity, "Resetting batch");
            if batch.is_finished() {
                out.archived = Some(batch);
            }
            out.changed = true;
        }
    }

    /// One status poll: pull reconciliation, completion check, admission
    fn poll(&self, out: &mut Outcome, lookups: &Lookups) {
        let Some(batch) = out.batch.as_mut().filter(|batch| !batch.parts.is_empty()) else {
            out.reply = Reply::Status(StatusReport::default());
            return;
        };

        self.reconcile_pull(batch, lookups, &mut out.events);

        if batch.completed_at.is_none() && batch.all_parts_complete() {
            batch.completed_at = Some(chrono::Utc::now());
            tracing::info!(batch = ?batch.identity, parts = batch.parts.len(), "All parts complete");
            out.events.push(Event::BatchComplete {
                identity: batch.identity.clone(),
            });
        }

        let status_string = render_status(batch);
        let start_next_download_url = self.admit(batch, &mut out.events);

        out.reply = Reply::Status(StatusReport {
            status_string,
            is_downloading: batch.is_downloading,
            start_next_download_url,
        });
        out.changed = true;
    }
}
