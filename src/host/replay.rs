//! Playback of recorded host event logs.

use super::DownloadEventSource;
use crate::Result;
use crate::types::HostEvent;
use futures::StreamExt;
use futures::stream::BoxStream;
use std::io::BufRead;

/// Event source that replays a fixed sequence, then ends
#[derive(Clone, Debug, Default)]
pub struct ReplayEventSource {
    events: Vec<HostEvent>,
}

impl ReplayEventSource {
    /// Replay the given events in order
    pub fn new(events: Vec<HostEvent>) -> Self {
        Self { events }
    }

    /// Parse a JSON-lines log, one [`HostEvent`] per line
    ///
    /// Blank lines are skipped.
    ///
    /// ```
    /// use takeout_dl::host::ReplayEventSource;
    ///
    /// let log = r#"{"type":"created","id":7,"final_url":"https://example.com/a"}
    /// {"type":"changed","id":7,"filename":"takeout-001.zip"}
    /// "#;
    /// let source = ReplayEventSource::from_json_lines(log.as_bytes()).unwrap();
    /// assert_eq!(source.len(), 2);
    /// ```
    pub fn from_json_lines(reader: impl BufRead) -> Result<Self> {
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            events.push(serde_json::from_str(line)?);
        }
        Ok(Self { events })
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl DownloadEventSource for ReplayEventSource {
    fn events(&self) -> BoxStream<'static, HostEvent> {
        futures::stream::iter(self.events.clone()).boxed()
    }
}
