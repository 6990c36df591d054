
use super::test_helpers::*;
use crate::types::{Event, PartState};
use tokio::sync::broadcast::Receiver;

/// Drain every event currently buffered for a subscriber
fn drain(events: &mut Receiver<Event>) -> Vec<Event> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}
