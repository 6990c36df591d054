//! Event helpers for integration tests

use std::time::Duration;
use takeout_dl::Event;
use tokio::sync::broadcast::Receiver;

/// Wait for the first event matching `predicate`
pub async fn wait_for_event<F>(
    events: &mut Receiver<Event>,
    timeout: Duration,
    predicate: F,
) -> Option<Event>
where
    F: Fn(&Event) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return Some(event),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    })
    .await;

    result.ok().flatten()
}

/// Every event currently buffered
pub fn drain(events: &mut Receiver<Event>) -> Vec<Event> {
    let mut collected = Vec::new();
    while let Ok(event) = events.try_recv() {
        collected.push(event);
    }
    collected
}

/// Ordinals admitted, in order, among `events`
pub fn admitted_ordinals(events: &[Event]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::PartAdmitted { ordinal, .. } => Some(*ordinal),
            _ => None,
        })
        .collect()
}
