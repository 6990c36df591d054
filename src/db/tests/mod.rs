mod history;

use crate::catalog::{Batch, Part};
use crate::types::{NativeDownloadId, PartState};

/// Two-part batch with part 1 bound and transferring
pub(super) fn sample_batch(identity: &str) -> Batch {
    let mut batch = Batch::staged(
        (1..=2)
            .map(|n| Part::new(n, 2, format!("https://takeout.example.com/part/{n}"), 1024))
            .collect(),
    );
    batch.identity = Some(identity.to_string());
    batch.is_downloading = true;
    batch.parts[0].state = PartState::InProgress;
    batch.parts[0].download_id = Some(NativeDownloadId(41));
    batch.parts[0].bytes_received = Some(512);
    batch
        .pending
        .insert(NativeDownloadId(41), crate::catalog::PendingEntry::Part(1));
    batch
}

/// Same batch with every part complete
pub(super) fn finished_batch(identity: &str) -> Batch {
    let mut batch = sample_batch(identity);
    for part in &mut batch.parts {
        part.state = PartState::Complete;
    }
    batch.pending.clear();
    batch.completed_at = Some(chrono::Utc::now());
    batch
}
