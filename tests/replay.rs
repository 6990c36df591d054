//! Replaying recorded host event logs

mod common;

use common::*;
use std::sync::Arc;
use takeout_dl::{
    BulkDownloader, Event, InMemoryHost, MemoryStore, NativeDownloadId, PartState,
    ReplayEventSource, Tracking,
};

#[tokio::test]
async fn test_recorded_log_reconciles_to_expected_state() {
    let host = InMemoryHost::new();
    let dir = tempfile::tempdir().unwrap();
    let downloader = BulkDownloader::with_store(
        test_config(&dir, 9),
        Arc::new(MemoryStore::new()),
        Arc::new(host),
    )
    .unwrap();
    downloader.start_bulk_download(catalog(3, MB)).await.unwrap();
    let mut events = downloader.subscribe();

    let source = ReplayEventSource::from_json_lines(RECORDED_LOG.as_bytes()).unwrap();
    assert_eq!(source.len(), 9);
    downloader.run(&source).await.unwrap();

    let batch = downloader.batch().await.unwrap().unwrap();
    assert_eq!(batch.identity.as_deref(), Some("20240315T101500"));
    assert_eq!(batch.parts[0].state, PartState::Complete);
    assert_eq!(batch.parts[1].state, PartState::InProgress);
    assert_eq!(batch.parts[1].download_id, Some(NativeDownloadId(102)));
    assert_eq!(batch.parts[1].paused, Some(true));
    assert_eq!(batch.parts[2].state, PartState::Unstarted);
    assert_eq!(batch.tracking(NativeDownloadId(7)), Tracking::NotTracked);
    assert_eq!(batch.tracking(NativeDownloadId(101)), Tracking::NotTracked);
    assert_eq!(batch.tracking(NativeDownloadId(102)), Tracking::ResolvedTo(2));

    let seen = drain(&mut events);
    assert!(seen.contains(&Event::PartCompleted { ordinal: 1 }));
    assert!(seen.contains(&Event::PartResolved {
        ordinal: 2,
        download_id: NativeDownloadId(102)
    }));
}

#[tokio::test]
async fn test_pull_overrides_replayed_history() {
    // The replayed downloads never existed in this host, so the first poll
    // finds nothing for part 2 and makes it eligible again
    let host = InMemoryHost::new();
    let dir = tempfile::tempdir().unwrap();
    let downloader = BulkDownloader::with_store(
        test_config(&dir, 9),
        Arc::new(MemoryStore::new()),
        Arc::new(host),
    )
    .unwrap();
    downloader.start_bulk_download(catalog(3, MB)).await.unwrap();
    let source = ReplayEventSource::from_json_lines(RECORDED_LOG.as_bytes()).unwrap();
    downloader.run(&source).await.unwrap();
    let mut events = downloader.subscribe();

    let report = downloader.status().await.unwrap();

    let batch = downloader.batch().await.unwrap().unwrap();
    assert_eq!(batch.parts[1].state, PartState::Unstarted);
    assert_eq!(batch.parts[1].download_id, None);
    assert_eq!(report.start_next_download_url, Some(part_url(2)));
    assert_eq!(admitted_ordinals(&drain(&mut events)), vec![2]);
}
