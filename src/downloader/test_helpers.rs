//! Shared test helpers for creating BulkDownloader instances in tests.

use crate::catalog::Part;
use crate::config::{AdmissionConfig, Config};
use crate::db::MemoryStore;
use crate::downloader::BulkDownloader;
use crate::host::{DownloadEventSource, InMemoryHost};
use crate::types::NativeDownloadId;
use futures::StreamExt;
use std::sync::Arc;
use tempfile::tempdir;

/// Final URL of a download that belongs to the export
pub(crate) const EXPORT_URL: &str = "https://storage.googleusercontent.com/download/storage/v1/b/dataliberation/o/20240315T101500.123Z?alt=media";

/// Final URL of a download from a different export
pub(crate) const OTHER_EXPORT_URL: &str = "https://storage.googleusercontent.com/download/storage/v1/b/dataliberation/o/20240401T080000.000Z?alt=media";

pub(crate) const MB: u64 = 1024 * 1024;

/// Catalog of `count` equally sized parts
pub(crate) fn catalog(count: u32, size: u64) -> Vec<Part> {
    (1..=count)
        .map(|n| Part::new(n, count, part_url(n), size))
        .collect()
}

pub(crate) fn part_url(ordinal: u32) -> String {
    format!("https://takeout.google.com/takeout/download?j=test&i={}", ordinal - 1)
}

pub(crate) fn part_filename(ordinal: u32) -> String {
    format!("takeout-20240315T101500Z-{:03}.zip", ordinal)
}

/// Config with no cooldown, so every poll may admit a part
pub(crate) fn eager_config() -> Config {
    Config {
        admission: AdmissionConfig {
            max_concurrent_downloads: 3,
            cool_down_ticks: 0,
        },
        ..Default::default()
    }
}

/// Downloader over an in-memory store and host
pub(crate) fn create_memory_downloader(config: Config) -> (BulkDownloader, InMemoryHost) {
    let host = InMemoryHost::new();
    let downloader =
        BulkDownloader::with_store(config, Arc::new(MemoryStore::new()), Arc::new(host.clone()))
            .unwrap();
    (downloader, host)
}

/// Downloader with a persistent database.
/// Returns the downloader, its host and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader() -> (BulkDownloader, InMemoryHost, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = eager_config();
    config.persistence.database_path = temp_dir.path().join("test.db");

    let host = InMemoryHost::new();
    let downloader = BulkDownloader::new(config, Arc::new(host.clone()))
        .await
        .unwrap();
    (downloader, host, temp_dir)
}

/// Have the host create and name the download for one part, delivering both events
pub(crate) async fn start_part(
    downloader: &BulkDownloader,
    host: &InMemoryHost,
    ordinal: u32,
    size: u64,
) -> NativeDownloadId {
    let mut events = host.events();
    let id = host.create(EXPORT_URL, size).await;
    host.rename(id, &part_filename(ordinal)).await.unwrap();

    for _ in 0..2 {
        let event = events.next().await.unwrap();
        downloader.handle_host_event(event).await.unwrap();
    }
    id
}
