//! Test downloader construction

use std::sync::Arc;
use takeout_dl::config::{AdmissionConfig, PersistenceConfig};
use takeout_dl::{BulkDownloader, Config, InMemoryHost};
use tempfile::TempDir;

/// Config with the given ceiling, no cooldown, and a database in `dir`
pub fn test_config(dir: &TempDir, max_concurrent_downloads: usize) -> Config {
    Config {
        admission: AdmissionConfig {
            max_concurrent_downloads,
            cool_down_ticks: 0,
        },
        persistence: PersistenceConfig {
            database_path: dir.path().join("takeout-dl.db"),
        },
        ..Default::default()
    }
}

/// SQLite-backed downloader over a fresh in-memory host.
/// Returns the downloader, its host and the tempdir (which must be kept alive).
pub async fn create_test_downloader(
    max_concurrent_downloads: usize,
) -> (BulkDownloader, InMemoryHost, TempDir) {
    let dir = tempfile::tempdir().expect("create tempdir");
    let host = InMemoryHost::new();
    let downloader = BulkDownloader::new(
        test_config(&dir, max_concurrent_downloads),
        Arc::new(host.clone()),
    )
    .await
    .expect("create downloader");

    (downloader, host, dir)
}
