//! # takeout-dl
//!
//! Download-session reconciliation engine for multi-part bulk exports such as
//! Google Takeout.
//!
//! An export is offered as N downloadable parts. The host (a browser, or
//! anything with a native download manager) performs the actual transfers;
//! this crate decides which part to start next, keeps each native download
//! bound to the part it belongs to, and survives the host tearing down the
//! process between events.
//!
//! ## Design Philosophy
//!
//! - **Pure core** - [`Reconciler::apply`] maps a persisted batch and one input
//!   to a new batch, events and a reply, with no I/O
//! - **Pull is authoritative** - push events are a latency optimization; each
//!   status poll re-checks every bound part against the host
//! - **Stateless between steps** - every step loads and saves the whole batch
//! - **Library-first** - the host sits behind [`NativeDownloads`] and
//!   [`DownloadEventSource`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use takeout_dl::{BulkDownloader, Config, InMemoryHost, Part};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = InMemoryHost::new();
//!     let downloader = BulkDownloader::new(Config::default(), Arc::new(host.clone())).await?;
//!
//!     // Feed host events in the background
//!     let pump = downloader.clone();
//!     tokio::spawn(async move { pump.run(&host).await });
//!
//!     let parts = vec![Part::new(1, 1, "https://takeout.google.com/takeout/download?j=x&i=0", 1 << 30)];
//!     let first = downloader.start_bulk_download(parts).await?;
//!     println!("open {:?}", first.start_next_download_url());
//!
//!     // Poll periodically; open whatever URL comes back
//!     let report = downloader.status().await?;
//!     println!("{}", report.status_string);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Part catalog and batch record
pub mod catalog;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Bulk download facade (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Host download manager abstraction
pub mod host;
/// Pure reconciliation core
pub mod reconcile;
/// Core types and events
pub mod types;
/// Size codec
pub mod utils;

// Re-export commonly used types
pub use catalog::{Batch, Part, parse_part_label};
pub use config::Config;
pub use db::{ArchivedBatch, Database, MemoryStore, StateStore};
pub use downloader::BulkDownloader;
pub use error::{DatabaseError, Error, Result, TransitionError};
pub use host::{DownloadEventSource, InMemoryHost, NativeDownloads, ReplayEventSource};
pub use reconcile::{Input, Outcome, Reconciler, Reply};
pub use types::{
    DownloadCreated, DownloadDelta, Event, HostEvent, NativeDownload, NativeDownloadId,
    NativeState, PartState, StartResponse, StatusReport, Tracking,
};

/// Run the event pump until a termination signal, then shut down.
///
/// Returns early if the event source ends on its own.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use takeout_dl::{BulkDownloader, Config, InMemoryHost, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let host = InMemoryHost::new();
///     let downloader = BulkDownloader::new(Config::default(), Arc::new(host.clone())).await?;
///
///     run_with_shutdown(downloader, &host).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(
    downloader: BulkDownloader,
    source: &dyn DownloadEventSource,
) -> Result<()> {
    tokio::select! {
        result = downloader.run(source) => result?,
        () = wait_for_signal() => {}
    }
    downloader.shutdown().await
}

/// Resolve on SIGTERM, or on Ctrl-C everywhere
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                    _ = tokio::signal::ctrl_c() => tracing::info!("Received Ctrl-C"),
                }
                return;
            }
            Err(e) => tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl-C");
}
