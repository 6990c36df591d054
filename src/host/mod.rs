//! Host download manager abstraction
//!
//! The engine never talks to a browser directly. It sees the host through two
//! seams:
//!
//! - [`NativeDownloads`]: point lookups of native download records, used by
//!   the pull path on every status poll
//! - [`DownloadEventSource`]: the push stream of created/changed events
//!
//! Two implementations ship with the crate:
//!
//! - [`InMemoryHost`]: emulates a native download manager, for tests and demos
//! - [`ReplayEventSource`]: plays back a recorded event log
//!
//! ## Usage
//!
//! ```no_run
//! use takeout_dl::host::{InMemoryHost, NativeDownloads};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let host = InMemoryHost::new();
//! let id = host
//!     .create("https://storage.googleusercontent.com/download/storage/v1/b/dataliberation/o/20240315T101500.123Z", 1024)
//!     .await;
//! host.rename(id, "takeout-20240315T101500Z-001.zip").await?;
//!
//! let records = host.search(id).await?;
//! assert_eq!(records.len(), 1);
//! # Ok(())
//! # }
//! ```

mod memory;
mod replay;
mod traits;

pub use memory::InMemoryHost;
pub use replay::ReplayEventSource;
pub use traits::{DownloadEventSource, NativeDownloads};
