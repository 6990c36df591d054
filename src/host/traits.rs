//! Collaborator traits for the host download manager

use crate::types::{HostEvent, NativeDownload, NativeDownloadId};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Point lookups against the host's native download manager
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use takeout_dl::host::NativeDownloads;
/// use takeout_dl::{NativeDownload, NativeDownloadId};
///
/// /// Host that has forgotten every download
/// struct Amnesiac;
///
/// #[async_trait]
/// impl NativeDownloads for Amnesiac {
///     async fn search(&self, _id: NativeDownloadId) -> takeout_dl::Result<Vec<NativeDownload>> {
///         Ok(Vec::new())
///     }
///
///     fn name(&self) -> &'static str {
///         "amnesiac"
///     }
/// }
/// ```
#[async_trait]
pub trait NativeDownloads: Send + Sync {
    /// Look up the native records for one download identifier
    ///
    /// # Returns
    ///
    /// Every record the host holds for `id`. Exactly one record is the normal
    /// case; zero means the download was erased, several means the host's
    /// answer is ambiguous. Both make the bound part eligible for retry.
    ///
    /// # Errors
    ///
    /// Returns an error when the host could not answer at all. The part is
    /// then left untouched until the next poll.
    async fn search(&self, id: NativeDownloadId) -> crate::Result<Vec<NativeDownload>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Push stream of host download events
///
/// Delivery is best effort. The host may drop events (for example when it
/// suspends the process), which the pull path makes up for.
pub trait DownloadEventSource: Send + Sync {
    /// Subscribe to events from now on
    ///
    /// The stream ends when the source has nothing more to deliver.
    fn events(&self) -> BoxStream<'static, HostEvent>;
}
