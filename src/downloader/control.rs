//! Batch control: start a bulk download, reset the batch.

use crate::catalog::{Part, parse_part_label};
use crate::error::{Error, Result};
use crate::reconcile::{Input, Reply};
use crate::types::StartResponse;

use super::BulkDownloader;

impl BulkDownloader {
    /// Stage a scraped part catalog and get the first URL to open
    ///
    /// # Returns
    ///
    /// - [`StartResponse::Navigate`] with the first unbound part's URL; the
    ///   embedding layer opens it to kick off the export's authentication
    ///   flow and first download
    /// - [`StartResponse::TrackingActive`] when a batch is already downloading;
    ///   nothing changes
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCatalog`] when the parts are empty, have
    /// missing or duplicate ordinals, disagree on the total, or carry a
    /// source URL that doesn't parse. The stored batch is left untouched.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use takeout_dl::*;
    /// # async fn example(downloader: BulkDownloader) -> Result<()> {
    /// let parts = vec![
    ///     Part::new(1, 2, "https://takeout.google.com/takeout/download?j=abc&i=0", 2 << 30),
    ///     Part::new(2, 2, "https://takeout.google.com/takeout/download?j=abc&i=1", 1 << 29),
    /// ];
    ///
    /// if let Some(url) = downloader.start_bulk_download(parts).await?.start_next_download_url() {
    ///     println!("open {url}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_bulk_download(&self, parts: Vec<Part>) -> Result<StartResponse> {
        match self.step(Input::Start(parts)).await? {
            Reply::Start(response) => Ok(response),
            other => Err(Error::Other(format!(
                "unexpected reply to start request: {:?}",
                other
            ))),
        }
    }

    /// Start from the export page's link labels
    ///
    /// Each entry is the label text (`"Part 2 of 5 (1.5 GB)"`) and the link
    /// it sits next to.
    pub async fn start_from_labels(&self, links: &[(&str, &str)]) -> Result<StartResponse> {
        let parts = links
            .iter()
            .map(|(label, url)| {
                parse_part_label(label, url)
                    .ok_or_else(|| Error::InvalidCatalog(format!("unrecognized part label '{}'", label)))
            })
            .collect::<Result<Vec<_>>>()?;

        self.start_bulk_download(parts).await
    }

    /// Drop the current batch
    ///
    /// A finished batch is archived first. Downloads already running in the
    /// host are no longer tracked.
    pub async fn reset(&self) -> Result<()> {
        self.step(Input::Reset).await?;
        Ok(())
    }
}
