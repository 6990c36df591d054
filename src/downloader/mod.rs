//! Bulk download facade split into focused submodules.
//!
//! The `BulkDownloader` struct and its methods are organized by domain:
//! - [`control`] - Starting a bulk download, resetting the batch
//! - [`status`] - Status polls: pull reconciliation, admission, rendering
//! - [`events`] - Host push events
//! - [`lifecycle`] - Event pump and shutdown coordination
//!
//! Every public operation is one reconciliation step: take the step lock,
//! load the batch, apply one [`Input`], persist, then broadcast events.

mod control;
mod events;
mod lifecycle;
mod status;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::catalog::Batch;
use crate::config::Config;
use crate::db::{ArchivedBatch, Database, StateStore};
use crate::error::{Error, Result};
use crate::host::NativeDownloads;
use crate::reconcile::{Input, Reconciler, Reply};
use crate::types::Event;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct BulkDownloader {
    /// Batch persistence (SQLite by default)
    pub(crate) store: Arc<dyn StateStore>,
    /// Host download manager used for pull-path lookups
    pub(crate) native: Arc<dyn NativeDownloads>,
    /// Pure reconciliation core with compiled signatures
    pub(crate) reconciler: Arc<Reconciler>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Serializes reconciliation steps within this process
    pub(crate) step_lock: Arc<tokio::sync::Mutex<()>>,
    /// Cancelled on shutdown; stops the event pump and new steps
    pub(crate) shutdown: CancellationToken,
}

impl BulkDownloader {
    /// Create a new BulkDownloader backed by SQLite
    ///
    /// This initializes all core components:
    /// - Validates the configuration and compiles the signatures
    /// - Opens/creates the SQLite database and runs migrations
    /// - Sets up the event broadcast channel
    pub async fn new(config: Config, native: Arc<dyn NativeDownloads>) -> Result<Self> {
        config.validate()?;
        let db = Database::new(&config.persistence.database_path).await?;
        Self::with_store(config, Arc::new(db), native)
    }

    /// Create a BulkDownloader over any [`StateStore`]
    pub fn with_store(
        config: Config,
        store: Arc<dyn StateStore>,
        native: Arc<dyn NativeDownloads>,
    ) -> Result<Self> {
        let reconciler = Reconciler::new(&config)?;

        // Capacity 1000: a subscriber that falls further behind gets `Lagged`
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        tracing::info!(
            store = store.name(),
            host = native.name(),
            max_concurrent_downloads = config.admission.max_concurrent_downloads,
            cool_down_ticks = config.admission.cool_down_ticks,
            "Bulk downloader initialized"
        );

        Ok(Self {
            store,
            native,
            reconciler: Arc::new(reconciler),
            event_tx,
            config: Arc::new(config),
            step_lock: Arc::new(tokio::sync::Mutex::new(())),
            shutdown: CancellationToken::new(),
        })
    }

    /// Subscribe to batch events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events
    /// independently. Events are only sent once the step that produced them
    /// has been persisted.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use takeout_dl::{BulkDownloader, Config, InMemoryHost};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = BulkDownloader::new(Config::default(), Arc::new(InMemoryHost::new())).await?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "batch event");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// The persisted batch, if any
    pub async fn batch(&self) -> Result<Option<Batch>> {
        self.store.load_batch().await
    }

    /// Finished batches that were superseded or reset, most recent first
    pub async fn archived_batches(&self) -> Result<Vec<ArchivedBatch>> {
        self.store.archived_batches().await
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Run one reconciliation step against the stored batch
    pub(crate) async fn step(&self, input: Input) -> Result<Reply> {
        self.ensure_running()?;
        let _guard = self.step_lock.lock().await;

        let batch = self.store.load_batch().await?;
        self.commit(batch, input).await
    }

    /// Apply `input` to an already-loaded batch and persist the outcome
    ///
    /// Callers must hold the step lock.
    pub(crate) async fn commit(&self, batch: Option<Batch>, input: Input) -> Result<Reply> {
        let outcome = self.reconciler.apply(batch, input)?;

        if let Some(archived) = &outcome.archived {
            self.store.archive_batch(archived).await?;
        }
        if outcome.changed {
            match &outcome.batch {
                Some(batch) => self.store.save_batch(batch).await?,
                None => self.store.clear_batch().await?,
            }
        }

        for event in outcome.events {
            self.emit_event(event);
        }

        Ok(outcome.reply)
    }

    pub(crate) fn ensure_running(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(Error::ShuttingDown);
        }
        Ok(())
    }
}
