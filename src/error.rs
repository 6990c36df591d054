//! Error types for takeout-dl
//!
//! The reconciliation core itself never fails on bad host input: unknown
//! downloads are ignored, lost downloads are reverted and retried. The errors
//! defined here cover the surfaces that can genuinely fail: configuration,
//! persistence, catalog validation and rejected state transitions.

use crate::types::PartState;
use thiserror::Error;

/// Result type alias for takeout-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for takeout-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "part_filename_pattern")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Serialization error (persisted batch record, replay logs)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A part state transition was rejected by the transition table
    #[error("transition error: {0}")]
    Transition(#[from] TransitionError),

    /// The part catalog handed in by the page scraper is not usable
    #[error("invalid part catalog: {0}")]
    InvalidCatalog(String),

    /// The host download manager failed to answer a query
    #[error("host error: {0}")]
    Host(String),

    /// Shutdown in progress - not accepting new steps
    #[error("shutdown in progress: not accepting new events")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// The stored batch record could not be decoded
    #[error("stored batch record is corrupt: {0}")]
    CorruptState(String),
}

/// Part lifecycle transition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The transition table does not allow `from -> to`
    #[error("part {ordinal} cannot move from {from} to {to}")]
    Invalid {
        /// Ordinal of the part the transition was attempted on
        ordinal: u32,
        /// State the part is currently in
        from: PartState,
        /// State that was requested
        to: PartState,
    },
}

impl Error {
    /// Machine-readable error code for the UI bridge
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(DatabaseError::CorruptState(_)) => "corrupt_state",
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::Transition(_) => "invalid_transition",
            Error::InvalidCatalog(_) => "invalid_catalog",
            Error::Host(_) => "host_error",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }
}
