//! Configuration types for takeout-dl

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Admission settings (concurrency ceiling and cooldown)
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Maximum parts in flight at once (default: 9)
    ///
    /// Browsers allow 10 connections per origin; one is left free for the
    /// page itself.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Status polls to wait after proposing a part before proposing another (default: 60)
    ///
    /// With the UI polling about once a second this is roughly a minute,
    /// enough for the host's auth flow to settle before the next navigation.
    #[serde(default = "default_cool_down_ticks")]
    pub cool_down_ticks: u32,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: default_max_concurrent(),
            cool_down_ticks: default_cool_down_ticks(),
        }
    }
}

/// Signatures used to recognize the export's downloads
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Pattern matched against a new download's final URL
    ///
    /// Must contain a `timestamp` capture group; its value becomes the batch
    /// identity.
    #[serde(default = "default_export_url_pattern")]
    pub export_url_pattern: String,

    /// Pattern matched against a download's filename
    ///
    /// Must contain a `part` capture group holding the 1-based part ordinal.
    #[serde(default = "default_part_filename_pattern")]
    pub part_filename_pattern: String,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            export_url_pattern: default_export_url_pattern(),
            part_filename_pattern: default_part_filename_pattern(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "takeout-dl.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Main configuration for BulkDownloader
///
/// Admission and matching settings are flattened, so the serialized form is
/// a flat object with a nested `persistence` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Concurrency ceiling and cooldown
    #[serde(flatten)]
    pub admission: AdmissionConfig,

    /// Export URL and filename signatures
    #[serde(flatten)]
    pub matching: MatchingConfig,

    /// Data storage
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Check the configuration for values the engine can't work with
    pub fn validate(&self) -> Result<()> {
        if self.admission.max_concurrent_downloads == 0 {
            return Err(Error::Config {
                message: "max_concurrent_downloads must be at least 1".to_string(),
                key: Some("max_concurrent_downloads".to_string()),
            });
        }

        compile_pattern(
            &self.matching.export_url_pattern,
            "timestamp",
            "export_url_pattern",
        )?;
        compile_pattern(
            &self.matching.part_filename_pattern,
            "part",
            "part_filename_pattern",
        )?;

        Ok(())
    }
}

/// Compile a signature pattern and check it exposes the named group we read
pub(crate) fn compile_pattern(pattern: &str, group: &str, key: &str) -> Result<Regex> {
    let regex = Regex::new(pattern).map_err(|e| Error::Config {
        message: format!("invalid {} '{}': {}", key, pattern, e),
        key: Some(key.to_string()),
    })?;

    if !regex.capture_names().flatten().any(|name| name == group) {
        return Err(Error::Config {
            message: format!("{} must contain a '{}' capture group", key, group),
            key: Some(key.to_string()),
        });
    }

    Ok(regex)
}

// Default value functions
fn default_max_concurrent() -> usize {
    9
}

fn default_cool_down_ticks() -> u32 {
    60
}

fn default_export_url_pattern() -> String {
    r"googleusercontent\.com/download/storage/v1/b/dataliberation/o/(?P<timestamp>\d{8}T\d{6})\.\d{3}Z"
        .to_string()
}

fn default_part_filename_pattern() -> String {
    r"-(?P<part>\d{3})\.".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("takeout-dl.db")
}
