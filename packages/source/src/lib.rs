#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collision data sources.
//!
//! Each upstream provider implements the [`CollisionSource`] trait to define
//! how raw data is fetched and normalized into
//! [`IncidentRecord`]s. The normalized set is written to a JSON snapshot
//! with [`snapshot::write_json`] and loaded once at server startup with
//! [`snapshot::load_records`].

pub mod nyc;
pub mod parsing;
pub mod progress;
pub mod retry;
pub mod snapshot;
pub mod socrata;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use collision_map_collision_models::IncidentRecord;

use crate::progress::ProgressCallback;

/// Errors that can occur while fetching or loading collision data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Request URL.
        url: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data normalization error.
    #[error("Normalization error: {message}")]
    Normalization {
        /// Description of what went wrong.
        message: String,
    },
}

/// Configuration for fetching data from a source.
#[derive(Clone)]
pub struct FetchOptions {
    /// Only fetch records on or after this date.
    pub since: Option<chrono::NaiveDate>,
    /// Maximum number of records to fetch.
    pub limit: Option<u64>,
    /// Directory to store downloaded files.
    pub output_dir: PathBuf,
    /// Receives page-level progress updates.
    pub progress: Arc<dyn ProgressCallback>,
}

impl std::fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOptions")
            .field("since", &self.since)
            .field("limit", &self.limit)
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

/// Trait that all collision data sources must implement.
#[async_trait]
pub trait CollisionSource: Send + Sync {
    /// Returns a unique identifier for this source (e.g., `"nyc_collisions"`).
    fn id(&self) -> &str;

    /// Returns the human-readable name of this source.
    fn name(&self) -> &str;

    /// Downloads raw data from the source, returning the path to the
    /// downloaded file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the download fails.
    async fn fetch(&self, options: &FetchOptions) -> Result<PathBuf, SourceError>;

    /// Parses the raw downloaded data and normalizes it into records.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the raw file cannot be read or parsed.
    async fn normalize(&self, raw_path: &Path) -> Result<Vec<IncidentRecord>, SourceError>;
}
