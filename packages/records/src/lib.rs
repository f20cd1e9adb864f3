#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory collision record store, filter evaluation, and aggregate
//! statistics.
//!
//! The [`store::RecordStore`] holds the full, unfiltered record set loaded
//! once at startup. [`filter`] decides which records a
//! [`FilterConfig`](collision_map_collision_models::FilterConfig) includes,
//! and [`stats`] reduces a filtered set to the totals shown on the summary
//! cards. None of these functions share mutable state, so every filter
//! change can be evaluated independently against the same store.

pub mod filter;
pub mod stats;
pub mod store;

use thiserror::Error;

/// Errors returned by record store queries.
///
/// Malformed record fields never produce an error; they only exclude the
/// affected record from a result.
#[derive(Debug, Error)]
pub enum RecordsError {
    /// A location search was given unusable coordinates or radius.
    #[error("Invalid location query: {message}")]
    InvalidLocation {
        /// Description of what went wrong.
        message: String,
    },
}
