#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hotspot derivation for collision records.
//!
//! Turns a filtered record set into displayable hotspots:
//!
//! 1. [`cluster`] groups nearby records with a greedy, order-dependent pass
//!    that assigns every located record to exactly one cluster.
//! 2. [`encode`] maps each cluster's mean severity to a tier, color, and
//!    marker size using the shared tier table.
//! 3. [`projection`] drops clusters below the display threshold and pairs
//!    the rest with their encoding.
//!
//! Aggregate totals are computed from the same filtered set by
//! [`collision_map_records::stats`], independently of clustering.
//! [`summary`] builds the precomputed hotspot list used before any filter
//! is applied.

pub mod cluster;
pub mod encode;
pub mod projection;
pub mod summary;

use std::borrow::Borrow;

use collision_map_collision_models::{FilterConfig, IncidentRecord};
use collision_map_hotspots_models::HotspotView;
use collision_map_records::{filter, stats};

use crate::cluster::ClusterOptions;
use crate::projection::MIN_DISPLAY_CRASH_COUNT;

/// Tunables for [`derive_hotspots_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotspotOptions {
    pub cluster: ClusterOptions,
    /// Smallest cluster shown on the map.
    pub min_display_count: u64,
}

impl Default for HotspotOptions {
    fn default() -> Self {
        Self {
            cluster: ClusterOptions::default(),
            min_display_count: MIN_DISPLAY_CRASH_COUNT,
        }
    }
}

/// Filters `records` with `config` and derives the full hotspot view with
/// default options.
#[must_use]
pub fn derive_hotspots<R: Borrow<IncidentRecord>>(
    records: &[R],
    config: &FilterConfig,
) -> HotspotView {
    derive_hotspots_with(records, config, &HotspotOptions::default())
}

/// Filters `records` with `config`, computes totals over the filtered set,
/// clusters it, and projects the displayable clusters.
///
/// Every call is a full recompute from `records`; nothing is cached between
/// calls.
#[must_use]
pub fn derive_hotspots_with<R: Borrow<IncidentRecord>>(
    records: &[R],
    config: &FilterConfig,
    options: &HotspotOptions,
) -> HotspotView {
    let filtered = filter::apply(records, config);
    let stats = stats::compute_stats(&filtered);
    let clusters = cluster::cluster_with(&filtered, &options.cluster);
    let hotspots = projection::project(&clusters, options.min_display_count);

    log::debug!(
        "Derived {} displayable hotspots from {} clusters ({} of {} records matched)",
        hotspots.len(),
        clusters.len(),
        filtered.len(),
        records.len()
    );

    HotspotView {
        stats,
        hotspots,
        analyzed_count: filtered.len() as u64,
        cluster_count: clusters.len() as u64,
    }
}
