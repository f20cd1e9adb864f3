#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hotspot cluster, severity tier, and hotspot summary types.
//!
//! [`SEVERITY_TIERS`] is the single source of truth for tier thresholds and
//! their display colors. The severity encoder and every legend renderer
//! read it rather than carrying their own copies of the thresholds.

use chrono::{DateTime, Utc};
use collision_map_collision_models::CrashStats;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity tier of a hotspot, from [`SeverityTier::VeryLow`] to
/// [`SeverityTier::Critical`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityTier {
    VeryLow,
    Low,
    LowMedium,
    Medium,
    MediumHigh,
    High,
    Critical,
}

impl SeverityTier {
    /// Human-readable label shown in the legend and popups.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::LowMedium => "Low-Medium",
            Self::Medium => "Medium",
            Self::MediumHigh => "Medium-High",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Returns this tier's row in [`SEVERITY_TIERS`].
    #[must_use]
    pub fn threshold(self) -> &'static TierThreshold {
        SEVERITY_TIERS
            .iter()
            .find(|t| t.tier == self)
            .unwrap_or(&SEVERITY_TIERS[SEVERITY_TIERS.len() - 1])
    }
}

/// One row of the severity tier table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierThreshold {
    /// Inclusive lower bound on mean severity. `None` for the catch-all
    /// lowest tier.
    pub min_severity: Option<f64>,
    pub tier: SeverityTier,
    pub label: &'static str,
    /// Semi-transparent CSS color used for markers and legend swatches.
    pub color: &'static str,
}

/// Tier table ordered highest tier first. The first row whose
/// `min_severity` is at most the value wins.
pub const SEVERITY_TIERS: &[TierThreshold] = &[
    TierThreshold {
        min_severity: Some(2.0),
        tier: SeverityTier::Critical,
        label: SeverityTier::Critical.label(),
        color: "rgba(31, 41, 55, 0.8)",
    },
    TierThreshold {
        min_severity: Some(1.0),
        tier: SeverityTier::High,
        label: SeverityTier::High.label(),
        color: "rgba(220, 38, 38, 0.8)",
    },
    TierThreshold {
        min_severity: Some(0.5),
        tier: SeverityTier::MediumHigh,
        label: SeverityTier::MediumHigh.label(),
        color: "rgba(234, 88, 12, 0.8)",
    },
    TierThreshold {
        min_severity: Some(0.2),
        tier: SeverityTier::Medium,
        label: SeverityTier::Medium.label(),
        color: "rgba(249, 115, 22, 0.8)",
    },
    TierThreshold {
        min_severity: Some(0.1),
        tier: SeverityTier::LowMedium,
        label: SeverityTier::LowMedium.label(),
        color: "rgba(245, 158, 11, 0.8)",
    },
    TierThreshold {
        min_severity: Some(0.05),
        tier: SeverityTier::Low,
        label: SeverityTier::Low.label(),
        color: "rgba(234, 179, 8, 0.8)",
    },
    TierThreshold {
        min_severity: None,
        tier: SeverityTier::VeryLow,
        label: SeverityTier::VeryLow.label(),
        color: "rgba(134, 239, 172, 0.8)",
    },
];

/// A group of nearby collisions derived from one filtered record set.
///
/// Clusters carry no identity beyond the computation that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotCluster {
    /// Latitude of the seed record (not a centroid).
    pub latitude: f64,
    /// Longitude of the seed record (not a centroid).
    pub longitude: f64,
    /// Borough of the seed record. Members are not re-checked.
    pub borough: Option<String>,
    /// Collision identifiers of every member, seed first.
    pub member_ids: Vec<i64>,
    pub crash_count: u64,
    pub total_injured: u64,
    pub total_killed: u64,
    /// Mean total-severity score across members.
    pub mean_severity: f64,
}

/// Visual encoding of a cluster's severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityEncoding {
    pub tier: SeverityTier,
    pub label: String,
    pub color: String,
    /// Marker diameter in pixels.
    pub size: f64,
}

/// A cluster ready for display as a map marker, popup, and list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayHotspot {
    pub latitude: f64,
    pub longitude: f64,
    pub borough: Option<String>,
    pub crash_count: u64,
    pub total_injured: u64,
    pub total_killed: u64,
    pub mean_severity: f64,
    #[serde(flatten)]
    pub encoding: SeverityEncoding,
}

/// Everything the map, legend, and summary cards need for one filter
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotView {
    /// Totals over the whole filtered set, independent of clustering.
    pub stats: CrashStats,
    /// Displayable hotspots in cluster emission order.
    pub hotspots: Vec<DisplayHotspot>,
    /// Number of filtered records fed to the clustering engine.
    pub analyzed_count: u64,
    /// Number of clusters before the display threshold was applied.
    pub cluster_count: u64,
}

/// A precomputed hotspot as delivered by the hotspot summary service.
///
/// Used for the initial, unfiltered display before any filter is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotSummary {
    pub id: u32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters.
    pub radius: f64,
    pub crash_count: u64,
    pub total_injured: u64,
    pub total_killed: u64,
    /// `crash_count + total_injured + 10 * total_killed`.
    pub severity_index: f64,
    /// When the summary snapshot was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}
