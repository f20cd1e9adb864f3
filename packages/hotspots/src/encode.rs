//! Severity tier, color, and marker size for a cluster.

use collision_map_hotspots_models::{SEVERITY_TIERS, SeverityEncoding, TierThreshold};

/// Smallest marker diameter in pixels.
pub const MIN_MARKER_SIZE: f64 = 15.0;
/// Largest marker diameter in pixels.
pub const MAX_MARKER_SIZE: f64 = 60.0;

const SEVERITY_SIZE_WEIGHT: f64 = 20.0;
const COUNT_SIZE_WEIGHT: f64 = 8.0;

/// Returns the first row of [`SEVERITY_TIERS`] whose lower bound is at most
/// `severity`. `NaN` falls through to the catch-all row.
#[must_use]
pub fn tier_for(severity: f64) -> &'static TierThreshold {
    SEVERITY_TIERS
        .iter()
        .find(|t| t.min_severity.is_none_or(|min| severity >= min))
        .unwrap_or(&SEVERITY_TIERS[SEVERITY_TIERS.len() - 1])
}

/// Marker size: `severity * 20 + ln(crash_count) * 8`, clamped to
/// `[15, 60]`.
///
/// Severity dominates; the member count adds a logarithmic boost so a
/// single severe cluster is not dwarfed by a large mild one.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn marker_size(severity: f64, crash_count: u64) -> f64 {
    let raw = severity.mul_add(
        SEVERITY_SIZE_WEIGHT,
        (crash_count as f64).ln() * COUNT_SIZE_WEIGHT,
    );
    if raw.is_nan() {
        MIN_MARKER_SIZE
    } else {
        raw.clamp(MIN_MARKER_SIZE, MAX_MARKER_SIZE)
    }
}

/// Encodes a cluster's mean severity and size as a tier, color, and marker
/// size.
#[must_use]
pub fn encode(mean_severity: f64, crash_count: u64) -> SeverityEncoding {
    let threshold = tier_for(mean_severity);
    SeverityEncoding {
        tier: threshold.tier,
        label: threshold.label.to_string(),
        color: threshold.color.to_string(),
        size: marker_size(mean_severity, crash_count),
    }
}
