//! Assembles clusters into the shape map markers, popups, and the hotspot
//! list consume.

use collision_map_hotspots_models::{DisplayHotspot, HotspotCluster};

use crate::encode::encode;

/// Clusters with fewer members than this are hidden from the map. They
/// still count toward the aggregate totals.
pub const MIN_DISPLAY_CRASH_COUNT: u64 = 5;

/// Pairs a cluster with its severity encoding.
#[must_use]
pub fn to_display(cluster: &HotspotCluster) -> DisplayHotspot {
    DisplayHotspot {
        latitude: cluster.latitude,
        longitude: cluster.longitude,
        borough: cluster.borough.clone(),
        crash_count: cluster.crash_count,
        total_injured: cluster.total_injured,
        total_killed: cluster.total_killed,
        mean_severity: cluster.mean_severity,
        encoding: encode(cluster.mean_severity, cluster.crash_count),
    }
}

/// Projects every cluster with at least `min_crash_count` members, keeping
/// emission order.
#[must_use]
pub fn project(clusters: &[HotspotCluster], min_crash_count: u64) -> Vec<DisplayHotspot> {
    clusters
        .iter()
        .filter(|c| c.crash_count >= min_crash_count)
        .map(to_display)
        .collect()
}

#[cfg(test)]
mod tests {
    use collision_map_hotspots_models::SeverityTier;

    use super::*;

    #[allow(clippy::cast_possible_wrap)]
    fn cluster(crash_count: u64, mean_severity: f64) -> HotspotCluster {
        HotspotCluster {
            latitude: 40.7,
            longitude: -73.9,
            borough: Some("MANHATTAN".to_string()),
            member_ids: (0..crash_count as i64).collect(),
            crash_count,
            total_injured: 2,
            total_killed: 1,
            mean_severity,
        }
    }

    #[test]
    fn hides_small_clusters() {
        let clusters = vec![cluster(3, 3.0), cluster(5, 0.3), cluster(8, 1.5)];
        let display = project(&clusters, MIN_DISPLAY_CRASH_COUNT);
        let counts: Vec<u64> = display.iter().map(|d| d.crash_count).collect();
        assert_eq!(counts, vec![5, 8]);
    }

    #[test]
    fn copies_popup_fields() {
        let display = to_display(&cluster(6, 1.5));
        assert_eq!(display.borough.as_deref(), Some("MANHATTAN"));
        assert_eq!(display.total_injured, 2);
        assert_eq!(display.total_killed, 1);
        assert_eq!(display.encoding.tier, SeverityTier::High);
    }

    #[test]
    fn serializes_flat() {
        let value = serde_json::to_value(to_display(&cluster(6, 0.0))).unwrap();
        assert_eq!(value["crashCount"], 6);
        assert_eq!(value["tier"], "VERY_LOW");
        assert!(value["color"].is_string());
    }
}
