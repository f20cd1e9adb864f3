//! Precomputed hotspot summaries.
//!
//! Summaries back the initial, unfiltered map before the user touches any
//! filter. They are generated offline from the full record set, written to
//! a JSON snapshot, and served as-is.

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};

use collision_map_collision_models::{FATALITY_SEVERITY_WEIGHT, IncidentRecord};
use collision_map_hotspots_models::HotspotSummary;

use crate::cluster::{ClusterOptions, cluster_with, planar_distance};

/// Approximate meters per degree, used to express the summary radius.
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Tunables for [`generate_summaries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryOptions {
    pub cluster: ClusterOptions,
    /// Clusters with fewer members are dropped.
    pub min_crashes: u64,
    /// At most this many summaries are kept, most severe first.
    pub max_hotspots: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            cluster: ClusterOptions::default(),
            min_crashes: 5,
            max_hotspots: 50,
        }
    }
}

/// Severity index of a hotspot: crashes plus injuries plus ten per
/// fatality.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn severity_index(crash_count: u64, total_injured: u64, total_killed: u64) -> f64 {
    (total_killed as f64).mul_add(
        FATALITY_SEVERITY_WEIGHT,
        crash_count as f64 + total_injured as f64,
    )
}

/// Clusters `records` and summarizes each sufficiently large cluster.
///
/// Records repeating an earlier `collision_id` are skipped, so each id
/// contributes once to the counts and the geometry. Summaries are located
/// at the centroid of their members, carry a radius reaching the farthest
/// member, and are ordered by severity index, highest first. They are named `Hotspot 1`, `Hotspot 2`, ... in that
/// order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn generate_summaries<R: Borrow<IncidentRecord>>(
    records: &[R],
    options: &SummaryOptions,
) -> Vec<HotspotSummary> {
    let mut seen = BTreeSet::new();
    let unique: Vec<&IncidentRecord> = records
        .iter()
        .map(<R as Borrow<IncidentRecord>>::borrow)
        .filter(|r| seen.insert(r.collision_id))
        .collect();
    if unique.len() < records.len() {
        log::warn!(
            "Skipping {} records with duplicate collision ids",
            records.len() - unique.len()
        );
    }

    let coordinates: BTreeMap<i64, (f64, f64)> = unique
        .iter()
        .filter_map(|r| r.coordinates().map(|c| (r.collision_id, c)))
        .collect();

    let clusters = cluster_with(&unique, &options.cluster);
    let cluster_count = clusters.len();

    let mut summaries: Vec<HotspotSummary> = clusters
        .into_iter()
        .filter(|c| c.crash_count >= options.min_crashes)
        .map(|c| {
            let members: Vec<(f64, f64)> = c
                .member_ids
                .iter()
                .filter_map(|id| coordinates.get(id).copied())
                .collect();
            let n = members.len().max(1) as f64;
            let centroid = (
                members.iter().map(|m| m.0).sum::<f64>() / n,
                members.iter().map(|m| m.1).sum::<f64>() / n,
            );
            let radius = members
                .iter()
                .map(|&m| planar_distance(centroid, m))
                .fold(0.0, f64::max)
                * METERS_PER_DEGREE;

            HotspotSummary {
                id: 0,
                name: String::new(),
                latitude: centroid.0,
                longitude: centroid.1,
                radius,
                crash_count: c.crash_count,
                total_injured: c.total_injured,
                total_killed: c.total_killed,
                severity_index: severity_index(c.crash_count, c.total_injured, c.total_killed),
                generated_at: None,
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.severity_index.total_cmp(&a.severity_index));
    summaries.truncate(options.max_hotspots);

    for (i, summary) in summaries.iter_mut().enumerate() {
        let n = u32::try_from(i + 1).unwrap_or(u32::MAX);
        summary.id = n;
        summary.name = format!("Hotspot {n}");
    }

    log::info!(
        "Generated {} hotspot summaries from {} clusters over {} records",
        summaries.len(),
        cluster_count,
        records.len()
    );

    summaries
}

/// Returns summaries meeting both optional minimums, most severe first.
#[must_use]
pub fn filter_summaries(
    summaries: &[HotspotSummary],
    min_crashes: Option<u64>,
    min_severity: Option<f64>,
) -> Vec<&HotspotSummary> {
    let mut matching: Vec<&HotspotSummary> = summaries
        .iter()
        .filter(|s| min_crashes.is_none_or(|min| s.crash_count >= min))
        .filter(|s| min_severity.is_none_or(|min| s.severity_index >= min))
        .collect();
    matching.sort_by(|a, b| b.severity_index.total_cmp(&a.severity_index));
    matching
}

/// Looks up a summary by id.
#[must_use]
pub fn find(summaries: &[HotspotSummary], id: u32) -> Option<&HotspotSummary> {
    summaries.iter().find(|s| s.id == id)
}

/// Returns the `limit` most severe summaries.
#[must_use]
pub fn top_severity(summaries: &[HotspotSummary], limit: usize) -> Vec<&HotspotSummary> {
    let mut top = filter_summaries(summaries, None, None);
    top.truncate(limit);
    top
}

#[cfg(test)]
mod tests {
    use super::*;

    fn located(id: i64, latitude: f64, longitude: f64, injured: u32, killed: u32) -> IncidentRecord {
        let mut record = IncidentRecord::new(id);
        record.latitude = Some(latitude);
        record.longitude = Some(longitude);
        record.number_of_persons_injured = injured;
        record.number_of_persons_killed = killed;
        record
    }

    fn group(start: i64, latitude: f64, size: i64, killed: u32) -> Vec<IncidentRecord> {
        (0..size)
            .map(|i| located(start + i, latitude, -73.9, 1, killed))
            .collect()
    }

    #[test]
    fn severity_index_weights_fatalities() {
        assert!((severity_index(5, 3, 2) - 28.0).abs() < f64::EPSILON);
    }

    #[test]
    fn drops_small_clusters_and_orders_by_severity() {
        let mut records = group(0, 40.60, 5, 0);
        records.extend(group(100, 40.70, 6, 1));
        records.extend(group(200, 40.80, 2, 3));

        let summaries = generate_summaries(&records, &SummaryOptions::default());
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].name, "Hotspot 1");
        assert_eq!(summaries[0].id, 1);
        assert_eq!(summaries[0].crash_count, 6);
        assert!((summaries[0].severity_index - 72.0).abs() < f64::EPSILON);

        assert_eq!(summaries[1].name, "Hotspot 2");
        assert_eq!(summaries[1].crash_count, 5);
        assert!((summaries[1].severity_index - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn centroid_and_radius() {
        let records: Vec<IncidentRecord> = [40.700, 40.702, 40.704, 40.706, 40.708]
            .iter()
            .zip(0..)
            .map(|(&lat, id)| located(id, lat, -73.9, 0, 0))
            .collect();

        let summaries = generate_summaries(&records, &SummaryOptions::default());
        assert_eq!(summaries.len(), 1);
        assert!((summaries[0].latitude - 40.704).abs() < 1e-9);
        assert!((summaries[0].radius - 0.004 * METERS_PER_DEGREE).abs() < 1e-3);
    }

    #[test]
    fn caps_summary_count() {
        let mut records = group(0, 40.60, 5, 0);
        records.extend(group(100, 40.70, 5, 0));
        let options = SummaryOptions {
            max_hotspots: 1,
            ..SummaryOptions::default()
        };
        assert_eq!(generate_summaries(&records, &options).len(), 1);
    }

    #[test]
    fn summary_queries() {
        let mut records = group(0, 40.60, 5, 0);
        records.extend(group(100, 40.70, 8, 0));
        records.extend(group(200, 40.80, 6, 1));
        let summaries = generate_summaries(&records, &SummaryOptions::default());

        let big = filter_summaries(&summaries, Some(6), None);
        assert_eq!(big.len(), 2);

        let severe = filter_summaries(&summaries, None, Some(20.0));
        assert_eq!(severe.len(), 1);
        assert_eq!(severe[0].crash_count, 6);

        let top = top_severity(&summaries, 2);
        assert_eq!(top.len(), 2);
        assert!(top[0].severity_index >= top[1].severity_index);
        assert!(top_severity(&summaries, 0).is_empty());
    }

    #[test]
    fn repeated_ids_count_once() {
        let mut records = group(0, 40.70, 5, 0);
        // Same id as the first record, far enough away to shift the centroid.
        records.push(located(0, 40.71, -73.9, 4, 2));

        let summaries = generate_summaries(&records, &SummaryOptions::default());
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].crash_count, 5);
        assert_eq!(summaries[0].total_injured, 5);
        assert_eq!(summaries[0].total_killed, 0);
        assert!((summaries[0].latitude - 40.70).abs() < 1e-9);
        assert!(summaries[0].radius.abs() < 1e-6);
    }

    #[test]
    fn finds_summary_by_id() {
        let mut records = group(0, 40.60, 5, 0);
        records.extend(group(100, 40.70, 6, 1));
        let summaries = generate_summaries(&records, &SummaryOptions::default());

        let found = find(&summaries, 2).unwrap();
        assert_eq!(found.name, "Hotspot 2");
        assert_eq!(found.crash_count, 5);
        assert!(find(&summaries, 3).is_none());
        assert!(find(&summaries, 0).is_none());
    }
}
