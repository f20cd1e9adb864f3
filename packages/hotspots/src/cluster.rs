//! Greedy proximity clustering.
//!
//! A single pass over the filtered records: the first unclaimed record
//! becomes a seed, every unclaimed record within the radius of the seed
//! joins its cluster, and all of them are claimed so no record lands in two
//! clusters. Output depends on input order (earlier records become seeds)
//! and is reproducible for a fixed order.
//!
//! Distance is the planar norm of the `(latitude, longitude)` delta in
//! degrees, with no longitude scaling. That is only a reasonable proxy near
//! the latitude the default radius was tuned for (New York City).

use std::borrow::Borrow;

use collision_map_collision_models::IncidentRecord;
use collision_map_hotspots_models::HotspotCluster;

/// Default cluster radius in degrees (about 1.5 km at New York City's
/// latitude).
pub const DEFAULT_CLUSTER_RADIUS_DEGREES: f64 = 0.015;

/// Tunables for [`cluster_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
    /// Records strictly closer than this to a seed join its cluster.
    pub radius_degrees: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            radius_degrees: DEFAULT_CLUSTER_RADIUS_DEGREES,
        }
    }
}

/// Planar distance between two `(latitude, longitude)` pairs, in degrees.
#[must_use]
pub fn planar_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Clusters `records` with the default radius.
#[must_use]
pub fn cluster<R: Borrow<IncidentRecord>>(records: &[R]) -> Vec<HotspotCluster> {
    cluster_with(records, &ClusterOptions::default())
}

/// Clusters `records` in the given order.
///
/// Records without usable coordinates are skipped: they never seed a
/// cluster and never join one. Every other record ends up in exactly one
/// cluster.
#[must_use]
pub fn cluster_with<R: Borrow<IncidentRecord>>(
    records: &[R],
    options: &ClusterOptions,
) -> Vec<HotspotCluster> {
    let located: Vec<(&IncidentRecord, (f64, f64))> = records
        .iter()
        .map(<R as Borrow<IncidentRecord>>::borrow)
        .filter_map(|record| record.coordinates().map(|coords| (record, coords)))
        .collect();

    let skipped = records.len() - located.len();
    if skipped > 0 {
        log::debug!("Skipping {skipped} records without usable coordinates");
    }

    // Indexed by position in `located`.
    let mut claimed = vec![false; located.len()];
    let mut clusters = Vec::new();

    for seed_idx in 0..located.len() {
        if claimed[seed_idx] {
            continue;
        }
        claimed[seed_idx] = true;

        let (seed, seed_coords) = located[seed_idx];
        let mut members = vec![seed];

        for (idx, &(record, coords)) in located.iter().enumerate() {
            if claimed[idx] {
                continue;
            }
            if planar_distance(seed_coords, coords) < options.radius_degrees {
                claimed[idx] = true;
                members.push(record);
            }
        }

        clusters.push(aggregate(seed, seed_coords, &members));
    }

    log::debug!(
        "Grouped {} located records into {} clusters",
        located.len(),
        clusters.len()
    );

    clusters
}

#[allow(clippy::cast_precision_loss)]
fn aggregate(
    seed: &IncidentRecord,
    (latitude, longitude): (f64, f64),
    members: &[&IncidentRecord],
) -> HotspotCluster {
    let total_injured = members
        .iter()
        .map(|r| u64::from(r.number_of_persons_injured))
        .sum();
    let total_killed = members
        .iter()
        .map(|r| u64::from(r.number_of_persons_killed))
        .sum();
    let severity_sum: f64 = members.iter().map(|r| r.severity_score()).sum();

    HotspotCluster {
        latitude,
        longitude,
        borough: seed.borough.clone(),
        member_ids: members.iter().map(|r| r.collision_id).collect(),
        crash_count: members.len() as u64,
        total_injured,
        total_killed,
        // `members` always holds at least the seed.
        mean_severity: severity_sum / members.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn located(id: i64, latitude: f64, longitude: f64) -> IncidentRecord {
        let mut record = IncidentRecord::new(id);
        record.latitude = Some(latitude);
        record.longitude = Some(longitude);
        record.total_severity = Some(0.0);
        record
    }

    fn with_casualties(
        mut record: IncidentRecord,
        injured: u32,
        killed: u32,
        severity: f64,
    ) -> IncidentRecord {
        record.number_of_persons_injured = injured;
        record.number_of_persons_killed = killed;
        record.total_severity = Some(severity);
        record
    }

    #[test]
    fn empty_input_yields_no_clusters() {
        let records: Vec<IncidentRecord> = Vec::new();
        assert!(cluster(&records).is_empty());
    }

    #[test]
    fn isolated_record_is_a_singleton() {
        let records = vec![located(1, 40.70, -73.90), located(2, 40.80, -73.80)];
        let clusters = cluster(&records);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].member_ids, vec![1]);
        assert_eq!(clusters[1].member_ids, vec![2]);
    }

    #[test]
    fn radius_comparison_is_strict() {
        // Exact binary fractions so the delta is exactly the radius.
        let options = ClusterOptions {
            radius_degrees: 0.015_625,
        };
        let records = vec![located(1, 40.5, -73.5), located(2, 40.515_625, -73.5)];
        assert_eq!(cluster_with(&records, &options).len(), 2);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn threshold_boundary_at_default_radius() {
        // 2r - r is exact in floating point, so these sit exactly r apart.
        let r = DEFAULT_CLUSTER_RADIUS_DEGREES;
        let apart = vec![located(1, 40.7, r), located(2, 40.7, r * 2.0)];
        assert_eq!(planar_distance((40.7, r), (40.7, r * 2.0)), r);
        assert_eq!(cluster(&apart).len(), 2);

        let together = vec![located(1, 40.7, -73.9), located(2, 40.7149, -73.9)];
        let clusters = cluster(&together);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].member_ids, vec![1, 2]);
    }

    #[test]
    fn aggregates_are_exact() {
        let records = vec![
            with_casualties(located(1, 40.700, -73.900), 1, 0, 1.0),
            with_casualties(located(2, 40.701, -73.901), 2, 1, 2.0),
            with_casualties(located(3, 40.702, -73.902), 0, 2, 3.0),
        ];
        let clusters = cluster(&records);
        assert_eq!(clusters.len(), 1);
        let c = &clusters[0];
        assert_eq!(c.crash_count, 3);
        assert_eq!(c.total_injured, 3);
        assert_eq!(c.total_killed, 3);
        assert!((c.mean_severity - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn representative_is_seed_not_centroid() {
        let mut seed = located(1, 40.700, -73.900);
        seed.borough = Some("QUEENS".to_string());
        let mut other = located(2, 40.710, -73.900);
        other.borough = Some("BROOKLYN".to_string());

        let clusters = cluster(&[seed, other]);
        assert_eq!(clusters.len(), 1);
        assert!((clusters[0].latitude - 40.700).abs() < f64::EPSILON);
        assert!((clusters[0].longitude - -73.900).abs() < f64::EPSILON);
        assert_eq!(clusters[0].borough.as_deref(), Some("QUEENS"));
    }

    #[test]
    fn claimed_records_are_not_reconsidered() {
        // 2 is within reach of 1; 3 is within reach of 2 but not of 1.
        let records = vec![
            located(1, 40.700, -73.9),
            located(2, 40.710, -73.9),
            located(3, 40.720, -73.9),
        ];
        let clusters = cluster(&records);
        let groups: Vec<Vec<i64>> = clusters.iter().map(|c| c.member_ids.clone()).collect();
        assert_eq!(groups, vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn output_depends_on_input_order() {
        let a = located(1, 40.700, -73.9);
        let b = located(2, 40.710, -73.9);
        let c = located(3, 40.720, -73.9);

        let forward = cluster(&[a.clone(), b.clone(), c.clone()]);
        let reversed = cluster(&[c, b, a]);
        assert_eq!(forward[0].member_ids, vec![1, 2]);
        assert_eq!(reversed[0].member_ids, vec![3, 2]);
    }

    #[test]
    fn every_located_record_is_in_exactly_one_cluster() {
        let mut records = Vec::new();
        for i in 0..120_i32 {
            let lat = 40.6 + f64::from(i % 11) * 0.004;
            let lon = -74.0 + f64::from(i % 7) * 0.006;
            records.push(located(i64::from(i), lat, lon));
        }
        records.push(IncidentRecord::new(1_000));

        let clusters = cluster(&records);
        let mut seen = BTreeSet::new();
        let mut total = 0;
        for c in &clusters {
            assert_eq!(c.member_ids.len() as u64, c.crash_count);
            for id in &c.member_ids {
                assert!(seen.insert(*id), "collision {id} assigned twice");
                total += 1;
            }
        }
        assert_eq!(total, 120);
        assert!(!seen.contains(&1_000));
    }

    #[test]
    fn clustering_is_idempotent() {
        let records: Vec<IncidentRecord> = (0..50_i32)
            .map(|i| located(i64::from(i), 40.6 + f64::from(i) * 0.003, -73.9))
            .collect();
        assert_eq!(cluster(&records), cluster(&records));
    }

    #[test]
    fn unlocated_records_are_skipped() {
        let mut no_coords = IncidentRecord::new(1);
        no_coords.latitude = Some(40.7);
        let records = vec![no_coords, located(2, 40.7, -73.9)];
        let clusters = cluster(&records);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].member_ids, vec![2]);
    }
}
