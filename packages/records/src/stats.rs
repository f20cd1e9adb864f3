//! Aggregate totals over a filtered record set.
//!
//! These reductions feed the summary cards and are deliberately separate
//! from hotspot clustering: every record in the filtered set counts here,
//! including records without coordinates and records whose cluster is too
//! small to be displayed.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use collision_map_collision_models::{BoroughStats, CrashStats, IncidentRecord};

/// Computes crash, injury, and fatality totals plus a per-borough
/// breakdown.
///
/// The breakdown is ordered by crash count descending, ties broken by
/// borough name. Records without a borough are grouped under `""`.
#[must_use]
pub fn compute_stats<R: Borrow<IncidentRecord>>(records: &[R]) -> CrashStats {
    let mut stats = CrashStats::default();
    let mut by_borough: BTreeMap<&str, BoroughStats> = BTreeMap::new();

    for record in records {
        let record = <R as Borrow<IncidentRecord>>::borrow(record);
        let injured = u64::from(record.number_of_persons_injured);
        let killed = u64::from(record.number_of_persons_killed);

        stats.total_crashes += 1;
        stats.total_injured += injured;
        stats.total_killed += killed;

        let name = record.borough.as_deref().unwrap_or_default();
        let entry = by_borough.entry(name).or_insert_with(|| BoroughStats {
            borough: name.to_string(),
            crash_count: 0,
            injured_count: 0,
            killed_count: 0,
        });
        entry.crash_count += 1;
        entry.injured_count += injured;
        entry.killed_count += killed;
    }

    let mut breakdown: Vec<BoroughStats> = by_borough.into_values().collect();
    // BTreeMap order already sorts by name; a stable sort keeps it for ties.
    breakdown.sort_by(|a, b| b.crash_count.cmp(&a.crash_count));
    stats.borough_breakdown = breakdown;

    stats
}
