//! The full, unfiltered collision record set.
//!
//! Loaded once at startup and shared read-only afterwards. Cloning a
//! [`RecordStore`] is cheap; clones share the same records.

use std::collections::BTreeMap;
use std::sync::Arc;

use collision_map_collision_models::{FilterConfig, IncidentRecord};

use crate::RecordsError;
use crate::filter;

/// Approximate meters per degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Immutable, ordered collection of incident records.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Arc<[IncidentRecord]>,
    /// `collision_id` -> position in `records`
    index: Arc<BTreeMap<i64, usize>>,
}

impl RecordStore {
    /// Builds a store from records in delivery order.
    ///
    /// Records whose `collision_id` was already seen are dropped so
    /// identifiers stay unique within the store; the first occurrence wins.
    #[must_use]
    pub fn new(records: Vec<IncidentRecord>) -> Self {
        let raw_count = records.len();
        let mut index = BTreeMap::new();
        let mut unique = Vec::with_capacity(raw_count);

        for record in records {
            if index.contains_key(&record.collision_id) {
                log::warn!(
                    "Dropping duplicate collision_id {} from record set",
                    record.collision_id
                );
                continue;
            }
            index.insert(record.collision_id, unique.len());
            unique.push(record);
        }

        log::info!(
            "Record store holds {} records ({} duplicates dropped)",
            unique.len(),
            raw_count - unique.len()
        );

        Self {
            records: unique.into(),
            index: Arc::new(index),
        }
    }

    /// All records, in delivery order.
    #[must_use]
    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by its collision identifier.
    #[must_use]
    pub fn get(&self, collision_id: i64) -> Option<&IncidentRecord> {
        self.index
            .get(&collision_id)
            .and_then(|&idx| self.records.get(idx))
    }

    /// Returns the records included by `config`, in delivery order.
    #[must_use]
    pub fn filtered(&self, config: &FilterConfig) -> Vec<&IncidentRecord> {
        filter::apply(self.records(), config)
    }

    /// Returns records whose coordinates fall within a box of `radius_m`
    /// meters around `(latitude, longitude)`.
    ///
    /// The box is sized with a flat-earth approximation: one degree of
    /// latitude is [`METERS_PER_DEGREE`], and a degree of longitude shrinks
    /// with the cosine of the query latitude. Records without usable
    /// coordinates never match.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::InvalidLocation`] if the coordinates are out
    /// of range or the radius is not a positive, finite number.
    pub fn search_by_location(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
    ) -> Result<Vec<&IncidentRecord>, RecordsError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(RecordsError::InvalidLocation {
                message: format!("latitude {latitude} out of range"),
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(RecordsError::InvalidLocation {
                message: format!("longitude {longitude} out of range"),
            });
        }
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(RecordsError::InvalidLocation {
                message: format!("radius {radius_m} must be a positive number of meters"),
            });
        }

        let lat_delta = radius_m / METERS_PER_DEGREE;
        let lon_scale = latitude.to_radians().cos().abs().max(f64::EPSILON);
        let lon_delta = radius_m / (METERS_PER_DEGREE * lon_scale);

        Ok(self
            .records
            .iter()
            .filter(|record| {
                record.coordinates().is_some_and(|(lat, lon)| {
                    (lat - latitude).abs() <= lat_delta && (lon - longitude).abs() <= lon_delta
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn located(id: i64, latitude: f64, longitude: f64) -> IncidentRecord {
        let mut record = IncidentRecord::new(id);
        record.latitude = Some(latitude);
        record.longitude = Some(longitude);
        record
    }

    #[test]
    fn drops_duplicate_ids_keeping_first() {
        let mut second = located(1, 40.0, -73.0);
        second.borough = Some("QUEENS".to_string());
        let store = RecordStore::new(vec![located(1, 40.7, -73.9), second, located(2, 40.6, -73.8)]);

        assert_eq!(store.len(), 2);
        assert!(store.get(1).unwrap().borough.is_none());
        assert_eq!(store.get(2).unwrap().collision_id, 2);
        assert!(store.get(3).is_none());
    }

    #[test]
    fn empty_store() {
        let store = RecordStore::default();
        assert!(store.is_empty());
        assert!(store.filtered(&FilterConfig::default()).is_empty());
    }

    #[test]
    fn filtered_delegates_to_evaluator() {
        let mut brooklyn = located(1, 40.65, -73.95);
        brooklyn.borough = Some("BROOKLYN".to_string());
        let store = RecordStore::new(vec![brooklyn, located(2, 40.75, -73.98)]);

        let config = FilterConfig {
            borough: Some("BROOKLYN".to_string()),
            ..FilterConfig::default()
        };
        let ids: Vec<i64> = store
            .filtered(&config)
            .iter()
            .map(|r| r.collision_id)
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn location_search_uses_radius_box() {
        let store = RecordStore::new(vec![
            located(1, 40.7000, -73.9000),
            located(2, 40.7050, -73.9000),
            located(3, 40.7200, -73.9000),
            IncidentRecord::new(4),
        ]);

        let ids: Vec<i64> = store
            .search_by_location(40.7, -73.9, 1000.0)
            .unwrap()
            .iter()
            .map(|r| r.collision_id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn location_search_rejects_bad_input() {
        let store = RecordStore::default();
        assert!(store.search_by_location(95.0, -73.9, 100.0).is_err());
        assert!(store.search_by_location(40.7, -200.0, 100.0).is_err());
        assert!(store.search_by_location(40.7, -73.9, 0.0).is_err());
        assert!(store.search_by_location(40.7, -73.9, f64::NAN).is_err());
    }
}
