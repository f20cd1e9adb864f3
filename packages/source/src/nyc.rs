//! NYC Motor Vehicle Collisions data source.
//!
//! Uses NYC's Socrata Open Data API (Motor Vehicle Collisions - Crashes).
//! Dataset: <https://data.cityofnewyork.us/resource/h9gi-nx95>

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use collision_map_collision_models::{CollisionDetail, FATALITY_SEVERITY_WEIGHT, IncidentRecord};
use serde::Deserialize;

use crate::parsing::{clean, parse_coordinate, parse_count, parse_id, parse_socrata_date};
use crate::socrata::{SocrataConfig, fetch_socrata};
use crate::{CollisionSource, FetchOptions, SourceError};

const API_URL: &str = "https://data.cityofnewyork.us/resource/h9gi-nx95.json";

/// NYC Motor Vehicle Collisions data source.
pub struct NycCollisionSource;

impl NycCollisionSource {
    /// Creates a new NYC collisions source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for NycCollisionSource {
    fn default() -> Self {
        Self::new()
    }
}

/// One row as exported by Socrata. Every column arrives as a string.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Row {
    collision_id: Option<String>,
    crash_date: Option<String>,
    crash_time: Option<String>,
    borough: Option<String>,
    zip_code: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    on_street_name: Option<String>,
    cross_street_name: Option<String>,
    off_street_name: Option<String>,
    number_of_persons_injured: Option<String>,
    number_of_persons_killed: Option<String>,
    number_of_pedestrians_injured: Option<String>,
    number_of_pedestrians_killed: Option<String>,
    number_of_cyclist_injured: Option<String>,
    number_of_cyclist_killed: Option<String>,
    number_of_motorist_injured: Option<String>,
    number_of_motorist_killed: Option<String>,
    contributing_factor_vehicle_1: Option<String>,
    contributing_factor_vehicle_2: Option<String>,
    contributing_factor_vehicle_3: Option<String>,
    contributing_factor_vehicle_4: Option<String>,
    contributing_factor_vehicle_5: Option<String>,
    vehicle_type_code1: Option<String>,
    vehicle_type_code2: Option<String>,
    vehicle_type_code_3: Option<String>,
    vehicle_type_code_4: Option<String>,
    vehicle_type_code_5: Option<String>,
}

impl Row {
    /// Converts the row into a record. Returns `None` when the row has no
    /// usable `collision_id`.
    fn into_record(self) -> Option<IncidentRecord> {
        let collision_id = parse_id(self.collision_id.as_deref())?;

        let injured = parse_count(self.number_of_persons_injured.as_deref()).unwrap_or(0);
        let killed = parse_count(self.number_of_persons_killed.as_deref()).unwrap_or(0);

        Some(IncidentRecord {
            collision_id,
            crash_date: self
                .crash_date
                .as_deref()
                .and_then(parse_socrata_date)
                .map(|d| d.format("%Y-%m-%d").to_string()),
            latitude: parse_coordinate(self.latitude.as_deref()),
            longitude: parse_coordinate(self.longitude.as_deref()),
            borough: clean(self.borough).map(|b| b.to_uppercase()),
            number_of_persons_injured: injured,
            number_of_persons_killed: killed,
            total_severity: Some(
                f64::from(killed).mul_add(FATALITY_SEVERITY_WEIGHT, f64::from(injured)),
            ),
            vehicle_type_code1: clean(self.vehicle_type_code1),
            vehicle_type_code2: clean(self.vehicle_type_code2),
            vehicle_type_code_3: clean(self.vehicle_type_code_3),
            vehicle_type_code_4: clean(self.vehicle_type_code_4),
            vehicle_type_code_5: clean(self.vehicle_type_code_5),
            detail: CollisionDetail {
                crash_time: clean(self.crash_time),
                zip_code: clean(self.zip_code),
                on_street_name: clean(self.on_street_name),
                cross_street_name: clean(self.cross_street_name),
                off_street_name: clean(self.off_street_name),
                number_of_pedestrians_injured: parse_count(
                    self.number_of_pedestrians_injured.as_deref(),
                ),
                number_of_pedestrians_killed: parse_count(
                    self.number_of_pedestrians_killed.as_deref(),
                ),
                number_of_cyclist_injured: parse_count(self.number_of_cyclist_injured.as_deref()),
                number_of_cyclist_killed: parse_count(self.number_of_cyclist_killed.as_deref()),
                number_of_motorist_injured: parse_count(
                    self.number_of_motorist_injured.as_deref(),
                ),
                number_of_motorist_killed: parse_count(self.number_of_motorist_killed.as_deref()),
                contributing_factor_vehicle_1: clean(self.contributing_factor_vehicle_1),
                contributing_factor_vehicle_2: clean(self.contributing_factor_vehicle_2),
                contributing_factor_vehicle_3: clean(self.contributing_factor_vehicle_3),
                contributing_factor_vehicle_4: clean(self.contributing_factor_vehicle_4),
                contributing_factor_vehicle_5: clean(self.contributing_factor_vehicle_5),
            },
        })
    }
}

/// Normalizes a raw Socrata export (a JSON array of rows).
///
/// Rows without a parseable `collision_id` are skipped. Rows without
/// coordinates are kept; the hotspot engine ignores them but they still
/// count toward totals.
///
/// # Errors
///
/// Returns [`SourceError::Json`] if `data` is not an array of objects.
pub fn normalize_rows(data: &str) -> Result<Vec<IncidentRecord>, SourceError> {
    let rows: Vec<Row> = serde_json::from_str(data)?;
    let raw_count = rows.len();
    let records: Vec<IncidentRecord> = rows.into_iter().filter_map(Row::into_record).collect();

    let skipped = raw_count - records.len();
    if skipped > 0 {
        log::warn!("Skipped {skipped} rows without a usable collision_id");
    }
    log::info!(
        "Normalized {} records from {} raw rows",
        records.len(),
        raw_count
    );

    Ok(records)
}

#[async_trait]
impl CollisionSource for NycCollisionSource {
    fn id(&self) -> &'static str {
        "nyc_collisions"
    }

    fn name(&self) -> &'static str {
        "NYC Motor Vehicle Collisions"
    }

    async fn fetch(&self, options: &FetchOptions) -> Result<PathBuf, SourceError> {
        fetch_socrata(
            &SocrataConfig {
                api_url: API_URL,
                date_column: "crash_date",
                required_columns: &["latitude", "longitude"],
                output_filename: "nyc_collisions_raw.json",
                label: "NYC",
                page_size: 50_000,
            },
            options,
        )
        .await
    }

    async fn normalize(&self, raw_path: &Path) -> Result<Vec<IncidentRecord>, SourceError> {
        let data = std::fs::read_to_string(raw_path)?;
        normalize_rows(&data)
    }
}
