#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the collision map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the snapshot record types to allow independent evolution of the API
//! contract.

use chrono::{DateTime, Utc};
use collision_map_collision_models::{IncidentRecord, empty_as_none};
use collision_map_hotspots_models::HotspotSummary;
use serde::{Deserialize, Serialize};

/// Default search radius in meters for `/api/crashes/search`.
pub const DEFAULT_SEARCH_RADIUS_METERS: f64 = 1000.0;

/// Default page size for `/api/crashes`.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Default number of hotspots returned by `/api/hotspots/top`.
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// A collision as returned in list responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrash {
    pub collision_id: i64,
    pub crash_date: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub borough: Option<String>,
    pub persons_injured: u32,
    pub persons_killed: u32,
    pub total_severity: f64,
    /// Non-empty vehicle type codes in slot order.
    pub vehicle_types: Vec<String>,
}

impl From<&IncidentRecord> for ApiCrash {
    fn from(record: &IncidentRecord) -> Self {
        Self {
            collision_id: record.collision_id,
            crash_date: record.crash_date.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            borough: record.borough.clone(),
            persons_injured: record.number_of_persons_injured,
            persons_killed: record.number_of_persons_killed,
            total_severity: record.severity_score(),
            vehicle_types: record.vehicle_types().map(str::to_string).collect(),
        }
    }
}

/// Full collision detail for `/api/crashes/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrashDetail {
    #[serde(flatten)]
    pub crash: ApiCrash,
    pub crash_time: Option<String>,
    pub zip_code: Option<String>,
    pub on_street_name: Option<String>,
    pub cross_street_name: Option<String>,
    pub off_street_name: Option<String>,
    pub pedestrians_injured: Option<u32>,
    pub pedestrians_killed: Option<u32>,
    pub cyclists_injured: Option<u32>,
    pub cyclists_killed: Option<u32>,
    pub motorists_injured: Option<u32>,
    pub motorists_killed: Option<u32>,
    /// Non-empty contributing factors in vehicle order.
    pub contributing_factors: Vec<String>,
}

impl From<&IncidentRecord> for ApiCrashDetail {
    fn from(record: &IncidentRecord) -> Self {
        let detail = &record.detail;
        let contributing_factors = [
            &detail.contributing_factor_vehicle_1,
            &detail.contributing_factor_vehicle_2,
            &detail.contributing_factor_vehicle_3,
            &detail.contributing_factor_vehicle_4,
            &detail.contributing_factor_vehicle_5,
        ]
        .into_iter()
        .filter_map(|f| f.as_deref())
        .filter(|f| !f.trim().is_empty())
        .map(str::to_string)
        .collect();

        Self {
            crash: ApiCrash::from(record),
            crash_time: detail.crash_time.clone(),
            zip_code: detail.zip_code.clone(),
            on_street_name: detail.on_street_name.clone(),
            cross_street_name: detail.cross_street_name.clone(),
            off_street_name: detail.off_street_name.clone(),
            pedestrians_injured: detail.number_of_pedestrians_injured,
            pedestrians_killed: detail.number_of_pedestrians_killed,
            cyclists_injured: detail.number_of_cyclist_injured,
            cyclists_killed: detail.number_of_cyclist_killed,
            motorists_injured: detail.number_of_motorist_injured,
            motorists_killed: detail.number_of_motorist_killed,
            contributing_factors,
        }
    }
}

/// One page of filtered collisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrashPage {
    /// Number of records matching the filter, before paging.
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
    pub crashes: Vec<ApiCrash>,
}

/// Paging parameters for `/api/crashes`. Read alongside the filter
/// parameters from the same query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<usize>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub offset: Option<usize>,
}

/// Query parameters for `/api/crashes/search`.
///
/// Kept as raw strings so missing and malformed values can be reported
/// with the same error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationSearchParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    /// Radius in meters.
    pub radius: Option<String>,
}

/// Result of a location search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLocationResults {
    pub count: u64,
    pub results: Vec<ApiCrash>,
}

/// A precomputed hotspot as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHotspot {
    pub id: u32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters.
    pub radius: f64,
    pub crash_count: u64,
    pub total_injured: u64,
    pub total_killed: u64,
    pub severity_index: f64,
}

impl From<&HotspotSummary> for ApiHotspot {
    fn from(summary: &HotspotSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name.clone(),
            latitude: summary.latitude,
            longitude: summary.longitude,
            radius: summary.radius,
            crash_count: summary.crash_count,
            total_injured: summary.total_injured,
            total_killed: summary.total_killed,
            severity_index: summary.severity_index,
        }
    }
}

/// A single precomputed hotspot with its generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHotspotDetail {
    #[serde(flatten)]
    pub hotspot: ApiHotspot,
    pub generated_at: Option<DateTime<Utc>>,
}

impl From<&HotspotSummary> for ApiHotspotDetail {
    fn from(summary: &HotspotSummary) -> Self {
        Self {
            hotspot: ApiHotspot::from(summary),
            generated_at: summary.generated_at,
        }
    }
}

/// Query parameters for `/api/hotspots`.
///
/// Blank values (`?minCrashes=`) are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotQueryParams {
    #[serde(default, alias = "min_crashes", deserialize_with = "empty_as_none")]
    pub min_crashes: Option<u64>,
    #[serde(default, alias = "min_severity", deserialize_with = "empty_as_none")]
    pub min_severity: Option<f64>,
}

/// Query parameters for `/api/hotspots/top`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopQueryParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<usize>,
}

/// Error body returned with 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Number of records loaded at startup.
    pub record_count: u64,
    /// Number of precomputed hotspots loaded at startup.
    pub hotspot_count: u64,
}

#[cfg(test)]
mod tests {
    use collision_map_collision_models::CollisionDetail;

    use super::*;

    fn record() -> IncidentRecord {
        let mut record = IncidentRecord::new(42);
        record.crash_date = Some("2024-05-01".to_string());
        record.borough = Some("BRONX".to_string());
        record.number_of_persons_injured = 1;
        record.number_of_persons_killed = 1;
        record.vehicle_type_code1 = Some("Sedan".to_string());
        record.vehicle_type_code_3 = Some("Bike".to_string());
        record.detail = CollisionDetail {
            contributing_factor_vehicle_1: Some("Driver Inattention/Distraction".to_string()),
            contributing_factor_vehicle_2: Some(" ".to_string()),
            contributing_factor_vehicle_3: Some("Unsafe Speed".to_string()),
            ..CollisionDetail::default()
        };
        record
    }

    #[test]
    fn crash_uses_derived_severity() {
        let crash = ApiCrash::from(&record());
        assert!((crash.total_severity - 11.0).abs() < f64::EPSILON);
        assert_eq!(crash.vehicle_types, vec!["Sedan", "Bike"]);
    }

    #[test]
    fn detail_collects_factors_and_flattens() {
        let detail = ApiCrashDetail::from(&record());
        assert_eq!(
            detail.contributing_factors,
            vec!["Driver Inattention/Distraction", "Unsafe Speed"]
        );

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["collisionId"], 42);
        assert_eq!(value["personsKilled"], 1);
        assert!(value["zipCode"].is_null());
    }

    #[test]
    fn hotspot_serializes_camel_case() {
        let summary = HotspotSummary {
            id: 1,
            name: "Hotspot 1".to_string(),
            latitude: 40.7,
            longitude: -73.9,
            radius: 250.0,
            crash_count: 12,
            total_injured: 4,
            total_killed: 1,
            severity_index: 26.0,
            generated_at: None,
        };
        let value = serde_json::to_value(ApiHotspot::from(&summary)).unwrap();
        assert_eq!(value["crashCount"], 12);
        assert_eq!(value["severityIndex"], 26.0);
    }

    #[test]
    fn hotspot_detail_carries_generation_time() {
        let summary = HotspotSummary {
            id: 3,
            name: "Hotspot 3".to_string(),
            latitude: 40.6,
            longitude: -73.95,
            radius: 80.0,
            crash_count: 5,
            total_injured: 2,
            total_killed: 0,
            severity_index: 7.0,
            generated_at: "2024-06-01T12:00:00Z".parse().ok(),
        };
        let value = serde_json::to_value(ApiHotspotDetail::from(&summary)).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["crashCount"], 5);
        assert_eq!(value["generatedAt"], "2024-06-01T12:00:00Z");
    }

    #[test]
    fn blank_query_numbers_are_absent() {
        let params: HotspotQueryParams =
            serde_json::from_str(r#"{"minCrashes": "", "min_severity": " "}"#).unwrap();
        assert_eq!(params.min_crashes, None);
        assert_eq!(params.min_severity, None);

        let params: HotspotQueryParams =
            serde_json::from_str(r#"{"minCrashes": "6", "minSeverity": 12.5}"#).unwrap();
        assert_eq!(params.min_crashes, Some(6));
        assert!(params.min_severity.is_some_and(|s| (s - 12.5).abs() < f64::EPSILON));

        let page: PageParams = serde_json::from_str(r#"{"limit": "", "offset": "4"}"#).unwrap();
        assert_eq!(page.limit, None);
        assert_eq!(page.offset, Some(4));
    }
}
