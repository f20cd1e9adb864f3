#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Collision record, borough, and filter configuration types.
//!
//! This crate defines the canonical shape of a traffic-collision record as
//! delivered by the upstream data service, the set of boroughs records are
//! tagged with, and the filter configuration built by the filter form. Field
//! names on the wire match the NYC Open Data "Motor Vehicle Collisions -
//! Crashes" dataset so snapshots can be exchanged without translation.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Weight applied to each fatality when deriving a severity score from
/// casualty counts.
pub const FATALITY_SEVERITY_WEIGHT: f64 = 10.0;

/// One of the five New York City boroughs.
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
pub enum Borough {
    Manhattan,
    Brooklyn,
    Queens,
    Bronx,
    #[serde(rename = "STATEN ISLAND")]
    #[strum(serialize = "STATEN ISLAND")]
    StatenIsland,
}

impl Borough {
    /// Returns all variants of this enum, in the order the filter form
    /// lists them.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Manhattan,
            Self::Brooklyn,
            Self::Queens,
            Self::Bronx,
            Self::StatenIsland,
        ]
    }
}

/// Supplementary collision fields shown on the detail view only.
///
/// None of these participate in filtering or clustering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crash_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_street_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_street_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_street_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_pedestrians_injured: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_pedestrians_killed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_cyclist_injured: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_cyclist_killed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_motorist_injured: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_motorist_killed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributing_factor_vehicle_1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributing_factor_vehicle_2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributing_factor_vehicle_3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributing_factor_vehicle_4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributing_factor_vehicle_5: Option<String>,
}

/// A single traffic collision as delivered by the upstream data service.
///
/// Records are immutable once loaded. Every field other than
/// `collision_id` may be missing or malformed; consumers treat such fields
/// as "does not match" rather than as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Upstream collision identifier, unique within a record set.
    pub collision_id: i64,
    /// Raw occurrence date (`YYYY-MM-DD` or an ISO 8601 date-time).
    #[serde(default)]
    pub crash_date: Option<String>,
    /// Latitude (WGS84). `None` if the upstream row lacks coordinates.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude (WGS84). `None` if the upstream row lacks coordinates.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Borough name exactly as delivered (e.g. `"BROOKLYN"`).
    #[serde(default)]
    pub borough: Option<String>,
    #[serde(default)]
    pub number_of_persons_injured: u32,
    #[serde(default)]
    pub number_of_persons_killed: u32,
    /// Precomputed severity score. Derived from casualty counts when absent.
    #[serde(default)]
    pub total_severity: Option<f64>,
    #[serde(default)]
    pub vehicle_type_code1: Option<String>,
    #[serde(default)]
    pub vehicle_type_code2: Option<String>,
    #[serde(default)]
    pub vehicle_type_code_3: Option<String>,
    #[serde(default)]
    pub vehicle_type_code_4: Option<String>,
    #[serde(default)]
    pub vehicle_type_code_5: Option<String>,
    #[serde(flatten)]
    pub detail: CollisionDetail,
}

impl IncidentRecord {
    /// Creates a record with only an identifier; every other field is
    /// empty.
    #[must_use]
    pub fn new(collision_id: i64) -> Self {
        Self {
            collision_id,
            crash_date: None,
            latitude: None,
            longitude: None,
            borough: None,
            number_of_persons_injured: 0,
            number_of_persons_killed: 0,
            total_severity: None,
            vehicle_type_code1: None,
            vehicle_type_code2: None,
            vehicle_type_code_3: None,
            vehicle_type_code_4: None,
            vehicle_type_code_5: None,
            detail: CollisionDetail::default(),
        }
    }

    /// Returns `(latitude, longitude)` when both are present and usable.
    ///
    /// Rejects non-finite values, values outside the WGS84 range, and the
    /// `0.0` placeholder upstream uses for unknown locations.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let latitude = self.latitude?;
        let longitude = self.longitude?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if latitude == 0.0 || longitude == 0.0 {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some((latitude, longitude))
    }

    /// Returns the occurrence date, or `None` if it is missing or
    /// unparseable.
    #[must_use]
    pub fn occurred_on(&self) -> Option<NaiveDate> {
        self.crash_date.as_deref().and_then(parse_calendar_date)
    }

    /// Returns the total severity score.
    ///
    /// Falls back to `injured + 10 * killed` when the record carries no
    /// precomputed score.
    #[must_use]
    pub fn severity_score(&self) -> f64 {
        self.total_severity.unwrap_or_else(|| {
            f64::from(self.number_of_persons_injured)
                + f64::from(self.number_of_persons_killed) * FATALITY_SEVERITY_WEIGHT
        })
    }

    /// Iterates the non-empty vehicle type codes in slot order.
    pub fn vehicle_types(&self) -> impl Iterator<Item = &str> {
        [
            &self.vehicle_type_code1,
            &self.vehicle_type_code2,
            &self.vehicle_type_code_3,
            &self.vehicle_type_code_4,
            &self.vehicle_type_code_5,
        ]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .filter(|v| !v.trim().is_empty())
    }
}

/// Parses a calendar date from either a bare `YYYY-MM-DD` string or an ISO
/// 8601 date-time (with or without fractional seconds and offset).
///
/// Any time component is discarded.
#[must_use]
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.date());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.date());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Filter options selected in the filter form.
///
/// Every option is optional. An absent or blank option matches every
/// record; all present options must hold for a record to be included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Exact, case-sensitive borough name.
    #[serde(default)]
    pub borough: Option<String>,
    /// Inclusive lower date bound.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive upper date bound.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Lower bound on the total severity score, as entered.
    #[serde(default)]
    pub min_severity: Option<String>,
    /// Case-insensitive substring matched against the vehicle type codes.
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(
        default,
        alias = "showFatalities",
        deserialize_with = "empty_as_none"
    )]
    pub show_fatalities_only: Option<bool>,
    #[serde(default, alias = "showInjuries", deserialize_with = "empty_as_none")]
    pub show_injuries_only: Option<bool>,
}

impl FilterConfig {
    /// Returns `true` if no option would restrict the record set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        non_blank(self.borough.as_deref()).is_none()
            && non_blank(self.start_date.as_deref()).is_none()
            && non_blank(self.end_date.as_deref()).is_none()
            && non_blank(self.min_severity.as_deref()).is_none()
            && non_blank(self.vehicle_type.as_deref()).is_none()
            && self.show_fatalities_only != Some(true)
            && self.show_injuries_only != Some(true)
    }
}

/// Returns the trimmed value if it is present and not blank.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Deserializes an optional scalar that may arrive as text.
///
/// Query strings deliver every value as a string, so `?minCrashes=` yields
/// an empty string rather than a missing field. Empty or blank text and
/// `null` become `None`; other text is parsed with [`FromStr`]. Native JSON
/// booleans and numbers are accepted as well.
///
/// Use together with `#[serde(default)]` so absent fields stay `None`.
///
/// # Errors
///
/// Returns a deserialization error if a non-blank value does not parse as
/// `T`.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    deserializer.deserialize_any(EmptyAsNone(PhantomData))
}

struct EmptyAsNone<T>(PhantomData<T>);

impl<T> EmptyAsNone<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn parse<E: de::Error>(value: &str) -> Result<Option<T>, E> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        value.parse().map(Some).map_err(E::custom)
    }
}

impl<'de, T> Visitor<'de> for EmptyAsNone<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    type Value = Option<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, its text form, or an empty string")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Self::parse(value)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Self::parse(&value.to_string())
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Self::parse(&value.to_string())
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Self::parse(&value.to_string())
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Self::parse(&value.to_string())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

/// Crash, injury, and fatality counts for one borough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoroughStats {
    /// Borough name as delivered. Empty for records without a borough.
    pub borough: String,
    pub crash_count: u64,
    pub injured_count: u64,
    pub killed_count: u64,
}

/// Aggregate totals over a (filtered) record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashStats {
    pub total_crashes: u64,
    pub total_injured: u64,
    pub total_killed: u64,
    /// Per-borough breakdown, most crashes first.
    pub borough_breakdown: Vec<BoroughStats>,
}
