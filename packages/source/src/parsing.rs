//! Parsing helpers for Socrata rows.
//!
//! Socrata's JSON export delivers every column as a string; these helpers
//! turn those strings into typed values and treat anything unparseable as
//! missing.

use chrono::{NaiveDate, NaiveDateTime};

/// Trims `s` and returns it if anything is left.
#[must_use]
pub fn clean(s: Option<String>) -> Option<String> {
    let s = s?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses an integer identifier.
#[must_use]
pub fn parse_id(s: Option<&str>) -> Option<i64> {
    s?.trim().parse().ok()
}

/// Parses a non-negative person count. Missing, negative, or fractional
/// values yield `None`.
#[must_use]
pub fn parse_count(s: Option<&str>) -> Option<u32> {
    s?.trim().parse().ok()
}

/// Parses a coordinate. Returns `None` if missing, unparseable,
/// non-finite, or exactly zero (the upstream placeholder for "unknown").
#[must_use]
pub fn parse_coordinate(s: Option<&str>) -> Option<f64> {
    let value: f64 = s?.trim().parse().ok()?;
    if !value.is_finite() || value == 0.0 {
        return None;
    }
    Some(value)
}

/// Parses a Socrata floating timestamp (ISO 8601, optional fractional
/// seconds, no offset) down to its calendar date. Bare `YYYY-MM-DD` is
/// accepted too.
#[must_use]
pub fn parse_socrata_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
