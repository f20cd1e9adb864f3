//! Filter predicate evaluation.
//!
//! A [`FilterConfig`] is compiled once into a [`CompiledFilter`] so bounds
//! are parsed a single time per filter change rather than once per record.
//! Evaluation is total: a record whose fields are missing or malformed
//! simply fails the clause that needed them.

use std::borrow::Borrow;
use std::cmp::Ordering;

use chrono::NaiveDate;
use collision_map_collision_models::{
    FilterConfig, IncidentRecord, non_blank, parse_calendar_date,
};

/// A configured date bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateBound {
    Valid(NaiveDate),
    /// The configured bound could not be parsed. No record satisfies it.
    Malformed,
}

impl DateBound {
    fn parse(value: Option<&str>) -> Option<Self> {
        let value = non_blank(value)?;
        Some(parse_calendar_date(value).map_or(Self::Malformed, Self::Valid))
    }
}

/// A [`FilterConfig`] with its textual options parsed.
#[derive(Debug, Clone)]
pub struct CompiledFilter<'a> {
    borough: Option<&'a str>,
    start: Option<DateBound>,
    end: Option<DateBound>,
    min_severity: Option<f64>,
    vehicle_type: Option<String>,
    fatalities_only: bool,
    injuries_only: bool,
}

impl<'a> CompiledFilter<'a> {
    /// Parses every option of `config`.
    ///
    /// A `minSeverity` that is not a finite number disables the severity
    /// clause.
    #[must_use]
    pub fn new(config: &'a FilterConfig) -> Self {
        let min_severity = non_blank(config.min_severity.as_deref()).and_then(|v| {
            let parsed = v.parse::<f64>().ok().filter(|n| n.is_finite());
            if parsed.is_none() {
                log::debug!("Ignoring non-numeric minSeverity {v:?}");
            }
            parsed
        });

        Self {
            borough: non_blank(config.borough.as_deref()),
            start: DateBound::parse(config.start_date.as_deref()),
            end: DateBound::parse(config.end_date.as_deref()),
            min_severity,
            vehicle_type: non_blank(config.vehicle_type.as_deref()).map(str::to_lowercase),
            fatalities_only: config.show_fatalities_only.unwrap_or(false),
            injuries_only: config.show_injuries_only.unwrap_or(false),
        }
    }

    /// Returns `true` if `record` satisfies every configured clause.
    #[must_use]
    pub fn matches(&self, record: &IncidentRecord) -> bool {
        if let Some(borough) = self.borough
            && record.borough.as_deref() != Some(borough)
        {
            return false;
        }

        if (self.start.is_some() || self.end.is_some()) && !self.matches_dates(record) {
            return false;
        }

        if let Some(min) = self.min_severity
            && matches!(
                record.severity_score().partial_cmp(&min),
                None | Some(Ordering::Less)
            )
        {
            return false;
        }

        if let Some(query) = &self.vehicle_type
            && !record
                .vehicle_types()
                .any(|vt| vt.to_lowercase().contains(query.as_str()))
        {
            return false;
        }

        if self.fatalities_only && record.number_of_persons_killed == 0 {
            return false;
        }

        if self.injuries_only && record.number_of_persons_injured == 0 {
            return false;
        }

        true
    }

    fn matches_dates(&self, record: &IncidentRecord) -> bool {
        let Some(date) = record.occurred_on() else {
            return false;
        };

        match self.start {
            Some(DateBound::Malformed) => return false,
            Some(DateBound::Valid(start)) if date < start => return false,
            _ => {}
        }

        match self.end {
            Some(DateBound::Malformed) => false,
            Some(DateBound::Valid(end)) => date <= end,
            None => true,
        }
    }
}

/// Returns `true` if `record` is included by `config`.
#[must_use]
pub fn matches(record: &IncidentRecord, config: &FilterConfig) -> bool {
    CompiledFilter::new(config).matches(record)
}

/// Returns the records included by `config`, preserving input order.
#[must_use]
pub fn apply<'r, R: Borrow<IncidentRecord>>(
    records: &'r [R],
    config: &FilterConfig,
) -> Vec<&'r IncidentRecord> {
    let filter = CompiledFilter::new(config);
    records
        .iter()
        .map(<R as Borrow<IncidentRecord>>::borrow)
        .filter(|record| filter.matches(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, borough: &str, severity: f64) -> IncidentRecord {
        let mut record = IncidentRecord::new(id);
        record.borough = Some(borough.to_string());
        record.total_severity = Some(severity);
        record.crash_date = Some("2021-06-15T00:00:00.000".to_string());
        record
    }

    fn config_with(f: impl FnOnce(&mut FilterConfig)) -> FilterConfig {
        let mut config = FilterConfig::default();
        f(&mut config);
        config
    }

    #[test]
    fn empty_config_matches_everything() {
        let config = FilterConfig {
            borough: Some(String::new()),
            vehicle_type: Some("   ".to_string()),
            show_fatalities_only: Some(false),
            ..FilterConfig::default()
        };
        assert!(matches(&IncidentRecord::new(1), &config));
        assert!(matches(&record(2, "QUEENS", 0.0), &config));
    }

    #[test]
    fn clauses_are_anded() {
        let config = config_with(|c| {
            c.borough = Some("BROOKLYN".to_string());
            c.min_severity = Some("5".to_string());
        });
        assert!(!matches(&record(1, "QUEENS", 10.0), &config));
        assert!(!matches(&record(2, "BROOKLYN", 3.0), &config));
        assert!(matches(&record(3, "BROOKLYN", 7.0), &config));
    }

    #[test]
    fn borough_match_is_case_sensitive() {
        let config = config_with(|c| c.borough = Some("BROOKLYN".to_string()));
        assert!(!matches(&record(1, "Brooklyn", 1.0), &config));
        assert!(!matches(&IncidentRecord::new(2), &config));
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let config = config_with(|c| {
            c.start_date = Some("2021-06-15".to_string());
            c.end_date = Some("2021-06-15".to_string());
        });
        assert!(matches(&record(1, "BRONX", 0.0), &config));

        let after = config_with(|c| c.start_date = Some("2021-06-16".to_string()));
        assert!(!matches(&record(1, "BRONX", 0.0), &after));

        let before = config_with(|c| c.end_date = Some("2021-06-14".to_string()));
        assert!(!matches(&record(1, "BRONX", 0.0), &before));
    }

    #[test]
    fn malformed_dates_exclude_without_panicking() {
        let config = config_with(|c| c.start_date = Some("2021-01-01".to_string()));
        let mut bad = record(1, "BRONX", 0.0);
        bad.crash_date = Some("not a date".to_string());
        assert!(!matches(&bad, &config));
        bad.crash_date = None;
        assert!(!matches(&bad, &config));

        let bad_bound = config_with(|c| c.end_date = Some("06/15/2021".to_string()));
        assert!(!matches(&record(2, "BRONX", 0.0), &bad_bound));
    }

    #[test]
    fn non_numeric_min_severity_disables_clause() {
        let config = config_with(|c| c.min_severity = Some("severe".to_string()));
        assert!(matches(&record(1, "BRONX", 0.0), &config));

        let nan = config_with(|c| c.min_severity = Some("NaN".to_string()));
        assert!(matches(&record(1, "BRONX", 0.0), &nan));
    }

    #[test]
    fn severity_bound_is_inclusive() {
        let config = config_with(|c| c.min_severity = Some("10".to_string()));
        assert!(matches(&record(1, "BRONX", 10.0), &config));
        assert!(!matches(&record(2, "BRONX", 9.99), &config));
    }

    #[test]
    fn vehicle_type_is_case_insensitive_substring() {
        let mut rec = record(1, "BRONX", 0.0);
        rec.vehicle_type_code_3 = Some("Station Wagon/Sport Utility Vehicle".to_string());

        let config = config_with(|c| c.vehicle_type = Some("SPORT UTILITY".to_string()));
        assert!(matches(&rec, &config));

        let miss = config_with(|c| c.vehicle_type = Some("bicycle".to_string()));
        assert!(!matches(&rec, &miss));
        assert!(!matches(&record(2, "BRONX", 0.0), &miss));
    }

    #[test]
    fn casualty_gates() {
        let mut injured = record(1, "BRONX", 1.0);
        injured.number_of_persons_injured = 1;
        let mut killed = record(2, "BRONX", 10.0);
        killed.number_of_persons_killed = 1;

        let fatalities = config_with(|c| c.show_fatalities_only = Some(true));
        assert!(!matches(&injured, &fatalities));
        assert!(matches(&killed, &fatalities));

        let injuries = config_with(|c| c.show_injuries_only = Some(true));
        assert!(matches(&injured, &injuries));
        assert!(!matches(&killed, &injuries));
    }

    #[test]
    fn apply_preserves_order() {
        let records = vec![
            record(3, "QUEENS", 1.0),
            record(1, "BRONX", 1.0),
            record(2, "QUEENS", 1.0),
        ];
        let config = config_with(|c| c.borough = Some("QUEENS".to_string()));
        let ids: Vec<i64> = apply(&records, &config)
            .iter()
            .map(|r| r.collision_id)
            .collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn apply_on_empty_input_is_empty() {
        let records: Vec<IncidentRecord> = Vec::new();
        assert!(apply(&records, &FilterConfig::default()).is_empty());
    }
}
