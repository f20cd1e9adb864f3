//! Paginated Socrata SODA API fetcher.
//!
//! Pages through a dataset with `$limit`, `$offset`, `$order`, and `$where`
//! and writes the concatenated rows to a single JSON file.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::retry::{self, RetryPolicy};
use crate::{FetchOptions, SourceError};

/// Configuration for a Socrata fetch operation.
pub struct SocrataConfig<'a> {
    /// Resource URL (e.g., `"https://data.cityofnewyork.us/resource/h9gi-nx95.json"`).
    pub api_url: &'a str,
    /// Date column used for ordering and the `since` bound.
    pub date_column: &'a str,
    /// Columns that must be non-null for a row to be returned.
    pub required_columns: &'a [&'a str],
    /// Output filename inside [`FetchOptions::output_dir`].
    pub output_filename: &'a str,
    /// Label for log messages.
    pub label: &'a str,
    pub page_size: u64,
}

/// Builds the `$where` clause: every required column non-null, plus the
/// optional lower date bound.
#[must_use]
pub fn where_clause(config: &SocrataConfig<'_>, since: Option<NaiveDate>) -> Option<String> {
    let mut clauses: Vec<String> = config
        .required_columns
        .iter()
        .map(|c| format!("{c} IS NOT NULL"))
        .collect();

    if let Some(since) = since {
        clauses.push(format!(
            "{} >= '{}'",
            config.date_column,
            since.format("%Y-%m-%dT00:00:00")
        ));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

/// Fetches all rows from a Socrata dataset with pagination, writes them to
/// a JSON file, and returns the output path.
///
/// # Errors
///
/// Returns [`SourceError`] if an HTTP request fails after retries, a page
/// is not a JSON array, or file I/O fails.
pub async fn fetch_socrata(
    config: &SocrataConfig<'_>,
    options: &FetchOptions,
) -> Result<PathBuf, SourceError> {
    let output_path = options.output_dir.join(config.output_filename);
    std::fs::create_dir_all(&options.output_dir)?;

    let client = reqwest::Client::new();
    let policy = RetryPolicy::default();
    let order = format!("{} DESC", config.date_column);
    let filter = where_clause(config, options.since);
    let fetch_limit = options.limit.unwrap_or(u64::MAX);

    if let Some(limit) = options.limit {
        options.progress.set_total(limit);
    }

    let mut all_rows: Vec<serde_json::Value> = Vec::new();
    let mut offset: u64 = 0;

    loop {
        let remaining = fetch_limit.saturating_sub(offset);
        if remaining == 0 {
            break;
        }
        let page_limit = remaining.min(config.page_size);

        let mut params = vec![
            ("$limit", page_limit.to_string()),
            ("$offset", offset.to_string()),
            ("$order", order.clone()),
        ];
        if let Some(filter) = &filter {
            params.push(("$where", filter.clone()));
        }

        log::info!(
            "Fetching {} data: offset={offset}, limit={page_limit}",
            config.label
        );
        options
            .progress
            .set_message(format!("{}: offset {offset}", config.label));

        let page = retry::send_json(|| client.get(config.api_url).query(&params), &policy).await?;
        let serde_json::Value::Array(rows) = page else {
            return Err(SourceError::Normalization {
                message: format!("{} page at offset {offset} is not a JSON array", config.label),
            });
        };

        let count = rows.len() as u64;
        if count == 0 {
            break;
        }

        all_rows.extend(rows);
        offset += count;
        options.progress.inc(count);

        if count < page_limit {
            break;
        }
    }

    log::info!("Downloaded {} {} rows total", all_rows.len(), config.label);
    options
        .progress
        .finish(format!("{}: {} rows", config.label, all_rows.len()));

    let json = serde_json::to_string(&all_rows)?;
    std::fs::write(&output_path, json)?;

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: SocrataConfig<'static> = SocrataConfig {
        api_url: "https://example.invalid/resource/abcd-1234.json",
        date_column: "crash_date",
        required_columns: &["latitude", "longitude"],
        output_filename: "rows.json",
        label: "Test",
        page_size: 1000,
    };

    #[test]
    fn requires_coordinates() {
        assert_eq!(
            where_clause(&CONFIG, None).as_deref(),
            Some("latitude IS NOT NULL AND longitude IS NOT NULL")
        );
    }

    #[test]
    fn appends_since_bound() {
        let since = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(
            where_clause(&CONFIG, since).as_deref(),
            Some(
                "latitude IS NOT NULL AND longitude IS NOT NULL \
                 AND crash_date >= '2024-03-01T00:00:00'"
            )
        );
    }

    #[test]
    fn no_clauses_means_no_where() {
        let config = SocrataConfig {
            required_columns: &[],
            ..CONFIG
        };
        assert!(where_clause(&config, None).is_none());
    }
}
