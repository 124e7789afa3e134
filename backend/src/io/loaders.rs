//! CSV ingestion of store reference data.
//!
//! Three inputs feed the repository:
//! - `store_status.csv`: `store_id,status,timestamp_utc` (required)
//! - `menu_hours.csv`: `store_id,dayOfWeek,start_time_local,end_time_local`
//!   (optional; stores without rules are open 24x7)
//! - `timezones.csv`: `store_id,timezone_str` (optional; stores without an
//!   entry use the default timezone)
//!
//! Rows that name a store but carry an unparseable value become [`DataIssue`]s
//! for that store. Rows that cannot be read at all are skipped with a warning.
//! A store whose business-hour rows all fail to parse keeps its issues, which
//! stops it from being treated as open 24x7.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::config::DataConfig;
use crate::db::repository::{ReferenceCounts, ReferenceRepository};
use crate::models::{
    BusinessHourRule, DataIssue, IssueSource, StatusObservation, StoreId, StoreStatus, StoreTimezone,
};

/// Observations handed to the repository per call.
const INSERT_BATCH_SIZE: usize = 1000;

/// Records parsed from one CSV input.
#[derive(Debug)]
pub struct ParsedRecords<T> {
    pub records: Vec<T>,
    pub issues: Vec<DataIssue>,
    /// Rows that could not be attributed to any store.
    pub skipped: usize,
}

impl<T> Default for ParsedRecords<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            issues: Vec::new(),
            skipped: 0,
        }
    }
}

impl<T> ParsedRecords<T> {
    fn issue(&mut self, store_id: &str, source: IssueSource, message: String) {
        self.issues
            .push(DataIssue::new(StoreId::from(store_id.trim()), source, message));
    }
}

/// Outcome of a full reference-data load.
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub counts: ReferenceCounts,
    pub skipped_rows: usize,
}

#[derive(Debug, Deserialize)]
struct StatusRow {
    store_id: String,
    status: String,
    timestamp_utc: String,
}

#[derive(Debug, Deserialize)]
struct MenuHoursRow {
    store_id: String,
    #[serde(rename = "dayOfWeek", alias = "day")]
    day_of_week: String,
    start_time_local: String,
    end_time_local: String,
}

#[derive(Debug, Deserialize)]
struct TimezoneRow {
    store_id: String,
    timezone_str: String,
}

/// Parse a UTC timestamp as found in status exports.
///
/// Accepts RFC 3339 and `YYYY-MM-DD HH:MM:SS[.ffffff][ UTC]`.
pub fn parse_utc_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = raw.strip_suffix("UTC").map(str::trim_end).unwrap_or(raw);
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|dt| dt.and_utc())
}

/// Parse a local wall-clock time (`HH:MM:SS` or `HH:MM`).
pub fn parse_local_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input)
}

/// Parse `store_status.csv` content.
pub fn parse_status_csv<R: Read>(input: R) -> Result<ParsedRecords<StatusObservation>> {
    let mut parsed = ParsedRecords::default();
    for (line, row) in csv_reader(input).deserialize::<StatusRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(line = line + 2, error = %e, "Skipping unreadable status row");
                parsed.skipped += 1;
                continue;
            }
        };

        if row.store_id.is_empty() {
            parsed.skipped += 1;
            continue;
        }

        let status = match row.status.parse::<StoreStatus>() {
            Ok(status) => status,
            Err(e) => {
                parsed.issue(&row.store_id, IssueSource::Status, e);
                continue;
            }
        };
        match parse_utc_timestamp(&row.timestamp_utc) {
            Some(ts) => parsed
                .records
                .push(StatusObservation::new(row.store_id.as_str(), ts, status)),
            None => parsed.issue(
                &row.store_id,
                IssueSource::Status,
                format!("unparseable timestamp '{}'", row.timestamp_utc),
            ),
        }
    }
    Ok(parsed)
}

/// Parse `menu_hours.csv` content.
pub fn parse_menu_hours_csv<R: Read>(input: R) -> Result<ParsedRecords<BusinessHourRule>> {
    let mut parsed = ParsedRecords::default();
    for (line, row) in csv_reader(input).deserialize::<MenuHoursRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(line = line + 2, error = %e, "Skipping unreadable business hours row");
                parsed.skipped += 1;
                continue;
            }
        };

        if row.store_id.is_empty() {
            parsed.skipped += 1;
            continue;
        }

        let Ok(day) = row.day_of_week.parse::<u8>() else {
            parsed.issue(
                &row.store_id,
                IssueSource::BusinessHours,
                format!("unparseable day of week '{}'", row.day_of_week),
            );
            continue;
        };
        match (parse_local_time(&row.start_time_local), parse_local_time(&row.end_time_local)) {
            (Some(start), Some(end)) => parsed
                .records
                .push(BusinessHourRule::new(row.store_id.as_str(), day, start, end)),
            _ => parsed.issue(
                &row.store_id,
                IssueSource::BusinessHours,
                format!(
                    "unparseable business hours '{}'-'{}'",
                    row.start_time_local, row.end_time_local
                ),
            ),
        }
    }
    Ok(parsed)
}

/// Parse `timezones.csv` content.
pub fn parse_timezones_csv<R: Read>(input: R) -> Result<ParsedRecords<StoreTimezone>> {
    let mut parsed = ParsedRecords::default();
    for (line, row) in csv_reader(input).deserialize::<TimezoneRow>().enumerate() {
        match row {
            Ok(row) if row.store_id.is_empty() => parsed.skipped += 1,
            Ok(row) if row.timezone_str.is_empty() => {
                parsed.issue(&row.store_id, IssueSource::Timezone, "empty timezone".to_string());
            }
            Ok(row) => parsed.records.push(StoreTimezone {
                store_id: StoreId::from(row.store_id),
                timezone: row.timezone_str,
            }),
            Err(e) => {
                tracing::warn!(line = line + 2, error = %e, "Skipping unreadable timezone row");
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

/// Read and parse a file on the blocking pool. Returns `None` if it does not exist.
async fn parse_file<T, F>(path: &Path, parse: F) -> Result<Option<ParsedRecords<T>>>
where
    T: Send + 'static,
    F: FnOnce(std::fs::File) -> Result<ParsedRecords<T>> + Send + 'static,
{
    if !path.exists() {
        return Ok(None);
    }
    let owned = path.to_path_buf();
    let parsed = tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&owned)
            .with_context(|| format!("Failed to open {}", owned.display()))?;
        parse(file).with_context(|| format!("Failed to parse {}", owned.display()))
    })
    .await
    .context("CSV parse task panicked")??;
    Ok(Some(parsed))
}

/// Load all three reference inputs into the repository.
///
/// # Errors
/// Fails if the status file is missing or unreadable, or the repository
/// rejects a write. Missing optional files only log.
pub async fn load_reference_data(repo: &dyn ReferenceRepository, config: &DataConfig) -> Result<LoadSummary> {
    let mut summary = LoadSummary::default();
    let mut issues = Vec::new();

    let status_path = config.status_path();
    let status = parse_file(&status_path, parse_status_csv::<std::fs::File>)
        .await?
        .with_context(|| format!("Status file not found: {}", status_path.display()))?;
    summary.skipped_rows += status.skipped;
    issues.extend(status.issues);

    let total = status.records.len();
    let mut loaded = 0;
    let mut records = status.records;
    while !records.is_empty() {
        let rest = records.split_off(records.len().min(INSERT_BATCH_SIZE));
        loaded += repo.store_observations(records).await?;
        records = rest;
        tracing::debug!(loaded, total, "Loaded store status records");
    }
    tracing::info!(observations = loaded, "Store status loaded");

    match parse_file(&config.business_hours_path(), parse_menu_hours_csv::<std::fs::File>).await? {
        Some(parsed) => {
            summary.skipped_rows += parsed.skipped;
            issues.extend(parsed.issues);
            let count = repo.store_business_hours(parsed.records).await?;
            tracing::info!(rules = count, "Business hours loaded");
        }
        None => tracing::info!("Business hours file not found, stores will be assumed open 24x7"),
    }

    match parse_file(&config.timezones_path(), parse_timezones_csv::<std::fs::File>).await? {
        Some(parsed) => {
            summary.skipped_rows += parsed.skipped;
            issues.extend(parsed.issues);
            let count = repo.store_timezones(parsed.records).await?;
            tracing::info!(timezones = count, "Timezones loaded");
        }
        None => tracing::info!("Timezone file not found, stores will use the default timezone"),
    }

    if !issues.is_empty() {
        tracing::warn!(issues = issues.len(), "Data-quality issues found during ingestion");
        repo.record_data_issues(issues).await?;
    }

    summary.counts = repo.counts().await?;
    Ok(summary)
}

#[cfg(test)]
#[path = "loaders_tests.rs"]
mod tests;
