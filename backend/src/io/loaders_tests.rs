use super::*;
use crate::db::repositories::LocalRepository;
use crate::services::report_aggregator::{compute_row, ReportSettings};
use chrono::TimeZone;
use std::fs;
use tempfile::TempDir;

const STATUS_CSV: &str = "\
store_id,status,timestamp_utc
8419537941919820732,active,2023-01-22 12:09:39.388884 UTC
8419537941919820732,inactive,2023-01-24 09:06:42.605777 UTC
54515546588432327,active,2023-01-25T18:13:22Z
54515546588432327,paused,2023-01-25 10:00:00 UTC
54515546588432327,active,yesterday
";

const MENU_HOURS_CSV: &str = "\
store_id,dayOfWeek,start_time_local,end_time_local
8419537941919820732,0,00:00:00,00:10:00
8419537941919820732,1,11:00:00,23:00:00
1481966498820158979,4,x,23:00:00
";

const TIMEZONES_CSV: &str = "\
store_id,timezone_str
8419537941919820732,America/Boise
54515546588432327,Asia/Beirut
";

fn data_dir(status: Option<&str>, menu: Option<&str>, timezones: Option<&str>) -> (TempDir, DataConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = DataConfig {
        dir: dir.path().to_path_buf(),
        ..DataConfig::default()
    };
    if let Some(content) = status {
        fs::write(config.status_path(), content).unwrap();
    }
    if let Some(content) = menu {
        fs::write(config.business_hours_path(), content).unwrap();
    }
    if let Some(content) = timezones {
        fs::write(config.timezones_path(), content).unwrap();
    }
    (dir, config)
}

#[test]
fn test_parse_utc_timestamp_formats() {
    let expected = Utc.with_ymd_and_hms(2023, 1, 25, 18, 13, 22).unwrap();
    assert_eq!(parse_utc_timestamp("2023-01-25T18:13:22Z"), Some(expected));
    assert_eq!(parse_utc_timestamp("2023-01-25 18:13:22 UTC"), Some(expected));
    assert_eq!(parse_utc_timestamp("2023-01-25 18:13:22"), Some(expected));
    assert_eq!(parse_utc_timestamp("2023-01-25T20:13:22+02:00"), Some(expected));

    let fractional = parse_utc_timestamp("2023-01-22 12:09:39.388884 UTC").unwrap();
    assert_eq!(fractional.timestamp_subsec_micros(), 388884);
    assert!(parse_utc_timestamp("25/01/2023").is_none());
}

#[test]
fn test_parse_local_time() {
    assert_eq!(parse_local_time("09:30:00"), NaiveTime::from_hms_opt(9, 30, 0));
    assert_eq!(parse_local_time("23:59"), NaiveTime::from_hms_opt(23, 59, 0));
    assert!(parse_local_time("25:00:00").is_none());
}

#[test]
fn test_parse_status_csv_collects_issues() {
    let parsed = parse_status_csv(STATUS_CSV.as_bytes()).unwrap();
    assert_eq!(parsed.records.len(), 3);
    assert_eq!(parsed.issues.len(), 2);
    assert!(parsed.issues[0].message.contains("paused"));
    assert!(parsed.issues[1].message.contains("yesterday"));
    assert!(parsed.issues.iter().all(|i| i.source == IssueSource::Status));
    assert_eq!(parsed.issues[1].store_id, StoreId::from("54515546588432327"));
    assert_eq!(parsed.skipped, 0);
}

#[test]
fn test_parse_status_csv_skips_unreadable_rows() {
    let csv = "store_id,status,timestamp_utc\n1,active\n,active,2023-01-25 10:00:00 UTC\n2,inactive,2023-01-25 10:00:00 UTC\n";
    let parsed = parse_status_csv(csv.as_bytes()).unwrap();
    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.skipped, 2);
}

#[test]
fn test_parse_menu_hours_csv() {
    let parsed = parse_menu_hours_csv(MENU_HOURS_CSV.as_bytes()).unwrap();
    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.records[1].day_of_week, 1);
    assert_eq!(parsed.records[1].end_time_local, NaiveTime::from_hms_opt(23, 0, 0).unwrap());
    assert_eq!(parsed.issues.len(), 1);
    assert_eq!(parsed.issues[0].store_id, StoreId::from("1481966498820158979"));
    assert_eq!(parsed.issues[0].source, IssueSource::BusinessHours);
}

#[test]
fn test_parse_timezones_csv() {
    let csv = "store_id,timezone_str\n1,America/Denver\n2,\n";
    let parsed = parse_timezones_csv(csv.as_bytes()).unwrap();
    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].timezone, "America/Denver");
    assert_eq!(parsed.issues.len(), 1);
}

#[tokio::test]
async fn test_load_reference_data() {
    let (_dir, config) = data_dir(Some(STATUS_CSV), Some(MENU_HOURS_CSV), Some(TIMEZONES_CSV));
    let repo = LocalRepository::new();

    let summary = load_reference_data(&repo, &config).await.unwrap();
    assert_eq!(summary.counts.observations, 3);
    assert_eq!(summary.counts.business_hours, 2);
    assert_eq!(summary.counts.timezones, 2);
    assert_eq!(summary.counts.issues, 3);
    // Two stores with data plus one that only appears with a bad rule.
    assert_eq!(summary.counts.stores, 3);

    let store = repo
        .fetch_store_reference(&StoreId::from("54515546588432327"))
        .await
        .unwrap();
    assert_eq!(store.timezone.as_deref(), Some("Asia/Beirut"));
    assert_eq!(store.issues.len(), 2);
    assert_eq!(
        repo.max_observation_timestamp().await.unwrap(),
        Some(Utc.with_ymd_and_hms(2023, 1, 25, 18, 13, 22).unwrap())
    );
}

#[tokio::test]
async fn test_optional_files_may_be_missing() {
    let (_dir, config) = data_dir(Some(STATUS_CSV), None, None);
    let repo = LocalRepository::new();

    let summary = load_reference_data(&repo, &config).await.unwrap();
    assert_eq!(summary.counts.business_hours, 0);
    assert_eq!(summary.counts.timezones, 0);
    assert_eq!(summary.counts.stores, 2);
}

#[tokio::test]
async fn test_missing_status_file_fails() {
    let (_dir, config) = data_dir(None, Some(MENU_HOURS_CSV), None);
    let repo = LocalRepository::new();

    let err = load_reference_data(&repo, &config).await.unwrap_err();
    assert!(err.to_string().contains("Status file not found"));
}

#[tokio::test]
async fn test_large_status_file_is_loaded_in_batches() {
    let mut csv = String::from("store_id,status,timestamp_utc\n");
    for i in 0..2500 {
        csv.push_str(&format!("s{},active,2023-01-25 10:{:02}:00 UTC\n", i % 7, i % 60));
    }
    let (_dir, config) = data_dir(Some(&csv), None, None);
    let repo = LocalRepository::new();

    let summary = load_reference_data(&repo, &config).await.unwrap();
    assert_eq!(summary.counts.observations, 2500);
    assert_eq!(summary.counts.stores, 7);
}

#[tokio::test]
async fn test_store_with_only_unparseable_hours_gets_zeroed_row() {
    let status = "store_id,status,timestamp_utc\n\
P,active,2023-01-23 20:00:00 UTC\n\
P,active,2023-01-23 22:00:00 UTC\n\
Q,active,2023-01-23 20:00:00 UTC\n";
    let menu = "store_id,dayOfWeek,start_time_local,end_time_local\n\
P,1,9am,17:00:00\n\
Q,0,x,17:00:00\n\
Q,0,09:00:00,17:00:00\n";
    let (_dir, config) = data_dir(Some(status), Some(menu), None);
    let repo = LocalRepository::new();
    load_reference_data(&repo, &config).await.unwrap();

    let now = Utc.with_ymd_and_hms(2023, 1, 23, 22, 0, 0).unwrap();
    let settings = ReportSettings::default();

    let p = repo.fetch_store_reference(&StoreId::from("P")).await.unwrap();
    assert!(p.business_hours.is_empty());
    let row = compute_row(&p, now, &settings);
    assert_eq!(row.uptime_last_hour_minutes, 0.0);
    assert_eq!(row.uptime_last_day_hours, 0.0);
    assert_eq!(row.uptime_last_week_hours, 0.0);
    let marker = row.error.unwrap();
    assert!(marker.contains("no usable business hours"));
    assert!(marker.contains("'9am'"));

    // One good rule survives, so the store keeps its declared schedule.
    let q = repo.fetch_store_reference(&StoreId::from("Q")).await.unwrap();
    let row = compute_row(&q, now, &settings);
    assert_eq!(row.uptime_last_hour_minutes, 60.0);
    assert!(row.error.unwrap().contains("'x'"));
}
