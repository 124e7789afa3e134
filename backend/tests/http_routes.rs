//! HTTP API tests driven through the router with `tower::ServiceExt`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use tower::ServiceExt;

use store_monitor::db::LocalRepository;
use store_monitor::http::{create_router, AppState};
use store_monitor::io::report_store::InMemoryReportStore;
use store_monitor::io::load_reference_data;
use store_monitor::services::{ReadinessHandle, ReportOrchestrator, ReportSettings};

mod support;

async fn app_with(readiness: ReadinessHandle) -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let data = support::write_dataset(dir.path());
    let repo = Arc::new(LocalRepository::new());
    load_reference_data(repo.as_ref(), &data).await.unwrap();

    let store = Arc::new(InMemoryReportStore::new());
    let orchestrator = ReportOrchestrator::start(
        repo.clone(),
        store.clone(),
        readiness,
        ReportSettings::default(),
        2,
    );
    (create_router(AppState::new(repo, store, orchestrator)), dir)
}

async fn ready_app() -> (Router, tempfile::TempDir) {
    app_with(ReadinessHandle::ready_at(
        Utc.with_ymd_and_hms(2023, 1, 23, 22, 0, 0).unwrap(),
    ))
    .await
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

async fn trigger(app: &Router) -> String {
    let (status, _, body) = send(app, "POST", "/api/v1/trigger_report").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    json(&body)["report_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_reports_readiness() {
    let (app, _dir) = ready_app().await;
    let (status, _, body) = send(&app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["data"], "ready");
    assert_eq!(body["counts"]["stores"], 4);

    let (loading, _dir) = app_with(ReadinessHandle::new()).await;
    let (_, _, body) = send(&loading, "GET", "/health").await;
    assert_eq!(json(&body)["data"], "loading");
}

#[tokio::test]
async fn test_trigger_while_loading_is_503() {
    let (app, _dir) = app_with(ReadinessHandle::new()).await;
    let (status, _, body) = send(&app, "POST", "/api/v1/trigger_report").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(&body)["code"], "NOT_READY");
}

#[tokio::test]
async fn test_get_report_unknown_is_404() {
    let (app, _dir) = ready_app().await;
    let (status, _, body) = send(&app, "GET", "/api/v1/get_report?report_id=does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_get_report_without_id_is_rejected() {
    let (app, _dir) = ready_app().await;
    let (status, _, _) = send(&app, "GET", "/api/v1/get_report").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trigger_then_download_csv() {
    let (app, _dir) = ready_app().await;
    let report_id = trigger(&app).await;
    let uri = format!("/api/v1/get_report?report_id={}", report_id);

    for _ in 0..300 {
        let (status, headers, body) = send(&app, "GET", &uri).await;
        assert_eq!(status, StatusCode::OK);
        let content_type = headers[header::CONTENT_TYPE].to_str().unwrap().to_string();
        if content_type.starts_with("application/json") {
            assert_eq!(json(&body)["status"], "Running");
            tokio::time::sleep(Duration::from_millis(10)).await;
            continue;
        }

        assert!(content_type.starts_with("text/csv"));
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains(&format!("store_report_{}.csv", report_id)));
        assert!(headers.contains_key(header::ETAG));

        let text = String::from_utf8(body).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("store_id,uptime_last_hour"));
        assert_eq!(lines.len(), 5);
        return;
    }
    panic!("report never completed");
}

#[tokio::test]
async fn test_failed_load_reports_failed_status() {
    let readiness = ReadinessHandle::new();
    readiness.mark_failed("store_status.csv missing");
    let (app, _dir) = app_with(readiness).await;

    let report_id = trigger(&app).await;
    let (status, _, body) = send(&app, "GET", &format!("/api/v1/get_report?report_id={}", report_id)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["status"], "Failed");
    assert!(body["reason"].as_str().unwrap().contains("store_status.csv missing"));
}

#[tokio::test]
async fn test_report_summary() {
    let (app, _dir) = ready_app().await;
    let report_id = trigger(&app).await;
    let uri = format!("/api/v1/reports/{}", report_id);

    for _ in 0..300 {
        let (status, _, body) = send(&app, "GET", &uri).await;
        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["report_id"], report_id.as_str());
        if body["status"] == "Complete" {
            assert_eq!(body["row_count"], 4);
            assert_eq!(body["checksum"].as_str().unwrap().len(), 64);
            assert!(!body["logs"].as_array().unwrap().is_empty());
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("report never completed");
}

#[tokio::test]
async fn test_summary_and_logs_for_unknown_report_are_404() {
    let (app, _dir) = ready_app().await;
    let (status, _, _) = send(&app, "GET", "/api/v1/reports/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _, _) = send(&app, "GET", "/api/v1/reports/ghost/logs").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_log_stream_ends_with_complete_event() {
    let readiness = ReadinessHandle::new();
    readiness.mark_failed("no data");
    let (app, _dir) = app_with(readiness).await;
    let report_id = trigger(&app).await;

    let (status, headers, body) = send(&app, "GET", &format!("/api/v1/reports/{}/logs", report_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/event-stream"));
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("event: complete"));
    assert!(text.contains("no data"));
}
