//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! report orchestrator for the actual work.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;

use super::dto::{
    GetReportQuery, HealthResponse, ReportStatusResponse, ReportSummaryResponse,
    TriggerReportResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::io::report_store::report_file_name;
use crate::models::ReportId;
use crate::services::job_tracker::ReportState;
use crate::services::readiness::Readiness;
use crate::services::report_orchestrator::ReportStatus;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Reports whether the service is up and whether reference data has loaded.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let readiness = state.orchestrator.readiness().current();
    let counts = match readiness {
        Readiness::Ready { .. } => state.repository.counts().await.ok(),
        _ => None,
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data: readiness.to_string(),
        counts,
    }))
}

// =============================================================================
// Reports
// =============================================================================

/// POST /api/v1/trigger_report
///
/// Start generating a report. Returns its ID immediately.
pub async fn trigger_report(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TriggerReportResponse>), AppError> {
    let report_id = state.orchestrator.trigger()?;
    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerReportResponse {
            report_id: report_id.to_string(),
        }),
    ))
}

/// GET /api/v1/get_report?report_id=...
///
/// Running and failed reports answer with a JSON status. Complete reports
/// answer with the CSV itself.
pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<GetReportQuery>,
) -> Result<Response, AppError> {
    let report_id = ReportId::from(query.report_id);
    match state.orchestrator.status(&report_id)? {
        ReportStatus::Running => Ok(Json(ReportStatusResponse {
            status: ReportState::Running,
            reason: None,
        })
        .into_response()),
        ReportStatus::Failed(reason) => Ok(Json(ReportStatusResponse {
            status: ReportState::Failed,
            reason: Some(reason),
        })
        .into_response()),
        ReportStatus::Complete(artifact) => {
            let body = state.report_store.load(&artifact).await?;
            let disposition = format!("attachment; filename=\"{}\"", report_file_name(&report_id));
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                    (header::ETAG, format!("\"{}\"", artifact.checksum)),
                ],
                body,
            )
                .into_response())
        }
    }
}

/// GET /api/v1/reports/{report_id}
///
/// Job summary including progress logs.
pub async fn get_report_summary(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> HandlerResult<ReportSummaryResponse> {
    let report_id = ReportId::from(report_id);
    let job = state
        .orchestrator
        .tracker()
        .get_job(&report_id)
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))?;
    Ok(Json(job.into()))
}

/// GET /api/v1/reports/{report_id}/logs
///
/// Stream report logs using Server-Sent Events.
pub async fn stream_report_logs(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let report_id = ReportId::from(report_id);
    let tracker = state.orchestrator.tracker().clone();
    if tracker.get_job(&report_id).is_none() {
        return Err(AppError::NotFound(format!("Report {} not found", report_id)));
    }

    let stream = async_stream::stream! {
        let mut last_log_count = 0;
        loop {
            let logs = tracker.get_logs(&report_id);
            for log in logs.iter().skip(last_log_count) {
                let event_data = serde_json::to_string(log).unwrap_or_default();
                yield Ok(Event::default().data(event_data));
            }
            last_log_count = logs.len();

            match tracker.get_job(&report_id) {
                Some(job) if job.state.is_terminal() => {
                    let final_event = serde_json::json!({
                        "status": job.state,
                        "row_count": job.artifact.as_ref().map(|a| a.row_count),
                        "reason": job.failure_reason,
                    });
                    yield Ok(Event::default()
                        .event("complete")
                        .data(final_event.to_string()));
                    break;
                }
                Some(_) => {}
                None => break,
            }

            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}
