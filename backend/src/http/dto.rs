//! Data Transfer Objects for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::repository::ReferenceCounts;
use crate::services::job_tracker::{LogEntry, ReportJob, ReportState};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Reference data state: `loading`, `ready` or `failed: <reason>`
    pub data: String,
    /// Record counts once data is loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<ReferenceCounts>,
}

/// Response for report triggering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerReportResponse {
    pub report_id: String,
}

/// Query string of `get_report`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetReportQuery {
    pub report_id: String,
}

/// Non-CSV answer of `get_report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatusResponse {
    pub status: ReportState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Full job summary for a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummaryResponse {
    pub report_id: String,
    pub status: ReportState,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub row_count: Option<usize>,
    pub checksum: Option<String>,
    pub failure_reason: Option<String>,
    pub logs: Vec<LogEntry>,
}

impl From<ReportJob> for ReportSummaryResponse {
    fn from(job: ReportJob) -> Self {
        Self {
            report_id: job.report_id.to_string(),
            status: job.state,
            created_at: job.created_at,
            completed_at: job.completed_at,
            row_count: job.artifact.as_ref().map(|a| a.row_count),
            checksum: job.artifact.map(|a| a.checksum),
            failure_reason: job.failure_reason,
            logs: job.logs,
        }
    }
}
