//! Asynchronous report orchestration.
//!
//! `trigger` registers a running job and hands a [`ReportRequest`] to a
//! dispatcher task over a channel. The dispatcher runs each request on a
//! bounded worker pool; every run aggregates the report, persists it through
//! the [`ReportStore`] and publishes the outcome into the [`JobTracker`].

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};

use super::job_tracker::{JobTracker, LogLevel, ReportState};
use super::readiness::{Readiness, ReadinessHandle};
use super::report_aggregator::{aggregate_report, ReportSettings};
use crate::db::repository::ReferenceRepository;
use crate::io::report_store::ReportStore;
use crate::models::{ReportArtifact, ReportId};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("reference data is still loading")]
    NotReady,

    #[error("report {0} not found")]
    NotFound(ReportId),

    #[error("report queue is closed")]
    QueueClosed,
}

/// Externally visible state of a report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportStatus {
    Running,
    Complete(ReportArtifact),
    Failed(String),
}

/// Work item handed from `trigger` to the dispatcher.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub report_id: ReportId,
    pub now: DateTime<Utc>,
}

/// Shared dependencies of every report run.
pub struct ReportContext {
    pub repo: Arc<dyn ReferenceRepository>,
    pub store: Arc<dyn ReportStore>,
    pub tracker: JobTracker,
    pub settings: ReportSettings,
}

/// Entry point for triggering and polling reports.
#[derive(Clone)]
pub struct ReportOrchestrator {
    tracker: JobTracker,
    readiness: ReadinessHandle,
    sender: mpsc::UnboundedSender<ReportRequest>,
}

impl ReportOrchestrator {
    /// Start the dispatcher on the current runtime.
    ///
    /// # Arguments
    /// * `repo` - Reference data
    /// * `store` - Destination for finished reports
    /// * `readiness` - Load state of `repo`
    /// * `settings` - Report computation settings
    /// * `workers` - Maximum number of reports generated concurrently
    pub fn start(
        repo: Arc<dyn ReferenceRepository>,
        store: Arc<dyn ReportStore>,
        readiness: ReadinessHandle,
        settings: ReportSettings,
        workers: usize,
    ) -> Self {
        let tracker = JobTracker::new();
        let (sender, receiver) = mpsc::unbounded_channel();
        let context = Arc::new(ReportContext {
            repo,
            store,
            tracker: tracker.clone(),
            settings,
        });
        tokio::spawn(dispatch(receiver, context, workers.max(1)));

        Self {
            tracker,
            readiness,
            sender,
        }
    }

    /// Register a new report and queue it for generation.
    ///
    /// # Returns
    /// * `Ok(ReportId)` immediately; the report may still be running
    /// * `Err(OrchestratorError::NotReady)` while reference data is loading
    pub fn trigger(&self) -> Result<ReportId, OrchestratorError> {
        let now = match self.readiness.current() {
            Readiness::Loading => return Err(OrchestratorError::NotReady),
            Readiness::Failed(reason) => {
                let report_id = self.tracker.create_job();
                self.tracker
                    .fail_job(&report_id, format!("Reference data failed to load: {}", reason));
                tracing::warn!(report_id = %report_id, "Report failed: reference data unavailable");
                return Ok(report_id);
            }
            Readiness::Ready { now } => now,
        };

        let report_id = self.tracker.create_job();
        self.tracker.log(&report_id, LogLevel::Info, "Report queued");
        let request = ReportRequest {
            report_id: report_id.clone(),
            now,
        };
        if self.sender.send(request).is_err() {
            self.tracker.fail_job(&report_id, "Report queue is closed");
            return Err(OrchestratorError::QueueClosed);
        }

        tracing::info!(report_id = %report_id, %now, "Report triggered");
        Ok(report_id)
    }

    /// Current status of a report.
    pub fn status(&self, report_id: &ReportId) -> Result<ReportStatus, OrchestratorError> {
        let job = self
            .tracker
            .get_job(report_id)
            .ok_or_else(|| OrchestratorError::NotFound(report_id.clone()))?;

        Ok(match job.state {
            ReportState::Running => ReportStatus::Running,
            ReportState::Complete => match job.artifact {
                Some(artifact) => ReportStatus::Complete(artifact),
                None => ReportStatus::Failed("Report completed without an artifact".to_string()),
            },
            ReportState::Failed => ReportStatus::Failed(
                job.failure_reason
                    .unwrap_or_else(|| "Report failed".to_string()),
            ),
        })
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    pub fn readiness(&self) -> &ReadinessHandle {
        &self.readiness
    }
}

async fn dispatch(
    mut receiver: mpsc::UnboundedReceiver<ReportRequest>,
    context: Arc<ReportContext>,
    workers: usize,
) {
    let semaphore = Arc::new(Semaphore::new(workers));
    while let Some(request) = receiver.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let context = context.clone();
        tokio::spawn(async move {
            let _permit = permit;
            run_supervised(context, request).await;
        });
    }
    tracing::debug!("Report dispatcher stopped");
}

/// Run one report and publish exactly one terminal state, even on panic.
async fn run_supervised(context: Arc<ReportContext>, request: ReportRequest) {
    let report_id = request.report_id.clone();
    let outcome = match tokio::spawn(generate_report(context.clone(), request)).await {
        Ok(outcome) => outcome,
        Err(e) => Err(format!("Report task panicked: {}", e)),
    };

    match outcome {
        Ok(artifact) => {
            let rows = artifact.row_count;
            if context.tracker.complete_job(&report_id, artifact) {
                tracing::info!(report_id = %report_id, rows, "Report complete");
            }
        }
        Err(reason) => {
            tracing::error!(report_id = %report_id, %reason, "Report failed");
            context.tracker.fail_job(&report_id, reason);
        }
    }
}

/// Aggregate, render and persist one report, logging progress to its job.
///
/// # Returns
/// * The persisted artifact on success, or an error message on failure
pub async fn generate_report(
    context: Arc<ReportContext>,
    request: ReportRequest,
) -> Result<ReportArtifact, String> {
    let tracker = &context.tracker;
    let report_id = &request.report_id;
    tracker.log(
        report_id,
        LogLevel::Info,
        format!("Computing uptime as of {}", request.now.to_rfc3339()),
    );

    let table = aggregate_report(
        context.repo.clone(),
        request.now,
        &context.settings,
        |done, total| {
            tracker.log(report_id, LogLevel::Info, format!("Processed {} / {} stores", done, total));
        },
    )
    .await
    .map_err(|e| format!("Failed to aggregate report: {}", e))?;

    let flagged = table.error_count();
    if flagged > 0 {
        tracker.log(
            report_id,
            LogLevel::Warning,
            format!("{} stores have data-quality markers", flagged),
        );
    }
    tracker.log(
        report_id,
        LogLevel::Success,
        format!("Computed {} store rows", table.len()),
    );

    let artifact = context
        .store
        .save(report_id, &table)
        .await
        .map_err(|e| format!("Failed to store report: {}", e))?;
    tracker.log(
        report_id,
        LogLevel::Success,
        format!("Report saved (checksum {})", artifact.checksum),
    );

    Ok(artifact)
}
