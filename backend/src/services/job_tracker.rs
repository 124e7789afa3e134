//! Job tracking for background report generation.
//!
//! This module provides an in-memory registry of report jobs with their state,
//! progress logs and, once finished, the persisted artifact or failure reason.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{ReportArtifact, ReportId};

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Report job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportState {
    Running,
    Complete,
    Failed,
}

impl ReportState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReportState::Running)
    }
}

/// Job metadata, logs and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportJob {
    pub report_id: ReportId,
    pub state: ReportState,
    pub logs: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Set once the job is `Complete`.
    pub artifact: Option<ReportArtifact>,
    /// Set once the job is `Failed`.
    pub failure_reason: Option<String>,
}

/// In-memory job tracker.
#[derive(Clone, Default)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<ReportId, ReportJob>>>,
}

impl JobTracker {
    /// Create a new job tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new running job and return its ID.
    pub fn create_job(&self) -> ReportId {
        let report_id = ReportId::generate();
        let job = ReportJob {
            report_id: report_id.clone(),
            state: ReportState::Running,
            logs: vec![],
            created_at: Utc::now(),
            completed_at: None,
            artifact: None,
            failure_reason: None,
        };
        self.jobs.write().insert(report_id.clone(), job);
        report_id
    }

    /// Add a log entry to a job.
    pub fn log(&self, report_id: &ReportId, level: LogLevel, message: impl Into<String>) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(report_id) {
            job.logs.push(LogEntry {
                timestamp: Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    /// Mark a job complete with its artifact.
    ///
    /// Returns `false` if the job is unknown or already finished.
    pub fn complete_job(&self, report_id: &ReportId, artifact: ReportArtifact) -> bool {
        let mut jobs = self.jobs.write();
        match jobs.get_mut(report_id) {
            Some(job) if !job.state.is_terminal() => {
                job.state = ReportState::Complete;
                job.completed_at = Some(Utc::now());
                job.artifact = Some(artifact);
                true
            }
            _ => false,
        }
    }

    /// Mark a job as failed.
    ///
    /// Returns `false` if the job is unknown or already finished.
    pub fn fail_job(&self, report_id: &ReportId, reason: impl Into<String>) -> bool {
        let mut jobs = self.jobs.write();
        match jobs.get_mut(report_id) {
            Some(job) if !job.state.is_terminal() => {
                let reason = reason.into();
                let now = Utc::now();
                job.state = ReportState::Failed;
                job.completed_at = Some(now);
                job.logs.push(LogEntry {
                    timestamp: now,
                    level: LogLevel::Error,
                    message: reason.clone(),
                });
                job.failure_reason = Some(reason);
                true
            }
            _ => false,
        }
    }

    /// Get a job by ID.
    pub fn get_job(&self, report_id: &ReportId) -> Option<ReportJob> {
        self.jobs.read().get(report_id).cloned()
    }

    /// Get all logs for a job.
    pub fn get_logs(&self, report_id: &ReportId) -> Vec<LogEntry> {
        self.jobs
            .read()
            .get(report_id)
            .map(|job| job.logs.clone())
            .unwrap_or_default()
    }

    /// Number of jobs still running.
    pub fn running_count(&self) -> usize {
        self.jobs
            .read()
            .values()
            .filter(|job| job.state == ReportState::Running)
            .count()
    }
}
