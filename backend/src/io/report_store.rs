//! Persistence of finished reports.
//!
//! A report table is rendered to CSV once, checksummed and handed to a
//! [`ReportStore`]. The returned [`ReportArtifact`] is the handle the job
//! registry keeps; the bytes are read back through the same store.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::checksum::calculate_checksum;
use crate::models::{ReportArtifact, ReportId, ReportTable};

/// Column headers of the rendered report.
pub const REPORT_HEADERS: [&str; 8] = [
    "store_id",
    "uptime_last_hour",
    "uptime_last_day",
    "uptime_last_week",
    "downtime_last_hour",
    "downtime_last_day",
    "downtime_last_week",
    "error",
];

#[derive(Debug, Error)]
pub enum ReportStoreError {
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report rendering error: {0}")]
    Csv(#[from] csv::Error),

    #[error("report artifact not found: {0}")]
    NotFound(String),
}

/// Destination for rendered reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Render and persist a report, returning its handle.
    async fn save(&self, report_id: &ReportId, table: &ReportTable) -> Result<ReportArtifact, ReportStoreError>;

    /// Read back the rendered bytes of a saved report.
    async fn load(&self, artifact: &ReportArtifact) -> Result<Vec<u8>, ReportStoreError>;
}

/// Render a report table as CSV. Figures carry two decimals.
pub fn render_csv(table: &ReportTable) -> Result<Vec<u8>, ReportStoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADERS)?;
    for row in &table.rows {
        writer.write_record([
            row.store_id.to_string(),
            format!("{:.2}", row.uptime_last_hour_minutes),
            format!("{:.2}", row.uptime_last_day_hours),
            format!("{:.2}", row.uptime_last_week_hours),
            format!("{:.2}", row.downtime_last_hour_minutes),
            format!("{:.2}", row.downtime_last_day_hours),
            format!("{:.2}", row.downtime_last_week_hours),
            row.error.clone().unwrap_or_default(),
        ])?;
    }
    writer.into_inner().map_err(|e| ReportStoreError::Io(e.into_error()))
}

/// File name of a report's CSV artifact.
pub fn report_file_name(report_id: &ReportId) -> String {
    format!("store_report_{}.csv", report_id)
}

fn build_artifact(report_id: &ReportId, location: String, table: &ReportTable, bytes: &[u8]) -> ReportArtifact {
    ReportArtifact {
        report_id: report_id.clone(),
        location,
        row_count: table.len(),
        checksum: calculate_checksum(bytes),
        created_at: Utc::now(),
    }
}

/// Writes `store_report_<id>.csv` files under a reports directory.
#[derive(Debug, Clone)]
pub struct FileReportStore {
    dir: PathBuf,
}

impl FileReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ReportStore for FileReportStore {
    async fn save(&self, report_id: &ReportId, table: &ReportTable) -> Result<ReportArtifact, ReportStoreError> {
        let bytes = render_csv(table)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(report_file_name(report_id));
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!(report_id = %report_id, path = %path.display(), rows = table.len(), "Report written");
        Ok(build_artifact(report_id, path.display().to_string(), table, &bytes))
    }

    async fn load(&self, artifact: &ReportArtifact) -> Result<Vec<u8>, ReportStoreError> {
        match tokio::fs::read(&artifact.location).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ReportStoreError::NotFound(artifact.location.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps rendered reports in memory; used by tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryReportStore {
    reports: Arc<RwLock<HashMap<ReportId, Vec<u8>>>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn save(&self, report_id: &ReportId, table: &ReportTable) -> Result<ReportArtifact, ReportStoreError> {
        let bytes = render_csv(table)?;
        let artifact = build_artifact(report_id, format!("memory://{}", report_id), table, &bytes);
        self.reports.write().insert(report_id.clone(), bytes);
        Ok(artifact)
    }

    async fn load(&self, artifact: &ReportArtifact) -> Result<Vec<u8>, ReportStoreError> {
        self.reports
            .read()
            .get(&artifact.report_id)
            .cloned()
            .ok_or_else(|| ReportStoreError::NotFound(artifact.location.clone()))
    }
}
