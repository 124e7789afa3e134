//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::ReferenceRepository;
use crate::io::report_store::ReportStore;
use crate::services::report_orchestrator::ReportOrchestrator;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Reference data, used for health reporting
    pub repository: Arc<dyn ReferenceRepository>,
    /// Where finished reports are read back from
    pub report_store: Arc<dyn ReportStore>,
    pub orchestrator: ReportOrchestrator,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn ReferenceRepository>,
        report_store: Arc<dyn ReportStore>,
        orchestrator: ReportOrchestrator,
    ) -> Self {
        Self {
            repository,
            report_store,
            orchestrator,
        }
    }
}
