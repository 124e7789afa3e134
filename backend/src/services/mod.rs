//! Service layer for uptime computation and report orchestration.
//!
//! The pure computation lives in [`timeline`], [`business_hours`] and
//! [`reconciliation`]. [`report_aggregator`] runs it across every store and
//! [`report_orchestrator`] turns that into background jobs tracked by
//! [`job_tracker`].

pub mod business_hours;
pub mod error;
pub mod job_tracker;
pub mod readiness;
pub mod reconciliation;
pub mod report_aggregator;
pub mod report_orchestrator;
pub mod timeline;

pub use business_hours::{parse_timezone, resolve_business_windows};
pub use error::StoreError;
pub use job_tracker::{JobTracker, LogEntry, LogLevel, ReportJob, ReportState};
pub use readiness::{reference_now, Readiness, ReadinessHandle};
pub use reconciliation::{compute_store_metrics, reconcile};
pub use report_aggregator::{aggregate_report, AggregationError, ReportSettings};
pub use report_orchestrator::{OrchestratorError, ReportOrchestrator, ReportRequest, ReportStatus};
pub use timeline::{build_timeline, InterpolationPolicy, Timeline, TimelineSegment};
