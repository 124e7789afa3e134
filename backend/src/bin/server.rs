//! Store monitor HTTP server binary.
//!
//! Starts the REST API immediately and loads reference data in the
//! background. Report triggers are refused until loading finishes.
//!
//! # Usage
//!
//! ```bash
//! DATA_DIR=./data REPORTS_DIR=./reports cargo run --bin store-monitor-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `DATA_DIR`: Directory holding the reference CSVs (default: data)
//! - `REPORTS_DIR`: Directory reports are written to (default: reports)
//! - `REPORT_WORKERS`: Reports generated concurrently (default: 2)
//! - `DEFAULT_TIMEZONE`: Timezone for stores without one (default: America/Chicago)
//! - `INTERPOLATION_POLICY`: `forward_fill` or `backfill_first`
//! - `RUST_LOG`: Log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use store_monitor::config::AppConfig;
use store_monitor::db::repository::ReferenceRepository;
use store_monitor::db::LocalRepository;
use store_monitor::http::{create_router, AppState};
use store_monitor::io::report_store::{FileReportStore, ReportStore};
use store_monitor::io::load_reference_data;
use store_monitor::services::{reference_now, ReadinessHandle, ReportOrchestrator, ReportSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting store monitor");

    let config = AppConfig::load().context("Invalid configuration")?;
    info!(
        data_dir = %config.data.dir.display(),
        reports_dir = %config.reports.dir.display(),
        workers = config.reports.workers,
        policy = %config.uptime.interpolation,
        "Configuration loaded"
    );

    let repo = Arc::new(LocalRepository::new());
    let report_store: Arc<dyn ReportStore> = Arc::new(FileReportStore::new(&config.reports.dir));
    let readiness = ReadinessHandle::new();

    let settings = ReportSettings {
        default_timezone: config.uptime.default_timezone.clone(),
        policy: config.uptime.interpolation,
        parallelism: config.reports.parallelism,
    };
    let orchestrator = ReportOrchestrator::start(
        repo.clone(),
        report_store.clone(),
        readiness.clone(),
        settings,
        config.reports.workers,
    );

    tokio::spawn(load_in_background(repo.clone(), config.clone(), readiness));

    let state = AppState::new(repo, report_store, orchestrator);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn load_in_background(repo: Arc<LocalRepository>, config: AppConfig, readiness: ReadinessHandle) {
    info!("Loading reference data...");
    let result = async {
        let summary = load_reference_data(repo.as_ref(), &config.data).await?;
        let max_ts = repo.max_observation_timestamp().await?;
        anyhow::Ok((summary, max_ts))
    }
    .await;

    match result {
        Ok((summary, max_ts)) => {
            let now = reference_now(max_ts);
            info!(
                stores = summary.counts.stores,
                observations = summary.counts.observations,
                issues = summary.counts.issues,
                skipped = summary.skipped_rows,
                %now,
                "Reference data ready"
            );
            readiness.mark_ready(now);
        }
        Err(e) => {
            error!("Reference data failed to load: {:#}", e);
            readiness.mark_failed(format!("{:#}", e));
        }
    }
}
