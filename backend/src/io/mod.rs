//! File I/O: CSV ingestion of reference data and report persistence.
//!
//! # Example
//!
//! ```no_run
//! use store_monitor::config::DataConfig;
//! use store_monitor::db::LocalRepository;
//! use store_monitor::io::load_reference_data;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let repo = LocalRepository::new();
//! let summary = load_reference_data(&repo, &DataConfig::default()).await?;
//! println!("Loaded {} stores", summary.counts.stores);
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod loaders;
pub mod report_store;

pub use loaders::{load_reference_data, LoadSummary};
pub use report_store::{
    render_csv, FileReportStore, InMemoryReportStore, ReportStore, ReportStoreError,
};
