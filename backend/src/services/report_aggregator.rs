//! Report aggregation across every known store.
//!
//! Store references are pulled from the repository, split into chunks and
//! reconciled on the blocking thread pool. Results are re-assembled in store-id
//! order so the final table is deterministic regardless of scheduling.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;

use super::reconciliation::compute_store_metrics;
use super::timeline::InterpolationPolicy;
use crate::db::repository::{ReferenceRepository, RepositoryError};
use crate::models::{ReportRow, ReportTable, StoreReference, DEFAULT_TIMEZONE};

/// Stores processed between two progress callbacks.
pub const PROGRESS_INTERVAL: usize = 100;

/// Failure that aborts a whole report.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("report worker failed: {0}")]
    Worker(String),
}

/// Knobs that shape a report run.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub default_timezone: String,
    pub policy: InterpolationPolicy,
    /// Number of chunks computed concurrently.
    pub parallelism: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            default_timezone: DEFAULT_TIMEZONE.to_string(),
            policy: InterpolationPolicy::default(),
            parallelism: 4,
        }
    }
}

/// Compute one report row; data-quality problems become the row's marker.
pub fn compute_row(store: &StoreReference, now: DateTime<Utc>, settings: &ReportSettings) -> ReportRow {
    match compute_store_metrics(store, now, settings.policy, &settings.default_timezone) {
        Ok(metrics) => {
            let marker = if store.issues.is_empty() {
                None
            } else {
                Some(
                    store
                        .issues
                        .iter()
                        .map(|issue| issue.message.as_str())
                        .collect::<Vec<_>>()
                        .join("; "),
                )
            };
            ReportRow::from_metrics(store.store_id.clone(), &metrics).with_error(marker)
        }
        Err(e) => {
            tracing::warn!(store_id = %store.store_id, error = %e, "Store computed with zeroed metrics");
            ReportRow::failed(store.store_id.clone(), e.to_string())
        }
    }
}

/// Build the full report table for the dataset held by `repo`.
///
/// # Arguments
/// * `repo` - Reference data source
/// * `now` - Dataset-wide reference instant
/// * `settings` - Timezone default, interpolation policy and parallelism
/// * `progress` - Called with `(done, total)` as chunks complete
///
/// # Errors
/// A repository failure or a panicking worker aborts the whole report.
pub async fn aggregate_report<F>(
    repo: Arc<dyn ReferenceRepository>,
    now: DateTime<Utc>,
    settings: &ReportSettings,
    progress: F,
) -> Result<ReportTable, AggregationError>
where
    F: Fn(usize, usize) + Send + Sync,
{
    let store_ids = repo.list_store_ids().await?;
    let total = store_ids.len();
    tracing::info!(stores = total, %now, policy = %settings.policy, "Aggregating report");

    let mut stores = Vec::with_capacity(total);
    for store_id in &store_ids {
        stores.push(repo.fetch_store_reference(store_id).await?);
    }

    let chunk_size = total.div_ceil(settings.parallelism.max(1)).clamp(1, PROGRESS_INTERVAL);
    let mut rows = Vec::with_capacity(total);
    let mut pending = stores.into_iter().peekable();
    let mut batch_index = 0usize;

    while pending.peek().is_some() {
        // At most `parallelism` chunks in flight per batch.
        let handles: Vec<_> = (0..settings.parallelism.max(1))
            .filter_map(|_| {
                let chunk: Vec<StoreReference> = pending.by_ref().take(chunk_size).collect();
                if chunk.is_empty() {
                    return None;
                }
                let settings = settings.clone();
                Some(tokio::task::spawn_blocking(move || {
                    chunk
                        .iter()
                        .map(|store| compute_row(store, now, &settings))
                        .collect::<Vec<_>>()
                }))
            })
            .collect();

        for result in join_all(handles).await {
            let chunk_rows = result.map_err(|e| AggregationError::Worker(e.to_string()))?;
            rows.extend(chunk_rows);
        }

        batch_index += 1;
        progress(rows.len(), total);
        tracing::debug!(batch = batch_index, done = rows.len(), total, "Report batch finished");
    }

    Ok(ReportTable { now, rows })
}
