//! Repository trait for store reference data.
//!
//! Reference data (status observations, business hours, timezones) is loaded
//! once at startup and only read afterwards. Report computation talks to the
//! repository exclusively through [`ReferenceRepository`].

pub mod error;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::models::{
    BusinessHourRule, DataIssue, StatusObservation, StoreId, StoreReference, StoreTimezone,
};

/// Record counts held by a repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCounts {
    pub stores: usize,
    pub observations: usize,
    pub business_hours: usize,
    pub timezones: usize,
    pub issues: usize,
}

/// Repository trait for store reference data.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to be shared across report workers.
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// Check that the repository is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Append status observations. Returns the number stored.
    async fn store_observations(
        &self,
        observations: Vec<StatusObservation>,
    ) -> RepositoryResult<usize>;

    /// Append business-hour rules. Returns the number stored.
    async fn store_business_hours(&self, rules: Vec<BusinessHourRule>) -> RepositoryResult<usize>;

    /// Upsert timezone assignments. Returns the number stored.
    async fn store_timezones(&self, timezones: Vec<StoreTimezone>) -> RepositoryResult<usize>;

    /// Record data-quality issues found during ingestion.
    async fn record_data_issues(&self, issues: Vec<DataIssue>) -> RepositoryResult<usize>;

    /// All known store ids, sorted, across every reference input.
    async fn list_store_ids(&self) -> RepositoryResult<Vec<StoreId>>;

    /// Fetch everything known about one store.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` if the store appears in no input
    async fn fetch_store_reference(&self, store_id: &StoreId) -> RepositoryResult<StoreReference>;

    /// Latest observation timestamp across the whole dataset.
    async fn max_observation_timestamp(&self) -> RepositoryResult<Option<DateTime<Utc>>>;

    /// Record counts, used for startup logging and health output.
    async fn counts(&self) -> RepositoryResult<ReferenceCounts>;
}
