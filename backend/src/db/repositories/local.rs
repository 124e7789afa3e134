//! In-memory local repository implementation.
//!
//! All reference data is kept in memory in per-store `HashMap`s, which is
//! sufficient for the dataset sizes the service handles and keeps report
//! computation free of I/O once loading has finished.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::db::repository::{
    ErrorContext, ReferenceCounts, ReferenceRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    BusinessHourRule, DataIssue, StatusObservation, StoreId, StoreReference, StoreTimezone,
};

/// In-memory local repository.
///
/// # Example
/// ```
/// use store_monitor::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.observation_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    observations: HashMap<StoreId, Vec<StatusObservation>>,
    business_hours: HashMap<StoreId, Vec<BusinessHourRule>>,
    timezones: HashMap<StoreId, String>,
    issues: HashMap<StoreId, Vec<DataIssue>>,
    max_timestamp: Option<DateTime<Utc>>,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            observations: HashMap::new(),
            business_hours: HashMap::new(),
            timezones: HashMap::new(),
            issues: HashMap::new(),
            max_timestamp: None,
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Total number of observations stored.
    pub fn observation_count(&self) -> usize {
        self.data.read().observations.values().map(Vec::len).sum()
    }

    /// Check if any input mentions the store.
    pub fn has_store(&self, store_id: &StoreId) -> bool {
        let data = self.data.read();
        data.observations.contains_key(store_id)
            || data.business_hours.contains_key(store_id)
            || data.timezones.contains_key(store_id)
            || data.issues.contains_key(store_id)
    }

    fn ensure_healthy(&self, operation: &str) -> RepositoryResult<()> {
        if self.data.read().is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection("Repository is unavailable").with_operation(operation))
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReferenceRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn store_observations(
        &self,
        observations: Vec<StatusObservation>,
    ) -> RepositoryResult<usize> {
        self.ensure_healthy("store_observations")?;
        let count = observations.len();
        let mut data = self.data.write();
        for obs in observations {
            if data.max_timestamp.map_or(true, |max| obs.timestamp_utc > max) {
                data.max_timestamp = Some(obs.timestamp_utc);
            }
            data.observations
                .entry(obs.store_id.clone())
                .or_default()
                .push(obs);
        }
        Ok(count)
    }

    async fn store_business_hours(&self, rules: Vec<BusinessHourRule>) -> RepositoryResult<usize> {
        self.ensure_healthy("store_business_hours")?;
        let count = rules.len();
        let mut data = self.data.write();
        for rule in rules {
            data.business_hours
                .entry(rule.store_id.clone())
                .or_default()
                .push(rule);
        }
        Ok(count)
    }

    async fn store_timezones(&self, timezones: Vec<StoreTimezone>) -> RepositoryResult<usize> {
        self.ensure_healthy("store_timezones")?;
        let count = timezones.len();
        let mut data = self.data.write();
        for tz in timezones {
            if tz.timezone.trim().is_empty() {
                return Err(RepositoryError::validation_with_context(
                    "Empty timezone identifier",
                    ErrorContext::new("store_timezones")
                        .with_entity("store_timezone")
                        .with_entity_id(&tz.store_id),
                ));
            }
            data.timezones.insert(tz.store_id, tz.timezone);
        }
        Ok(count)
    }

    async fn record_data_issues(&self, issues: Vec<DataIssue>) -> RepositoryResult<usize> {
        self.ensure_healthy("record_data_issues")?;
        let count = issues.len();
        let mut data = self.data.write();
        for issue in issues {
            data.issues
                .entry(issue.store_id.clone())
                .or_default()
                .push(issue);
        }
        Ok(count)
    }

    async fn list_store_ids(&self) -> RepositoryResult<Vec<StoreId>> {
        self.ensure_healthy("list_store_ids")?;
        let data = self.data.read();
        let ids: BTreeSet<&StoreId> = data
            .observations
            .keys()
            .chain(data.business_hours.keys())
            .chain(data.timezones.keys())
            .chain(data.issues.keys())
            .collect();
        Ok(ids.into_iter().cloned().collect())
    }

    async fn fetch_store_reference(&self, store_id: &StoreId) -> RepositoryResult<StoreReference> {
        self.ensure_healthy("fetch_store_reference")?;
        if !self.has_store(store_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Store {} not found", store_id),
                ErrorContext::new("fetch_store_reference")
                    .with_entity("store")
                    .with_entity_id(store_id),
            ));
        }

        let data = self.data.read();
        Ok(StoreReference {
            store_id: store_id.clone(),
            observations: data.observations.get(store_id).cloned().unwrap_or_default(),
            business_hours: data.business_hours.get(store_id).cloned().unwrap_or_default(),
            timezone: data.timezones.get(store_id).cloned(),
            issues: data.issues.get(store_id).cloned().unwrap_or_default(),
        })
    }

    async fn max_observation_timestamp(&self) -> RepositoryResult<Option<DateTime<Utc>>> {
        self.ensure_healthy("max_observation_timestamp")?;
        Ok(self.data.read().max_timestamp)
    }

    async fn counts(&self) -> RepositoryResult<ReferenceCounts> {
        let stores = self.list_store_ids().await?.len();
        let data = self.data.read();
        Ok(ReferenceCounts {
            stores,
            observations: data.observations.values().map(Vec::len).sum(),
            business_hours: data.business_hours.values().map(Vec::len).sum(),
            timezones: data.timezones.len(),
            issues: data.issues.values().map(Vec::len).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IssueSource, StoreStatus};
    use chrono::{NaiveTime, TimeZone};

    fn obs(store: &str, hour: u32, status: StoreStatus) -> StatusObservation {
        StatusObservation::new(store, Utc.with_ymd_and_hms(2023, 1, 23, hour, 0, 0).unwrap(), status)
    }

    #[tokio::test]
    async fn test_store_ids_are_union_of_inputs() {
        let repo = LocalRepository::new();
        repo.store_observations(vec![obs("b", 1, StoreStatus::Active)])
            .await
            .unwrap();
        repo.store_business_hours(vec![BusinessHourRule::new(
            "c",
            0,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )])
        .await
        .unwrap();
        repo.store_timezones(vec![StoreTimezone {
            store_id: StoreId::from("a"),
            timezone: "Asia/Tokyo".to_string(),
        }])
        .await
        .unwrap();

        let ids = repo.list_store_ids().await.unwrap();
        assert_eq!(ids, vec![StoreId::from("a"), StoreId::from("b"), StoreId::from("c")]);
    }

    #[tokio::test]
    async fn test_max_timestamp_tracks_latest() {
        let repo = LocalRepository::new();
        assert!(repo.max_observation_timestamp().await.unwrap().is_none());
        repo.store_observations(vec![
            obs("s1", 5, StoreStatus::Active),
            obs("s2", 9, StoreStatus::Inactive),
            obs("s1", 7, StoreStatus::Active),
        ])
        .await
        .unwrap();
        assert_eq!(
            repo.max_observation_timestamp().await.unwrap(),
            Some(Utc.with_ymd_and_hms(2023, 1, 23, 9, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_fetch_unknown_store_is_not_found() {
        let repo = LocalRepository::new();
        let err = repo
            .fetch_store_reference(&StoreId::from("ghost"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_store_reference_collects_everything() {
        let repo = LocalRepository::new();
        repo.store_observations(vec![obs("s1", 5, StoreStatus::Active)])
            .await
            .unwrap();
        repo.record_data_issues(vec![DataIssue::new("s1", IssueSource::Status, "bad timestamp")])
        .await
        .unwrap();

        let store = repo.fetch_store_reference(&StoreId::from("s1")).await.unwrap();
        assert_eq!(store.observations.len(), 1);
        assert!(store.business_hours.is_empty());
        assert!(store.timezone.is_none());
        assert_eq!(store.issues.len(), 1);
    }

    #[tokio::test]
    async fn test_unhealthy_repository_rejects_reads() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        assert!(repo.list_store_ids().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_timezone_is_rejected() {
        let repo = LocalRepository::new();
        let result = repo
            .store_timezones(vec![StoreTimezone {
                store_id: StoreId::from("s1"),
                timezone: "  ".to_string(),
            }])
            .await;
        assert!(matches!(result, Err(RepositoryError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn test_clear_keeps_health_flag() {
        let repo = LocalRepository::new();
        repo.store_observations(vec![obs("s1", 5, StoreStatus::Active)])
            .await
            .unwrap();
        repo.clear();
        assert_eq!(repo.observation_count(), 0);
        assert!(repo.health_check().await.unwrap());
    }
}
