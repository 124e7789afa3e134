//! Store reference data: status polls, weekly business hours and timezones.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

crate::define_string_id!(StoreId);

/// Timezone applied to stores with no timezone record.
pub const DEFAULT_TIMEZONE: &str = "America/Chicago";

/// Result of a single "is the store open" poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Inactive,
}

impl StoreStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, StoreStatus::Active)
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreStatus::Active => write!(f, "active"),
            StoreStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for StoreStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("Unknown store status: {}", other)),
        }
    }
}

/// A point-in-time status observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusObservation {
    pub store_id: StoreId,
    pub timestamp_utc: DateTime<Utc>,
    pub status: StoreStatus,
}

impl StatusObservation {
    pub fn new(store_id: impl Into<StoreId>, timestamp_utc: DateTime<Utc>, status: StoreStatus) -> Self {
        Self {
            store_id: store_id.into(),
            timestamp_utc,
            status,
        }
    }
}

/// Weekly opening rule in store-local wall-clock time.
///
/// `day_of_week` is 0 for Monday through 6 for Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHourRule {
    pub store_id: StoreId,
    pub day_of_week: u8,
    pub start_time_local: NaiveTime,
    pub end_time_local: NaiveTime,
}

impl BusinessHourRule {
    pub fn new(
        store_id: impl Into<StoreId>,
        day_of_week: u8,
        start_time_local: NaiveTime,
        end_time_local: NaiveTime,
    ) -> Self {
        Self {
            store_id: store_id.into(),
            day_of_week,
            start_time_local,
            end_time_local,
        }
    }
}

/// Timezone assignment for a store (IANA identifier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTimezone {
    pub store_id: StoreId,
    pub timezone: String,
}

/// Reference input a data-quality issue was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSource {
    Status,
    BusinessHours,
    Timezone,
}

/// Data-quality problem found while ingesting a store's records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIssue {
    pub store_id: StoreId,
    pub source: IssueSource,
    pub message: String,
}

impl DataIssue {
    pub fn new(store_id: impl Into<StoreId>, source: IssueSource, message: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            source,
            message: message.into(),
        }
    }
}

/// Everything the report needs to know about one store.
#[derive(Debug, Clone, Default)]
pub struct StoreReference {
    pub store_id: StoreId,
    pub observations: Vec<StatusObservation>,
    pub business_hours: Vec<BusinessHourRule>,
    /// `None` when the store has no timezone record.
    pub timezone: Option<String>,
    pub issues: Vec<DataIssue>,
}

impl Default for StoreId {
    fn default() -> Self {
        StoreId(String::new())
    }
}

impl StoreReference {
    pub fn new(store_id: impl Into<StoreId>) -> Self {
        Self {
            store_id: store_id.into(),
            ..Default::default()
        }
    }

    /// Timezone identifier to use, falling back to `default_timezone`.
    pub fn timezone_or<'a>(&'a self, default_timezone: &'a str) -> &'a str {
        self.timezone.as_deref().unwrap_or(default_timezone)
    }

    /// Business-hour rows that were declared but none survived parsing.
    ///
    /// Such a store is not open 24x7; its schedule is unknown.
    pub fn business_hours_unusable(&self) -> bool {
        self.business_hours.is_empty()
            && self
                .issues
                .iter()
                .any(|issue| issue.source == IssueSource::BusinessHours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str() {
        assert_eq!("active".parse::<StoreStatus>().unwrap(), StoreStatus::Active);
        assert_eq!(" Inactive ".parse::<StoreStatus>().unwrap(), StoreStatus::Inactive);
        assert!("closed".parse::<StoreStatus>().is_err());
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&StoreStatus::Inactive).unwrap();
        assert_eq!(json, "\"inactive\"");
    }

    #[test]
    fn test_store_id_is_transparent() {
        let id = StoreId::from("8419537941919820732");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"8419537941919820732\"");
        assert_eq!(id.to_string(), "8419537941919820732");
    }

    #[test]
    fn test_timezone_fallback() {
        let mut store = StoreReference::new("s1");
        assert_eq!(store.timezone_or(DEFAULT_TIMEZONE), "America/Chicago");
        store.timezone = Some("Asia/Kolkata".to_string());
        assert_eq!(store.timezone_or(DEFAULT_TIMEZONE), "Asia/Kolkata");
    }

    #[test]
    fn test_business_hours_unusable_only_without_parsed_rules() {
        let mut store = StoreReference::new("s1");
        assert!(!store.business_hours_unusable());

        store
            .issues
            .push(DataIssue::new("s1", IssueSource::Status, "bad timestamp"));
        assert!(!store.business_hours_unusable());

        store
            .issues
            .push(DataIssue::new("s1", IssueSource::BusinessHours, "bad start time"));
        assert!(store.business_hours_unusable());

        store.business_hours.push(BusinessHourRule::new(
            "s1",
            0,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        ));
        assert!(!store.business_hours_unusable());
    }
}
