//! Report-level types: trailing ranges, per-window metrics and report rows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::period::Period;
use super::store::StoreId;

crate::define_string_id!(ReportId);

impl ReportId {
    /// Fresh opaque report identifier.
    pub fn generate() -> Self {
        ReportId(uuid::Uuid::new_v4().to_string())
    }
}

/// Trailing window measured backwards from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingRange {
    LastHour,
    LastDay,
    LastWeek,
}

impl TrailingRange {
    pub const ALL: [TrailingRange; 3] = [
        TrailingRange::LastHour,
        TrailingRange::LastDay,
        TrailingRange::LastWeek,
    ];

    pub fn length(&self) -> Duration {
        match self {
            TrailingRange::LastHour => Duration::hours(1),
            TrailingRange::LastDay => Duration::days(1),
            TrailingRange::LastWeek => Duration::weeks(1),
        }
    }

    pub fn period(&self, now: DateTime<Utc>) -> Period {
        Period::trailing(now, self.length())
    }

    /// Convert a duration to this range's reporting unit
    /// (minutes for the last hour, hours otherwise).
    pub fn to_report_units(&self, duration: Duration) -> f64 {
        let seconds = duration.num_milliseconds() as f64 / 1000.0;
        match self {
            TrailingRange::LastHour => seconds / 60.0,
            TrailingRange::LastDay | TrailingRange::LastWeek => seconds / 3600.0,
        }
    }
}

/// Uptime and downtime accumulated inside one trailing range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMetrics {
    pub uptime: Duration,
    pub downtime: Duration,
}

impl Default for WindowMetrics {
    fn default() -> Self {
        Self {
            uptime: Duration::zero(),
            downtime: Duration::zero(),
        }
    }
}

/// Metrics for all three trailing ranges of one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreMetrics {
    pub last_hour: WindowMetrics,
    pub last_day: WindowMetrics,
    pub last_week: WindowMetrics,
}

impl StoreMetrics {
    pub fn get(&self, range: TrailingRange) -> &WindowMetrics {
        match range {
            TrailingRange::LastHour => &self.last_hour,
            TrailingRange::LastDay => &self.last_day,
            TrailingRange::LastWeek => &self.last_week,
        }
    }

    pub fn set(&mut self, range: TrailingRange, metrics: WindowMetrics) {
        match range {
            TrailingRange::LastHour => self.last_hour = metrics,
            TrailingRange::LastDay => self.last_day = metrics,
            TrailingRange::LastWeek => self.last_week = metrics,
        }
    }
}

/// One row of the exported report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub store_id: StoreId,
    pub uptime_last_hour_minutes: f64,
    pub uptime_last_day_hours: f64,
    pub uptime_last_week_hours: f64,
    pub downtime_last_hour_minutes: f64,
    pub downtime_last_day_hours: f64,
    pub downtime_last_week_hours: f64,
    /// Data-quality marker; `None` when the store was computed cleanly.
    pub error: Option<String>,
}

impl ReportRow {
    pub fn from_metrics(store_id: StoreId, metrics: &StoreMetrics) -> Self {
        let hour = TrailingRange::LastHour;
        let day = TrailingRange::LastDay;
        let week = TrailingRange::LastWeek;
        Self {
            store_id,
            uptime_last_hour_minutes: hour.to_report_units(metrics.last_hour.uptime),
            uptime_last_day_hours: day.to_report_units(metrics.last_day.uptime),
            uptime_last_week_hours: week.to_report_units(metrics.last_week.uptime),
            downtime_last_hour_minutes: hour.to_report_units(metrics.last_hour.downtime),
            downtime_last_day_hours: day.to_report_units(metrics.last_day.downtime),
            downtime_last_week_hours: week.to_report_units(metrics.last_week.downtime),
            error: None,
        }
    }

    /// Zeroed row carrying an error marker.
    pub fn failed(store_id: StoreId, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::from_metrics(store_id, &StoreMetrics::default())
        }
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }
}

/// Full report result, one row per store in store-id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    /// Reference "now" the trailing ranges were measured from.
    pub now: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.rows.iter().filter(|r| r.error.is_some()).count()
    }
}

/// Handle to a persisted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub report_id: ReportId,
    /// Where the store put the artifact (a file path or an in-memory key).
    pub location: String,
    pub row_count: usize,
    /// SHA-256 hex digest of the rendered bytes.
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_units() {
        assert_eq!(TrailingRange::LastHour.to_report_units(Duration::minutes(30)), 30.0);
        assert_eq!(TrailingRange::LastDay.to_report_units(Duration::minutes(90)), 1.5);
        assert_eq!(TrailingRange::LastWeek.to_report_units(Duration::hours(24)), 24.0);
    }

    #[test]
    fn test_trailing_range_lengths() {
        assert_eq!(TrailingRange::LastHour.length(), Duration::hours(1));
        assert_eq!(TrailingRange::LastDay.length(), Duration::hours(24));
        assert_eq!(TrailingRange::LastWeek.length(), Duration::hours(168));
    }

    #[test]
    fn test_row_from_metrics() {
        let metrics = StoreMetrics {
            last_hour: WindowMetrics {
                uptime: Duration::minutes(45),
                downtime: Duration::minutes(15),
            },
            last_day: WindowMetrics {
                uptime: Duration::hours(20),
                downtime: Duration::minutes(30),
            },
            last_week: WindowMetrics::default(),
        };
        let row = ReportRow::from_metrics(StoreId::from("s1"), &metrics);
        assert_eq!(row.uptime_last_hour_minutes, 45.0);
        assert_eq!(row.downtime_last_hour_minutes, 15.0);
        assert_eq!(row.uptime_last_day_hours, 20.0);
        assert_eq!(row.downtime_last_day_hours, 0.5);
        assert_eq!(row.uptime_last_week_hours, 0.0);
        assert!(row.error.is_none());
    }

    #[test]
    fn test_failed_row_is_zeroed() {
        let row = ReportRow::failed(StoreId::from("s2"), "bad rule");
        assert_eq!(row.uptime_last_week_hours, 0.0);
        assert_eq!(row.downtime_last_hour_minutes, 0.0);
        assert_eq!(row.error.as_deref(), Some("bad rule"));
    }

    #[test]
    fn test_report_ids_are_unique() {
        assert_ne!(ReportId::generate(), ReportId::generate());
    }
}
