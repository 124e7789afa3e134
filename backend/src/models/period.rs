use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-open UTC time interval `[start, stop)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

impl Period {
    /// Create a period, returning `None` when it would be empty.
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Option<Self> {
        if start < stop {
            Some(Self { start, stop })
        } else {
            None
        }
    }

    /// Period ending at `stop` and spanning `length` backwards.
    pub fn trailing(stop: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start: stop - length,
            stop,
        }
    }

    pub fn duration(&self) -> Duration {
        self.stop - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.stop
    }

    /// Overlap of two periods, `None` when they only touch or are disjoint.
    pub fn intersect(&self, other: &Period) -> Option<Period> {
        Period::new(self.start.max(other.start), self.stop.min(other.stop))
    }

    /// Clip to `bounds`; alias of [`Period::intersect`] that reads better at call sites.
    pub fn clip(&self, bounds: &Period) -> Option<Period> {
        self.intersect(bounds)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {})", self.start.to_rfc3339(), self.stop.to_rfc3339())
    }
}

/// Sort periods and merge any that overlap or touch.
pub fn merge_periods(mut periods: Vec<Period>) -> Vec<Period> {
    periods.sort();
    let mut merged: Vec<Period> = Vec::with_capacity(periods.len());
    for period in periods {
        match merged.last_mut() {
            Some(last) if period.start <= last.stop => {
                if period.stop > last.stop {
                    last.stop = period.stop;
                }
            }
            _ => merged.push(period),
        }
    }
    merged
}

/// Sum of the durations of a set of periods.
pub fn total_duration(periods: &[Period]) -> Duration {
    periods
        .iter()
        .fold(Duration::zero(), |acc, p| acc + p.duration())
}
