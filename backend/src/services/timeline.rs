//! Timeline construction from sparse status polls.
//!
//! A store is polled irregularly. Each poll's status is taken to hold from its
//! own timestamp until the next poll, and the last poll holds until "now".
//! The result is a gap-free, ordered sequence of status segments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{Period, StatusObservation, StoreStatus};

/// How to treat the time before a store's first observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationPolicy {
    /// The timeline starts at the first observation; earlier time is unknown
    /// and counts as neither uptime nor downtime.
    #[default]
    ForwardFill,
    /// The first observation's status is also extended back to the horizon.
    BackfillFirst,
}

impl fmt::Display for InterpolationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolationPolicy::ForwardFill => write!(f, "forward_fill"),
            InterpolationPolicy::BackfillFirst => write!(f, "backfill_first"),
        }
    }
}

impl FromStr for InterpolationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "forward_fill" | "forward" => Ok(Self::ForwardFill),
            "backfill_first" | "backfill" => Ok(Self::BackfillFirst),
            other => Err(format!("Unknown interpolation policy: {}", other)),
        }
    }
}

/// A stretch of time with a single known status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub period: Period,
    pub status: StoreStatus,
}

/// Ordered, contiguous status segments for one store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    segments: Vec<TimelineSegment>,
}

impl Timeline {
    pub fn segments(&self) -> &[TimelineSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.segments.first().map(|s| s.period.start)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.segments.last().map(|s| s.period.stop)
    }

    /// True when every segment ends exactly where the next one starts.
    pub fn is_contiguous(&self) -> bool {
        self.segments
            .windows(2)
            .all(|pair| pair[0].period.stop == pair[1].period.start)
    }

    fn push(&mut self, period: Period, status: StoreStatus) {
        match self.segments.last_mut() {
            Some(last) if last.status == status && last.period.stop == period.start => {
                last.period.stop = period.stop;
            }
            _ => self.segments.push(TimelineSegment { period, status }),
        }
    }
}

/// Build a store's timeline from its observations.
///
/// # Arguments
/// * `observations` - All observations for one store, in any order
/// * `now` - Dataset-wide reference instant; the timeline ends here
/// * `policy` - Treatment of the time before the first observation
/// * `horizon` - Earliest instant a `BackfillFirst` timeline may reach
///
/// Observations sharing a timestamp keep their input order, so the later
/// input wins. Observations after `now` are ignored.
pub fn build_timeline(
    observations: &[StatusObservation],
    now: DateTime<Utc>,
    policy: InterpolationPolicy,
    horizon: DateTime<Utc>,
) -> Timeline {
    let mut sorted: Vec<&StatusObservation> = observations
        .iter()
        .filter(|o| o.timestamp_utc <= now)
        .collect();
    sorted.sort_by_key(|o| o.timestamp_utc);

    let mut timeline = Timeline::default();
    for (idx, obs) in sorted.iter().enumerate() {
        let stop = sorted
            .get(idx + 1)
            .map(|next| next.timestamp_utc)
            .unwrap_or(now);
        if let Some(period) = Period::new(obs.timestamp_utc, stop) {
            timeline.push(period, obs.status);
        }
    }

    if policy == InterpolationPolicy::BackfillFirst {
        if let Some(first) = timeline.segments.first_mut() {
            if horizon < first.period.start {
                first.period.start = horizon;
            }
        } else if let Some(last) = sorted.last() {
            // Every observation sits exactly at `now`.
            if let Some(period) = Period::new(horizon, now) {
                timeline.push(period, last.status);
            }
        }
    }

    timeline
}
