//! Reconciliation of status timelines against business windows.
//!
//! Uptime is the time a store was `active` while it was supposed to be open,
//! downtime the time it was `inactive`. Both are computed with a single linear
//! sweep over two sorted interval lists.

use chrono::{DateTime, Duration, Utc};

use super::business_hours::{parse_timezone, resolve_business_windows};
use super::error::StoreError;
use super::timeline::{build_timeline, InterpolationPolicy, Timeline};
use crate::models::{
    IssueSource, Period, StoreMetrics, StoreReference, StoreStatus, TrailingRange, WindowMetrics,
};

/// Sum active and inactive overlap between a timeline and business windows.
///
/// Both inputs must be sorted and internally non-overlapping. Time covered by
/// a window but not by the timeline counts as neither uptime nor downtime.
pub fn reconcile(timeline: &Timeline, windows: &[Period]) -> WindowMetrics {
    let segments = timeline.segments();
    let mut metrics = WindowMetrics::default();
    let (mut i, mut j) = (0, 0);

    while i < segments.len() && j < windows.len() {
        let segment = &segments[i];
        let window = &windows[j];

        if let Some(overlap) = segment.period.intersect(window) {
            match segment.status {
                StoreStatus::Active => metrics.uptime = metrics.uptime + overlap.duration(),
                StoreStatus::Inactive => metrics.downtime = metrics.downtime + overlap.duration(),
            }
        }

        // Advance whichever interval ends first; both on a tie.
        if segment.period.stop <= window.stop {
            i += 1;
        }
        if window.stop <= segment.period.stop {
            j += 1;
        }
    }

    metrics
}

/// Compute uptime and downtime over every trailing range for one store.
///
/// # Arguments
/// * `store` - Everything known about the store
/// * `now` - Dataset-wide reference instant
/// * `policy` - Treatment of time before the first observation
/// * `default_timezone` - Timezone used when the store has none
///
/// # Errors
/// Returns a [`StoreError`] when the store's timezone is unknown, one of its
/// business-hour rules is malformed, or it declared business hours and none of
/// them could be parsed.
pub fn compute_store_metrics(
    store: &StoreReference,
    now: DateTime<Utc>,
    policy: InterpolationPolicy,
    default_timezone: &str,
) -> Result<StoreMetrics, StoreError> {
    if store.business_hours_unusable() {
        return Err(StoreError::UnusableBusinessHours {
            store_id: store.store_id.clone(),
            details: store
                .issues
                .iter()
                .filter(|issue| issue.source == IssueSource::BusinessHours)
                .map(|issue| issue.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        });
    }
    let tz = parse_timezone(&store.store_id, store.timezone_or(default_timezone))?;
    let horizon = now - widest_range();
    let timeline = build_timeline(&store.observations, now, policy, horizon);

    let mut metrics = StoreMetrics::default();
    for range in TrailingRange::ALL {
        let period = range.period(now);
        let windows = resolve_business_windows(&store.store_id, &store.business_hours, tz, &period)?;
        metrics.set(range, reconcile(&timeline, &windows));
    }
    Ok(metrics)
}

fn widest_range() -> Duration {
    TrailingRange::ALL
        .iter()
        .map(TrailingRange::length)
        .max()
        .unwrap_or_else(|| Duration::weeks(1))
}

#[cfg(test)]
#[path = "reconciliation_tests.rs"]
mod tests;
