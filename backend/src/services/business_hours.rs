//! Business window resolution.
//!
//! Converts a store's weekly local-time opening rules into absolute UTC
//! windows inside a requested range. Local wall-clock times are mapped through
//! the IANA timezone database so every calendar date gets its own offset,
//! which keeps windows correct across daylight-saving transitions.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::error::StoreError;
use crate::models::{merge_periods, BusinessHourRule, Period, StoreId};

/// Which end of a window a local time marks; decides how DST folds resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

/// Parse an IANA timezone identifier for a store.
pub fn parse_timezone(store_id: &StoreId, timezone: &str) -> Result<Tz, StoreError> {
    timezone
        .trim()
        .parse::<Tz>()
        .map_err(|_| StoreError::UnknownTimezone {
            store_id: store_id.clone(),
            timezone: timezone.to_string(),
        })
}

/// Reject rules the resolver cannot express.
///
/// A rule ending before it starts (an overnight rule) and a day of week
/// outside `0..=6` are reported rather than corrected.
pub fn validate_rules(store_id: &StoreId, rules: &[BusinessHourRule]) -> Result<(), StoreError> {
    for rule in rules {
        let reason = if rule.day_of_week > 6 {
            Some("day of week must be 0 (Monday) to 6 (Sunday)")
        } else if rule.end_time_local < rule.start_time_local {
            Some("end time is before start time")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(StoreError::MalformedRule {
                store_id: store_id.clone(),
                day_of_week: rule.day_of_week,
                start: rule.start_time_local,
                end: rule.end_time_local,
                reason,
            });
        }
    }
    Ok(())
}

/// Resolve the UTC windows during which the store should be open inside `range`.
///
/// # Arguments
/// * `store_id` - Store the rules belong to (for error reporting)
/// * `rules` - The store's full weekly rule set; empty means open 24x7
/// * `tz` - The store's timezone
/// * `range` - UTC range to resolve, typically `[now - length, now)`
///
/// # Returns
/// Sorted, non-overlapping windows, each clipped to `range`.
pub fn resolve_business_windows(
    store_id: &StoreId,
    rules: &[BusinessHourRule],
    tz: Tz,
    range: &Period,
) -> Result<Vec<Period>, StoreError> {
    validate_rules(store_id, rules)?;

    let first_day = range.start.with_timezone(&tz).date_naive();
    let last_day = range.stop.with_timezone(&tz).date_naive();

    let mut windows = Vec::new();
    let mut day = first_day;
    while day <= last_day {
        if rules.is_empty() {
            if let Some(window) = whole_day_window(tz, day) {
                windows.extend(window.clip(range));
            }
        } else {
            let weekday = day.weekday().num_days_from_monday() as u8;
            for rule in rules.iter().filter(|r| r.day_of_week == weekday) {
                let start = local_to_utc(tz, day.and_time(rule.start_time_local), Edge::Start);
                let stop = local_to_utc(tz, day.and_time(rule.end_time_local), Edge::End);
                if let (Some(start), Some(stop)) = (start, stop) {
                    windows.extend(Period::new(start, stop).and_then(|w| w.clip(range)));
                }
            }
        }

        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Ok(merge_periods(windows))
}

/// Window from local midnight to the following local midnight.
fn whole_day_window(tz: Tz, day: NaiveDate) -> Option<Period> {
    let next = day.succ_opt()?;
    let start = local_to_utc(tz, day.and_time(NaiveTime::MIN), Edge::Start)?;
    let stop = local_to_utc(tz, next.and_time(NaiveTime::MIN), Edge::Start)?;
    Period::new(start, stop)
}

/// Map a local wall-clock time to UTC.
///
/// Ambiguous times (clocks falling back) take the earliest instant for window
/// starts and the latest for window ends. Times inside a spring-forward gap
/// are pushed forward by the size of the gap.
fn local_to_utc(tz: Tz, local: NaiveDateTime, edge: Edge) -> Option<DateTime<Utc>> {
    let mapped = tz.from_local_datetime(&local);
    let resolved = match edge {
        Edge::Start => mapped.earliest(),
        Edge::End => mapped.latest(),
    };
    if let Some(dt) = resolved {
        return Some(dt.with_timezone(&Utc));
    }

    for hours_back in 1..=3 {
        let shift = Duration::hours(hours_back);
        if let Some(dt) = tz.from_local_datetime(&(local - shift)).earliest() {
            return Some(dt.with_timezone(&Utc) + shift);
        }
    }

    tracing::warn!(%local, timezone = %tz, "Unable to resolve local time");
    None
}
