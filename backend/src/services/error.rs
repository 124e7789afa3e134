//! Per-store data-quality errors.
//!
//! These never fail a whole report: the aggregator turns them into a row
//! marker and moves on to the next store.

use chrono::NaiveTime;
use thiserror::Error;

use crate::models::StoreId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("malformed business hours for store {store_id}: day {day_of_week} {start}-{end} ({reason})")]
    MalformedRule {
        store_id: StoreId,
        day_of_week: u8,
        start: NaiveTime,
        end: NaiveTime,
        reason: &'static str,
    },

    #[error("unknown timezone '{timezone}' for store {store_id}")]
    UnknownTimezone { store_id: StoreId, timezone: String },

    #[error("no usable business hours for store {store_id}: {details}")]
    UnusableBusinessHours { store_id: StoreId, details: String },
}

impl StoreError {
    pub fn store_id(&self) -> &StoreId {
        match self {
            StoreError::MalformedRule { store_id, .. } => store_id,
            StoreError::UnknownTimezone { store_id, .. } => store_id,
            StoreError::UnusableBusinessHours { store_id, .. } => store_id,
        }
    }
}
