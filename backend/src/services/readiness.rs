//! Reference-data readiness.
//!
//! Reference data loads once in the background at startup. Until it finishes
//! no report can be triggered; afterwards the dataset-wide "now" is fixed.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Load state of the reference dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Loading,
    Ready { now: DateTime<Utc> },
    Failed(String),
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Loading => write!(f, "loading"),
            Readiness::Ready { .. } => write!(f, "ready"),
            Readiness::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Shared, cloneable handle on the readiness state.
#[derive(Clone)]
pub struct ReadinessHandle {
    state: Arc<RwLock<Readiness>>,
}

impl ReadinessHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(Readiness::Loading)),
        }
    }

    /// Handle that is already ready at `now`.
    pub fn ready_at(now: DateTime<Utc>) -> Self {
        let handle = Self::new();
        handle.mark_ready(now);
        handle
    }

    pub fn current(&self) -> Readiness {
        self.state.read().clone()
    }

    pub fn mark_ready(&self, now: DateTime<Utc>) {
        *self.state.write() = Readiness::Ready { now };
    }

    pub fn mark_failed(&self, reason: impl Into<String>) {
        *self.state.write() = Readiness::Failed(reason.into());
    }
}

impl Default for ReadinessHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Dataset-wide "now": the latest observation, or the wall clock for an
/// empty dataset.
pub fn reference_now(max_observation: Option<DateTime<Utc>>) -> DateTime<Utc> {
    max_observation.unwrap_or_else(Utc::now)
}
