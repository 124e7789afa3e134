#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use store_monitor::config::DataConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Status polls for three stores. The latest poll, and so "now", is
/// Monday 2023-01-23 22:00 UTC (16:00 in Chicago).
pub const STATUS_CSV: &str = "\
store_id,status,timestamp_utc
S1,active,2023-01-23 20:00:00.000000 UTC
S1,inactive,2023-01-23 21:30:00.000000 UTC
S2,inactive,2023-01-22 22:00:00 UTC
S3,active,2023-01-23 21:59:00 UTC
S3,active,2023-01-23 22:00:00 UTC
";

/// S1 opens Mondays 09:00-17:00 local; S3's rule is overnight and malformed.
pub const MENU_HOURS_CSV: &str = "\
store_id,dayOfWeek,start_time_local,end_time_local
S1,0,09:00:00,17:00:00
S3,0,22:00:00,06:00:00
S4,2,10:00:00,18:00:00
";

pub const TIMEZONES_CSV: &str = "\
store_id,timezone_str
S1,America/Chicago
S2,America/New_York
";

/// Write the fixture dataset into `dir` and return its data configuration.
pub fn write_dataset(dir: &Path) -> DataConfig {
    let config = DataConfig {
        dir: dir.to_path_buf(),
        ..DataConfig::default()
    };
    fs::write(config.status_path(), STATUS_CSV).unwrap();
    fs::write(config.business_hours_path(), MENU_HOURS_CSV).unwrap();
    fs::write(config.timezones_path(), TIMEZONES_CSV).unwrap();
    config
}
