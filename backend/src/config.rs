//! Application configuration file support.
//!
//! Settings are read from a TOML file (`store-monitor.toml`) where every field
//! has a default, then overridden by environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::DEFAULT_TIMEZONE;
use crate::services::timeline::InterpolationPolicy;

/// Name of the configuration file searched for at startup.
pub const CONFIG_FILE_NAME: &str = "store-monitor.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Full application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub uptime: UptimeConfig,
}

/// HTTP bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Location of the reference CSV inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_status_file")]
    pub status_file: String,
    #[serde(default = "default_business_hours_file")]
    pub business_hours_file: String,
    #[serde(default = "default_timezones_file")]
    pub timezones_file: String,
}

/// Report output and worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_reports_dir")]
    pub dir: PathBuf,
    /// Reports generated concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Store chunks reconciled concurrently within one report.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

/// Uptime computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UptimeConfig {
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    #[serde(default)]
    pub interpolation: InterpolationPolicy,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_status_file() -> String {
    "store_status.csv".to_string()
}

fn default_business_hours_file() -> String {
    "menu_hours.csv".to_string()
}

fn default_timezones_file() -> String {
    "timezones.csv".to_string()
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_workers() -> usize {
    2
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            status_file: default_status_file(),
            business_hours_file: default_business_hours_file(),
            timezones_file: default_timezones_file(),
        }
    }
}

impl DataConfig {
    pub fn status_path(&self) -> PathBuf {
        self.dir.join(&self.status_file)
    }

    pub fn business_hours_path(&self) -> PathBuf {
        self.dir.join(&self.business_hours_file)
    }

    pub fn timezones_path(&self) -> PathBuf {
        self.dir.join(&self.timezones_file)
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            dir: default_reports_dir(),
            workers: default_workers(),
            parallelism: default_parallelism(),
        }
    }
}

impl Default for UptimeConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            interpolation: InterpolationPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Find the configuration file in the default locations.
    ///
    /// Searches for `store-monitor.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn find_default_location() -> Option<PathBuf> {
        [
            PathBuf::from(CONFIG_FILE_NAME),
            Path::new("backend").join(CONFIG_FILE_NAME),
            Path::new("..").join(CONFIG_FILE_NAME),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Load from the default location if present, then apply environment
    /// overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_default_location() {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading configuration file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    ///
    /// Recognized keys: `HOST`, `PORT`, `DATA_DIR`, `REPORTS_DIR`,
    /// `REPORT_WORKERS`, `DEFAULT_TIMEZONE`, `INTERPOLATION_POLICY`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_value("PORT", &port)?;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.data.dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("REPORTS_DIR") {
            self.reports.dir = PathBuf::from(dir);
        }
        if let Some(workers) = lookup("REPORT_WORKERS") {
            self.reports.workers = parse_value("REPORT_WORKERS", &workers)?;
        }
        if let Some(tz) = lookup("DEFAULT_TIMEZONE") {
            self.uptime.default_timezone = tz;
        }
        if let Some(policy) = lookup("INTERPOLATION_POLICY") {
            self.uptime.interpolation = policy.parse().map_err(|message| ConfigError::Invalid {
                key: "INTERPOLATION_POLICY".to_string(),
                message,
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reports.workers == 0 {
            return Err(invalid("reports.workers", "must be at least 1"));
        }
        if self.reports.parallelism == 0 {
            return Err(invalid("reports.parallelism", "must be at least 1"));
        }
        if self.uptime.default_timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(invalid(
                "uptime.default_timezone",
                &format!("unknown timezone '{}'", self.uptime.default_timezone),
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, &e.to_string()))
}
