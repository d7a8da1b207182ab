//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, Utc};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use hos_core::{ComplianceConfig, LogDay, UnenforcedCycleRule};
use serde::{Deserialize, Serialize};

const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Time zone that log days are anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTimezone {
    /// The system time zone.
    #[default]
    Local,
    Utc,
}

impl LogTimezone {
    /// Calendar date of `at` in this zone.
    pub fn date_of(self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => at.with_timezone(&Local).date_naive(),
            Self::Utc => at.date_naive(),
        }
    }

    /// The log day for `date`, starting at midnight in this zone.
    pub fn log_day(self, date: NaiveDate) -> LogDay {
        match self {
            Self::Local => LogDay::in_timezone(date, &Local),
            Self::Utc => LogDay::in_timezone(date, &Utc),
        }
    }
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Base URL of the log service (mileage, remote log store, route planning).
    pub api_base_url: Option<String>,
    /// Bearer token for the log service.
    pub api_token: Option<String>,
    /// Base URL of a Nominatim-compatible geocoder.
    pub geocoder_url: String,
    /// Average speed for the mileage estimate.
    pub average_speed_mph: f64,
    /// Daily driving hours at which a day is a violation.
    pub max_driving_hours: f64,
    /// Cycle limit. Reported only.
    pub cycle_limit_hours: f64,
    /// Cycle length in days. Reported only.
    pub cycle_days: u32,
    /// Time zone log days are anchored to.
    pub timezone: LogTimezone,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("geocoder_url", &self.geocoder_url)
            .field("average_speed_mph", &self.average_speed_mph)
            .field("max_driving_hours", &self.max_driving_hours)
            .field("cycle_limit_hours", &self.cycle_limit_hours)
            .field("cycle_days", &self.cycle_days)
            .field("timezone", &self.timezone)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let compliance = ComplianceConfig::default();
        Self {
            database_path: data_dir.join("hos.db"),
            api_base_url: None,
            api_token: None,
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            average_speed_mph: hos_core::record::DEFAULT_AVERAGE_SPEED_MPH,
            max_driving_hours: compliance.max_driving_hours,
            cycle_limit_hours: compliance.cycle.limit_hours,
            cycle_days: compliance.cycle.days,
            timezone: LogTimezone::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (HOS_*)
        figment = figment.merge(Env::prefixed("HOS_"));

        figment.extract()
    }

    /// Thresholds for compliance evaluation.
    pub fn compliance(&self) -> ComplianceConfig {
        ComplianceConfig {
            max_driving_hours: self.max_driving_hours,
            cycle: UnenforcedCycleRule {
                limit_hours: self.cycle_limit_hours,
                days: self.cycle_days,
            },
        }
    }

    /// The configured log service URL, if any.
    pub fn api_base_url(&self) -> Option<&str> {
        self.api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Returns the platform-specific config directory for hos.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hos"))
}

/// Returns the platform-specific data directory for hos.
///
/// On Linux: `~/.local/share/hos`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("hos"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_hos() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "hos");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("hos.db"));
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "defaults are exact constants")]
    fn test_default_thresholds() {
        let config = Config::default();
        assert_eq!(config.average_speed_mph, 55.0);
        assert_eq!(config.compliance(), ComplianceConfig::default());
        assert!(config.api_base_url().is_none());
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "max_driving_hours = 10.0\napi_base_url = \"http://localhost:8000\"\ntimezone = \"utc\"\n",
        )
        .unwrap();
        let config = Config::load_from(Some(&path)).unwrap();
        assert!((config.compliance().max_driving_hours - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.api_base_url(), Some("http://localhost:8000"));
        assert_eq!(config.timezone, LogTimezone::Utc);
    }

    #[test]
    fn test_blank_api_url_is_ignored() {
        let config = Config {
            api_base_url: Some("  ".to_string()),
            ..Config::default()
        };
        assert!(config.api_base_url().is_none());
    }

    #[test]
    fn test_debug_redacts_api_token() {
        let config = Config {
            api_token: Some("secret-token".to_string()),
            ..Config::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_utc_log_day_starts_at_midnight() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let day = LogTimezone::Utc.log_day(date);
        assert_eq!(day.start.to_rfc3339(), "2025-01-15T00:00:00+00:00");
        assert_eq!(LogTimezone::Utc.date_of(day.start), date);
    }
}
