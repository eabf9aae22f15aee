use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::{
    core::ReconcileOptions,
    errors::{CalendarError, CalendarResult},
    utils::paths::{self, write_atomic},
};

const DEFAULT_HORIZON_YEARS: u32 = 5;
const DEFAULT_MAX_AUTO_EVENTS: u32 = 72;

/// Site-wide scheduling settings threaded into every reconcile run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Nothing dated before this floor is (re)generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_dates_before: Option<NaiveDate>,
    /// Explicit global horizon. Takes precedence over `horizon_years`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_dates_after: Option<NaiveDate>,
    #[serde(default = "SchedulerConfig::default_horizon_years")]
    pub horizon_years: u32,
    #[serde(default = "SchedulerConfig::default_max_auto_events")]
    pub max_auto_events: Option<u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            ignore_dates_before: None,
            ignore_dates_after: None,
            horizon_years: DEFAULT_HORIZON_YEARS,
            max_auto_events: Self::default_max_auto_events(),
        }
    }
}

impl SchedulerConfig {
    fn default_horizon_years() -> u32 {
        DEFAULT_HORIZON_YEARS
    }

    fn default_max_auto_events() -> Option<u32> {
        Some(DEFAULT_MAX_AUTO_EVENTS)
    }

    /// The global horizon as seen on `today`, if one can be derived.
    pub fn horizon(&self, today: NaiveDate) -> Option<NaiveDate> {
        if self.ignore_dates_after.is_some() {
            return self.ignore_dates_after;
        }
        if self.horizon_years == 0 {
            return None;
        }
        today.checked_add_months(Months::new(self.horizon_years.saturating_mul(12)))
    }

    pub fn options(&self, today: NaiveDate) -> ReconcileOptions {
        ReconcileOptions {
            today,
            ignore_dates_before: self.ignore_dates_before,
            horizon: self.horizon(today),
            max_auto_events: self.max_auto_events,
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_path(paths::config_file())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> CalendarResult<SchedulerConfig> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            let config = serde_json::from_str(&data)
                .map_err(|err| CalendarError::Config(format!("{}: {}", self.path.display(), err)))?;
            Ok(config)
        } else {
            debug!(path = %self.path.display(), "no scheduler config found, using defaults");
            Ok(SchedulerConfig::default())
        }
    }

    pub fn save(&self, config: &SchedulerConfig) -> CalendarResult<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
