use crate::domain::time::Zone;
use crate::infrastructure::error::InfraError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const APP_JSON: &str = "app.json";
const DEFAULT_APP_NAME: &str = "Alex Health";
const DEFAULT_STALE_TIME_MINUTES: u64 = 5;
const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_GC_TIME_MINUTES: u64 = 10;
const DEFAULT_DUE_WINDOW_MINUTES: u32 = 30;
const DEFAULT_DISMISSAL_RESET_SECONDS: u64 = 60;
const DEFAULT_DASHBOARD_DAYS: u32 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub schema: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfigFile {
    pub schema: u8,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default = "default_stale_time_minutes")]
    pub stale_time_minutes: u64,
    // 0 disables the fetch timeout.
    #[serde(default = "default_fetch_timeout_seconds")]
    pub fetch_timeout_seconds: u64,
    #[serde(default = "default_gc_time_minutes")]
    pub gc_time_minutes: u64,
    #[serde(default = "default_due_window_minutes")]
    pub due_window_minutes: u32,
    #[serde(default = "default_dismissal_reset_seconds")]
    pub dismissal_reset_seconds: u64,
    #[serde(default = "default_dashboard_days")]
    pub dashboard_days: u32,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_stale_time_minutes() -> u64 {
    DEFAULT_STALE_TIME_MINUTES
}

fn default_fetch_timeout_seconds() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECONDS
}

fn default_gc_time_minutes() -> u64 {
    DEFAULT_GC_TIME_MINUTES
}

fn default_due_window_minutes() -> u32 {
    DEFAULT_DUE_WINDOW_MINUTES
}

fn default_dismissal_reset_seconds() -> u64 {
    DEFAULT_DISMISSAL_RESET_SECONDS
}

fn default_dashboard_days() -> u32 {
    DEFAULT_DASHBOARD_DAYS
}

impl Default for AppConfigFile {
    fn default() -> Self {
        Self {
            schema: 1,
            app_name: default_app_name(),
            timezone: None,
            stale_time_minutes: DEFAULT_STALE_TIME_MINUTES,
            fetch_timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECONDS,
            gc_time_minutes: DEFAULT_GC_TIME_MINUTES,
            due_window_minutes: DEFAULT_DUE_WINDOW_MINUTES,
            dismissal_reset_seconds: DEFAULT_DISMISSAL_RESET_SECONDS,
            dashboard_days: DEFAULT_DASHBOARD_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub app_name: String,
    pub zone: Zone,
    pub stale_time: Duration,
    pub fetch_timeout: Option<Duration>,
    pub gc_time: Duration,
    pub due_window_minutes: u32,
    pub dismissal_reset: Duration,
    pub dashboard_days: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        // Defaults always validate.
        Self::from_file(AppConfigFile::default()).unwrap_or(Self {
            app_name: default_app_name(),
            zone: Zone::System,
            stale_time: Duration::from_secs(DEFAULT_STALE_TIME_MINUTES * 60),
            fetch_timeout: Some(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS)),
            gc_time: Duration::from_secs(DEFAULT_GC_TIME_MINUTES * 60),
            due_window_minutes: DEFAULT_DUE_WINDOW_MINUTES,
            dismissal_reset: Duration::from_secs(DEFAULT_DISMISSAL_RESET_SECONDS),
            dashboard_days: DEFAULT_DASHBOARD_DAYS,
        })
    }
}

impl SyncConfig {
    pub fn from_file(file: AppConfigFile) -> Result<Self, InfraError> {
        let zone = match file.timezone.as_deref().map(str::trim) {
            None | Some("") => Zone::System,
            Some(name) => Zone::parse(name)
                .ok_or_else(|| InfraError::InvalidConfig(format!("unknown timezone: {name}")))?,
        };
        if file.dismissal_reset_seconds == 0 {
            return Err(InfraError::InvalidConfig(
                "dismissalResetSeconds must be greater than zero".to_string(),
            ));
        }
        if file.dashboard_days == 0 {
            return Err(InfraError::InvalidConfig(
                "dashboardDays must be greater than zero".to_string(),
            ));
        }
        if file.gc_time_minutes < file.stale_time_minutes {
            return Err(InfraError::InvalidConfig(
                "gcTimeMinutes must not be shorter than staleTimeMinutes".to_string(),
            ));
        }
        let app_name = match file.app_name.trim() {
            "" => default_app_name(),
            name => name.to_string(),
        };

        Ok(Self {
            app_name,
            zone,
            stale_time: Duration::from_secs(file.stale_time_minutes.saturating_mul(60)),
            fetch_timeout: match file.fetch_timeout_seconds {
                0 => None,
                seconds => Some(Duration::from_secs(seconds)),
            },
            gc_time: Duration::from_secs(file.gc_time_minutes.saturating_mul(60)),
            due_window_minutes: file.due_window_minutes,
            dismissal_reset: Duration::from_secs(file.dismissal_reset_seconds),
            dashboard_days: file.dashboard_days,
        })
    }
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(APP_JSON);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&AppConfigFile::default())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_sync_config(config_dir: &Path) -> Result<SyncConfig, InfraError> {
    let path = config_dir.join(APP_JSON);
    let value = read_config(&path)?;
    let file: AppConfigFile = serde_json::from_value(value).map_err(|error| {
        InfraError::InvalidConfig(format!("invalid {}: {error}", path.display()))
    })?;
    SyncConfig::from_file(file)
}
