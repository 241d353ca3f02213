//! Configuration types for the slot monitor

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    #[serde(default)]
    pub email: Option<EmailJsConfig>,
    #[serde(default)]
    pub desktop: DesktopConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Where mode, phase and email are persisted between runs
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: TargetConfig::default(),
            schedule: ScheduleConfig::default(),
            log_capacity: default_log_capacity(),
            email: None,
            desktop: DesktopConfig::default(),
            speech: SpeechConfig::default(),
            dashboard: DashboardConfig::default(),
            settings_path: None,
        }
    }
}

/// The monitored page and how to reach it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_target_url")]
    pub url: String,
    #[serde(default = "default_warmup_seconds")]
    pub warmup_seconds: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: default_target_url(),
            warmup_seconds: default_warmup_seconds(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

/// Interval bounds for FAST and SLOW mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_fast_interval")]
    pub fast_interval_seconds: u64,
    #[serde(default = "default_slow_min")]
    pub slow_min_seconds: u64,
    #[serde(default = "default_slow_max")]
    pub slow_max_seconds: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fast_interval_seconds: default_fast_interval(),
            slow_min_seconds: default_slow_min(),
            slow_max_seconds: default_slow_max(),
        }
    }
}

/// EmailJS REST credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    #[serde(default = "default_emailjs_url")]
    pub api_url: String,
}

/// Desktop notification channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesktopConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app_name: default_app_name(),
        }
    }
}

/// Audio cue and speech channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_speech_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_speech_phrase")]
    pub phrase: String,
    #[serde(default = "default_true")]
    pub beeps: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_speech_command(),
            args: Vec::new(),
            phrase: default_speech_phrase(),
            beeps: true,
        }
    }
}

/// Control surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

impl Config {
    /// Reject schedules the interval policy cannot honour
    pub fn validate(&self) -> crate::Result<()> {
        let schedule = &self.schedule;
        if schedule.fast_interval_seconds == 0 {
            return Err(crate::SlotWatchError::Config(
                "schedule.fast_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if schedule.slow_min_seconds == 0 || schedule.slow_min_seconds > schedule.slow_max_seconds
        {
            return Err(crate::SlotWatchError::Config(format!(
                "schedule slow range {}..={} is invalid",
                schedule.slow_min_seconds, schedule.slow_max_seconds
            )));
        }
        if self.log_capacity == 0 {
            return Err(crate::SlotWatchError::Config(
                "log_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings file location, falling back to the user config directory
    pub fn resolved_settings_path(&self) -> Option<PathBuf> {
        self.settings_path.clone().or_else(|| {
            dirs::config_dir().map(|dir| dir.join("slotwatch").join("settings.json"))
        })
    }
}

fn default_target_url() -> String {
    "https://checkvisaslots.com/latest-us-visa-availability/".to_string()
}

fn default_warmup_seconds() -> u64 {
    4
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_request_timeout_seconds() -> u64 {
    20
}

fn default_fast_interval() -> u64 {
    10
}

fn default_slow_min() -> u64 {
    1
}

fn default_slow_max() -> u64 {
    60
}

fn default_log_capacity() -> usize {
    100
}

fn default_emailjs_url() -> String {
    "https://api.emailjs.com/api/v1.0/email/send".to_string()
}

fn default_app_name() -> String {
    "Visa Slot Monitor".to_string()
}

fn default_speech_command() -> String {
    if cfg!(target_os = "macos") {
        "say".to_string()
    } else {
        "espeak".to_string()
    }
}

fn default_speech_phrase() -> String {
    "Slots found".to_string()
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::SlotWatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
