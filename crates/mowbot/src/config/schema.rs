use std::collections::HashMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub database_path: Option<String>,
    pub photo_directory: String,
    #[serde(default = "default_photo_quota")]
    pub photo_daily_quota: u32,
    #[serde(default = "default_page_size")]
    pub assignment_page_size: u32,
    #[serde(default = "default_reset_time")]
    pub reset_time: String,
    #[serde(default)]
    pub reset_catch_up: bool,
    pub roster: RosterConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub sites: SitesConfig,
}

fn default_photo_quota() -> u32 {
    25
}

fn default_page_size() -> u32 {
    10
}

fn default_reset_time() -> String {
    "05:00".to_string()
}

impl Config {
    /// Parses the configured daily reset time ("HH:MM", local clock).
    pub fn reset_time_of_day(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.reset_time, "%H:%M").map_err(|e| {
            ConfigError::Validation {
                message: format!("Invalid reset_time '{}': {}", self.reset_time, e),
            }
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub devs: Vec<i64>,
    #[serde(default)]
    pub directors: Vec<Member>,
    #[serde(default)]
    pub employees: Vec<Member>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_cache_minutes")]
    pub cache_minutes: u64,
}

fn default_cache_minutes() -> u64 {
    30
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            cache_minutes: default_cache_minutes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SitesConfig {
    #[serde(default)]
    pub overrides: HashMap<String, SiteOverrideConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteOverrideConfig {
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub gate_code: Option<String>,
}
