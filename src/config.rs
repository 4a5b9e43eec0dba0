//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! tide-config.toml file. It covers the station being watched, the rules
//! that make a slot "boatable", and how the tide provider is reached.
//!
//! The core never reads this file itself: callers hand a [`WindowConfig`]
//! to [`crate::predict`], so several thresholds or locations can be
//! evaluated side by side without any shared state.

use crate::ForecastError;
use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Lowest threshold accepted, in metres. Some datums put low water below zero.
pub const MIN_THRESHOLD_M: f64 = -3.0;
/// Highest threshold accepted, in metres.
pub const MAX_THRESHOLD_M: f64 = 20.0;

/// Longest sampling step accepted: one day
pub const MAX_SAMPLING_INTERVAL_MINUTES: i64 = 24 * 60;

/// Environment variable that overrides `provider.api_key`
pub const API_KEY_ENV: &str = "WILLY_WEATHER_API_KEY";

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Station being forecast
    pub location: LocationConfig,
    /// Boatable window rules
    pub window: WindowConfig,
    /// Tide data provider settings
    pub provider: ProviderConfig,
}

/// The boat ramp or tide station
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationConfig {
    /// Provider location ID (e.g., 33211 for Victoria Point)
    pub id: u32,
    /// Human-readable name for reports
    pub name: String,
    /// IANA zone the provider reports local times in
    pub timezone: Tz,
}

/// Local time-of-day bounds, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DaylightWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl DaylightWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

/// Everything the core needs to decide whether a sample is boatable.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WindowConfig {
    /// Minimum tide height in metres (inclusive)
    pub threshold_m: f64,
    /// Step between interpolated samples
    pub sampling_interval_minutes: i64,
    /// Local hours during which launching is allowed
    pub daylight: DaylightWindow,
}

impl WindowConfig {
    /// Step between samples as a [`Duration`].
    pub fn sampling_interval(&self) -> Result<Duration, ForecastError> {
        Duration::try_minutes(self.sampling_interval_minutes).ok_or_else(|| {
            ForecastError::InvalidConfiguration(format!(
                "sampling interval of {} minutes is not representable",
                self.sampling_interval_minutes
            ))
        })
    }

    /// Reject settings the core cannot work with. Nothing is clamped.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if !(1..=MAX_SAMPLING_INTERVAL_MINUTES).contains(&self.sampling_interval_minutes) {
            return Err(ForecastError::InvalidConfiguration(format!(
                "sampling interval must be 1 to {MAX_SAMPLING_INTERVAL_MINUTES} minutes, got {}",
                self.sampling_interval_minutes
            )));
        }
        if !self.threshold_m.is_finite()
            || !(MIN_THRESHOLD_M..=MAX_THRESHOLD_M).contains(&self.threshold_m)
        {
            return Err(ForecastError::InvalidConfiguration(format!(
                "threshold {} m is outside {MIN_THRESHOLD_M}..={MAX_THRESHOLD_M} m",
                self.threshold_m
            )));
        }
        if self.daylight.start > self.daylight.end {
            return Err(ForecastError::InvalidConfiguration(format!(
                "daylight starts at {} but ends at {}",
                self.daylight.start.format("%H:%M"),
                self.daylight.end.format("%H:%M")
            )));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            threshold_m: 1.6,
            sampling_interval_minutes: 1,
            daylight: DaylightWindow {
                start: NaiveTime::from_hms_opt(6, 0, 0).expect("06:00 is a valid time"),
                end: NaiveTime::from_hms_opt(17, 30, 0).expect("17:30 is a valid time"),
            },
        }
    }
}

/// WillyWeather API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// API key; `WILLY_WEATHER_API_KEY` takes precedence when set
    #[serde(default)]
    pub api_key: String,
    /// Directory for cached provider responses
    pub cache_dir: String,
    /// Cache TTL in minutes
    pub cache_ttl_minutes: u64,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            location: LocationConfig {
                id: 33211,
                name: "Victoria Point Boat Ramp".to_string(),
                timezone: chrono_tz::Australia::Brisbane,
            },
            window: WindowConfig::default(),
            provider: ProviderConfig {
                base_url: "https://api.willyweather.com.au/v2".to_string(),
                api_key: String::new(),
                cache_dir: "/tmp".to_string(),
                cache_ttl_minutes: 30,
                timeout_secs: 30,
            },
        }
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let mut config = match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(location = %config.location.name, "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.provider.api_key = key;
            }
        }

        config
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}

/// `NaiveTime` as `"HH:MM"`, which reads better in a config file than
/// chrono's default `"HH:MM:SS"`. Seconds are still accepted on input.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|e| D::Error::custom(format!("bad time {raw:?}: {e}")))
    }
}
