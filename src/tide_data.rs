//! # Tide Event Fetching and Caching
//!
//! This module handles all network operations for fetching high/low tide
//! predictions from the WillyWeather API. The core only ever sees the
//! [`TideSource`] trait, so swapping providers (or feeding canned data in
//! tests) never touches interpolation or window logic.
//!
//! ## Data Source
//!
//! ### WillyWeather v2
//! - **URL**: `{base_url}/{api_key}/locations/{id}/weather.json?forecasts=tides&startDate=YYYY-MM-DD&days=N`
//! - **Format**: JSON, `forecasts.tides.days[].entries[]` with `dateTime`
//!   (local wall-clock, `YYYY-MM-DD HH:MM:SS`), `height` (metres) and
//!   `type` (`high` / `low`)
//!
//! ### Range Padding
//! The provider only returns extrema that fall inside the requested days,
//! so the first few hours of day one (and the last few of the final day)
//! would sit outside the curve. The client therefore asks for one extra day
//! on each side and then keeps just enough events to bracket the requested
//! midnights.
//!
//! ## Caching Strategy
//! - **Location**: `{cache_dir}/tide-windows-{location}-{start}-{days}.json`
//! - **Content**: the raw response body, so a parser fix applies to cached
//!   data too
//! - **TTL**: `cache_ttl_minutes`, checked against the file modification time
//! - **Failures**: a broken cache is logged and bypassed, never fatal
//!
//! No retries happen here. A failed fetch is returned to the caller, which
//! decides whether to fall back to [`crate::fallback`].

use crate::config::Config;
use crate::{DateRange, TideEvent, TideKind};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{fs, io, time::SystemTime};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Longest range the provider is asked for in one go
pub const MAX_DAYS: u32 = 180;

/// Provider timestamp layout
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors that can occur while obtaining tide events.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (network, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("unexpected provider response: {0}")]
    Parse(String),

    /// Requested range is empty or too long
    #[error("date range must cover 1 to 180 days, got {days}")]
    InvalidRange { days: u32 },

    /// No API key in the config file or environment
    #[error("no API key configured (set WILLY_WEATHER_API_KEY)")]
    MissingApiKey,
}

/// Anything that can produce tide extrema for a range of days.
#[async_trait]
pub trait TideSource: Send + Sync {
    /// Events covering `range`, oldest first.
    async fn fetch_events(&self, range: DateRange) -> Result<Vec<TideEvent>, FetchError>;
}

/// Reject ranges the provider cannot serve.
pub fn check_range(range: DateRange) -> Result<(), FetchError> {
    if range.days == 0 || range.days > MAX_DAYS {
        return Err(FetchError::InvalidRange { days: range.days });
    }
    Ok(())
}

/// WillyWeather-backed [`TideSource`] with an on-disk response cache.
pub struct WillyWeatherSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    location_id: u32,
    timezone: Tz,
    cache_dir: PathBuf,
    cache_ttl_secs: u64,
}

impl WillyWeatherSource {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.provider.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.provider.base_url.trim_end_matches('/').to_string(),
            api_key: config.provider.api_key.clone(),
            location_id: config.location.id,
            timezone: config.location.timezone,
            cache_dir: PathBuf::from(&config.provider.cache_dir),
            cache_ttl_secs: config.provider.cache_ttl_minutes * 60,
        })
    }

    /// Cache file for one provider request
    pub fn cache_path(&self, start: NaiveDate, days: u32) -> PathBuf {
        self.cache_dir.join(format!(
            "tide-windows-{}-{}-{}.json",
            self.location_id,
            start.format("%Y-%m-%d"),
            days
        ))
    }

    /// Raw response body for `days` days from `start`, cached or fresh.
    async fn fetch_body(&self, start: NaiveDate, days: u32) -> Result<String, FetchError> {
        let cache = self.cache_path(start, days);
        match load_cache(&cache, self.cache_ttl_secs) {
            Ok(body) => {
                debug!(path = %cache.display(), "using cached tide response");
                return Ok(body);
            }
            Err(e) => debug!(path = %cache.display(), reason = %e, "cache miss"),
        }

        if self.api_key.is_empty() {
            return Err(FetchError::MissingApiKey);
        }

        let url = format!(
            "{}/{}/locations/{}/weather.json?forecasts=tides&startDate={}&days={}",
            self.base_url,
            self.api_key,
            self.location_id,
            start.format("%Y-%m-%d"),
            days
        );
        info!(location = self.location_id, %start, days, "fetching tide predictions");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if let Err(e) = save_cache(&cache, &body) {
            warn!(path = %cache.display(), error = %e, "could not write tide cache");
        }

        Ok(body)
    }
}

#[async_trait]
impl TideSource for WillyWeatherSource {
    async fn fetch_events(&self, range: DateRange) -> Result<Vec<TideEvent>, FetchError> {
        check_range(range)?;

        let padded_start = range.start - Duration::days(1);
        let body = self.fetch_body(padded_start, range.days + 2).await?;
        let events = parse_events(&body, self.timezone)?;
        let events = trim_to_range(events, range, self.timezone);

        info!(events = events.len(), "received tide events");
        Ok(events)
    }
}

// -- Response parsing --

#[derive(Deserialize)]
struct WeatherResponse {
    forecasts: Forecasts,
}

#[derive(Deserialize)]
struct Forecasts {
    tides: TideForecast,
}

#[derive(Deserialize)]
struct TideForecast {
    days: Vec<TideDay>,
}

#[derive(Deserialize)]
struct TideDay {
    entries: Vec<TideEntry>,
}

#[derive(Deserialize)]
struct TideEntry {
    #[serde(rename = "dateTime")]
    date_time: String,
    height: f64,
    #[serde(rename = "type")]
    kind: TideKind,
}

/// Local provider time to an instant in `tz`.
fn resolve_local(raw: &str, tz: Tz) -> Result<DateTime<Tz>, FetchError> {
    let naive = NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
        .map_err(|e| FetchError::Parse(format!("bad dateTime {raw:?}: {e}")))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| FetchError::Parse(format!("{raw} does not exist in {tz}")))
}

/// Flatten a WillyWeather tides response into events, in provider order.
///
/// Order and alternation are left for the core to validate.
pub fn parse_events(body: &str, tz: Tz) -> Result<Vec<TideEvent>, FetchError> {
    let response: WeatherResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    response
        .forecasts
        .tides
        .days
        .into_iter()
        .flat_map(|day| day.entries)
        .map(|entry| {
            Ok(TideEvent {
                timestamp: resolve_local(&entry.date_time, tz)?,
                height_m: entry.height,
                kind: entry.kind,
            })
        })
        .collect()
}

/// Local midnight at the start of `date`
fn midnight(date: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
}

/// Keep the events between the last one at or before the range's first
/// midnight and the first one at or after its closing midnight.
///
/// When the data does not reach that far the nearest available event is
/// kept and the gap is left for the summary step to report.
///
/// The search assumes events in time order. Out-of-order input is returned
/// untouched so that [`crate::predict`] reports it as malformed.
pub fn trim_to_range(events: Vec<TideEvent>, range: DateRange, tz: Tz) -> Vec<TideEvent> {
    if !events.windows(2).all(|w| w[0].timestamp < w[1].timestamp) {
        return events;
    }

    let (Some(open), Some(close)) = (
        midnight(range.start, tz),
        midnight(range.end() + Duration::days(1), tz),
    ) else {
        return events;
    };

    let first = events
        .iter()
        .rposition(|e| e.timestamp <= open)
        .unwrap_or(0);
    let last = events
        .iter()
        .position(|e| e.timestamp >= close)
        .unwrap_or(events.len().saturating_sub(1));

    if first > last {
        return events;
    }

    events.into_iter().skip(first).take(last - first + 1).collect()
}

// -- Cache --

/// Load a cached body if it is younger than `ttl_secs`.
fn load_cache(path: &Path, ttl_secs: u64) -> Result<String, io::Error> {
    let meta = fs::metadata(path)?;

    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .map_err(|_| io::Error::other("time error"))?
        .as_secs();

    if age > ttl_secs {
        return Err(io::Error::other("stale"));
    }

    fs::read_to_string(path)
}

fn save_cache(path: &Path, body: &str) -> Result<(), io::Error> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, body)
}
