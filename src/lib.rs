//! # Tide Windows Core Library
//!
//! This library turns a sparse list of high/low tide extrema into the answer
//! a boat owner actually wants: *when, on each day, is there enough water at
//! the ramp while it is still light?*
//!
//! ## Data Flow
//!
//! 1. **Source**: [`tide_data`] fetches [`TideEvent`]s for a [`DateRange`]
//!    (or [`fallback`] synthesises them when offline)
//! 2. **Interpolate**: [`interpolate`] samples a smooth cosine curve between
//!    consecutive extrema at a fixed interval (1 minute by default)
//! 3. **Extract**: [`windows`] scans the samples and emits one
//!    [`BoatableWindow`] per contiguous run of daylight samples at or above
//!    the height threshold, never crossing midnight
//! 4. **Summarise**: [`summary`] reduces events, samples and windows into a
//!    [`DailySummary`] per requested day plus [`OverallStatistics`]
//! 5. **Present**: [`renderer`] and [`export`] format the [`Forecast`]
//!
//! Steps 2 to 4 are pure: [`predict`] never reads the clock, touches the
//! network, or keeps state between calls. The same input always yields the
//! same [`Forecast`].
//!
//! ## Time Zones
//!
//! Every timestamp is a [`DateTime<Tz>`] in the station's zone. Calendar days
//! and the daylight mask are evaluated in local time, so a window's date is
//! the date printed on the tide table.

use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

// Module declarations
pub mod config;
pub mod error;
pub mod export;
pub mod fallback;
pub mod interpolate;
pub mod renderer;
pub mod summary;
pub mod tide_data;
pub mod windows;

pub use config::{Config, DaylightWindow, WindowConfig};
pub use error::{ErrorKind, ForecastError, SequenceFault};

/// Whether an extremum is a high or a low tide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TideKind {
    High,
    Low,
}

impl std::fmt::Display for TideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TideKind::High => f.write_str("high"),
            TideKind::Low => f.write_str("low"),
        }
    }
}

/// A single high or low tide as published by the provider.
///
/// # Example
/// ```
/// use chrono::TimeZone;
/// use chrono_tz::Australia::Brisbane;
/// use tide_windows_lib::{TideEvent, TideKind};
///
/// let high = TideEvent {
///     timestamp: Brisbane.with_ymd_and_hms(2025, 1, 6, 9, 41, 0).unwrap(),
///     height_m: 2.31,
///     kind: TideKind::High,
/// };
/// assert_eq!(high.kind, TideKind::High);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TideEvent {
    /// When the extremum occurs
    pub timestamp: DateTime<Tz>,
    /// Height in metres above chart datum
    pub height_m: f64,
    /// High or low
    pub kind: TideKind,
}

/// A point on the interpolated tide curve.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Tz>,
    /// Height in metres above chart datum
    pub height_m: f64,
}

/// A maximal run of boatable samples inside one local calendar day.
///
/// `start` and `end` are the first and last boatable samples, so a window
/// made of a single sample has a zero `duration`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoatableWindow {
    pub date: NaiveDate,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    #[serde(rename = "duration_minutes", serialize_with = "minutes")]
    pub duration: Duration,
}

/// Per-day result. One exists for every requested day, window or not.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Longest window of the day (earliest wins a tie)
    pub window: Option<BoatableWindow>,
    /// Every window of the day in time order
    pub windows: Vec<BoatableWindow>,
    /// The highs and lows that fall on this day
    pub tides: Vec<TideEvent>,
    pub max_height_m: f64,
    pub min_height_m: f64,
}

/// Statistics across the whole requested range.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverallStatistics {
    pub max_height_m: f64,
    pub min_height_m: f64,
    #[serde(rename = "total_boatable_minutes", serialize_with = "minutes")]
    pub total_boatable: Duration,
    /// Day holding the longest single window, earliest on tie
    pub best_day: Option<NaiveDate>,
}

/// Everything a presenter needs: one summary per day plus the overall view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Forecast {
    pub days: Vec<DailySummary>,
    pub overall: OverallStatistics,
}

/// A run of consecutive local calendar days.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tide_windows_lib::DateRange;
///
/// let range = DateRange::new(NaiveDate::from_ymd_opt(2025, 1, 30).unwrap(), 3);
/// let dates: Vec<_> = range.dates().collect();
/// assert_eq!(dates.last(), Some(&NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub days: u32,
}

impl DateRange {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self { start, days }
    }

    /// Last day included in the range. Equals `start` for an empty range.
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(i64::from(self.days.saturating_sub(1)))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days > 0 && self.start <= date && date <= self.end()
    }

    /// Each day of the range in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.days as usize)
    }
}

/// Run the whole core pipeline: validate, interpolate, extract, summarise.
///
/// Fails fast on the first broken invariant; there is no partial result.
///
/// # Example
/// ```
/// use chrono::{NaiveDate, TimeZone};
/// use chrono_tz::Australia::Brisbane;
/// use tide_windows_lib::{predict, DateRange, TideEvent, TideKind, WindowConfig};
///
/// let at = |h, m| Brisbane.with_ymd_and_hms(2025, 1, 6, h, m, 0).unwrap();
/// let events = vec![
///     TideEvent { timestamp: at(0, 0), height_m: 0.5, kind: TideKind::Low },
///     TideEvent { timestamp: at(6, 0), height_m: 2.0, kind: TideKind::High },
///     TideEvent { timestamp: at(12, 0), height_m: 0.5, kind: TideKind::Low },
/// ];
/// let range = DateRange::new(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(), 1);
/// let forecast = predict(&events, &WindowConfig::default(), range).unwrap();
///
/// let window = forecast.days[0].window.as_ref().unwrap();
/// assert_eq!(window.start, at(6, 0));
/// assert!(window.end < at(12, 0));
/// ```
pub fn predict(
    events: &[TideEvent],
    config: &WindowConfig,
    range: DateRange,
) -> Result<Forecast, ForecastError> {
    config.validate()?;

    let samples = interpolate::interpolate(events, config.sampling_interval()?)?;
    let found = windows::extract_windows(&samples, config);
    let forecast = summary::summarize(events, &samples, &found, range)?;

    debug!(
        days = forecast.days.len(),
        windows = found.len(),
        total_minutes = forecast.overall.total_boatable.num_minutes(),
        "forecast computed"
    );

    Ok(forecast)
}

fn minutes<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(duration.num_minutes())
}
