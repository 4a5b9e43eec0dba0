//! # Daily and Overall Summaries
//!
//! Reduces the events, the sample curve and the extracted windows into what
//! the report shows: a [`DailySummary`] for every requested day and one
//! [`OverallStatistics`] for the whole range.

use crate::{
    BoatableWindow, DailySummary, DateRange, Forecast, ForecastError, OverallStatistics, Sample,
    TideEvent,
};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

/// Running min/max over one day's samples
#[derive(Clone, Copy)]
struct HeightRange {
    max: f64,
    min: f64,
}

impl HeightRange {
    fn new(height: f64) -> Self {
        Self {
            max: height,
            min: height,
        }
    }

    fn include(&mut self, height: f64) {
        self.max = self.max.max(height);
        self.min = self.min.min(height);
    }
}

/// Longest window, earliest one winning a tie.
pub fn primary_window<'a, I>(windows: I) -> Option<&'a BoatableWindow>
where
    I: IntoIterator<Item = &'a BoatableWindow>,
{
    windows.into_iter().fold(None, |best, w| match best {
        Some(b) if b.duration >= w.duration => Some(b),
        _ => Some(w),
    })
}

/// Build the [`Forecast`] for `range`.
///
/// Events, windows and samples outside `range` are ignored.
///
/// # Errors
/// [`ForecastError::MissingDay`] for the first requested day that has no
/// samples at all.
pub fn summarize(
    events: &[TideEvent],
    samples: &[Sample],
    windows: &[BoatableWindow],
    range: DateRange,
) -> Result<Forecast, ForecastError> {
    let mut heights: BTreeMap<NaiveDate, HeightRange> = BTreeMap::new();
    for sample in samples {
        let date = sample.timestamp.date_naive();
        if !range.contains(date) {
            continue;
        }
        heights
            .entry(date)
            .and_modify(|h| h.include(sample.height_m))
            .or_insert_with(|| HeightRange::new(sample.height_m));
    }

    let mut by_day: BTreeMap<NaiveDate, Vec<BoatableWindow>> = BTreeMap::new();
    for window in windows.iter().filter(|w| range.contains(w.date)) {
        by_day.entry(window.date).or_default().push(window.clone());
    }

    let mut tides: BTreeMap<NaiveDate, Vec<TideEvent>> = BTreeMap::new();
    for event in events {
        let date = event.timestamp.date_naive();
        if range.contains(date) {
            tides.entry(date).or_default().push(event.clone());
        }
    }

    let mut days = Vec::with_capacity(range.days as usize);
    let mut overall: Option<HeightRange> = None;

    for date in range.dates() {
        let day_heights = *heights
            .get(&date)
            .ok_or(ForecastError::MissingDay { date })?;

        match overall.as_mut() {
            Some(o) => {
                o.include(day_heights.max);
                o.include(day_heights.min);
            }
            None => overall = Some(day_heights),
        }

        let day_windows = by_day.remove(&date).unwrap_or_default();
        days.push(DailySummary {
            date,
            window: primary_window(&day_windows).cloned(),
            windows: day_windows,
            tides: tides.remove(&date).unwrap_or_default(),
            max_height_m: day_heights.max,
            min_height_m: day_heights.min,
        });
    }

    let total_boatable = days
        .iter()
        .flat_map(|d| d.windows.iter())
        .fold(Duration::zero(), |acc, w| acc + w.duration);

    let best_day = primary_window(days.iter().filter_map(|d| d.window.as_ref())).map(|w| w.date);

    // An empty range has no samples to summarise
    let overall = overall.ok_or(ForecastError::MissingDay { date: range.start })?;

    Ok(Forecast {
        days,
        overall: OverallStatistics {
            max_height_m: overall.max,
            min_height_m: overall.min,
            total_boatable,
            best_day,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, TideKind};
    use chrono::{DateTime, TimeZone};
    use chrono_tz::{Australia::Brisbane, Tz};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
        Brisbane
            .with_ymd_and_hms(2025, 1, day, hour, minute, 0)
            .unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn window(day: u32, start_hour: u32, minutes: i64) -> BoatableWindow {
        let start = at(day, start_hour, 0);
        BoatableWindow {
            date: date(day),
            start,
            end: start + Duration::minutes(minutes),
            duration: Duration::minutes(minutes),
        }
    }

    /// Hourly samples for the given days, peaking at `peak` on each
    fn hourly(days: &[(u32, f64)]) -> Vec<Sample> {
        days.iter()
            .flat_map(|&(day, peak)| {
                (0..24).map(move |h| Sample {
                    timestamp: at(day, h, 0),
                    height_m: if h == 9 { peak } else { 0.3 },
                })
            })
            .collect()
    }

    #[test]
    fn one_summary_per_day_even_without_windows() {
        let samples = hourly(&[(6, 2.1), (7, 1.0), (8, 2.4)]);
        let windows = vec![window(6, 8, 90), window(8, 9, 45)];
        let forecast = summarize(&[], &samples, &windows, DateRange::new(date(6), 3)).unwrap();

        assert_eq!(forecast.days.len(), 3);
        let quiet = &forecast.days[1];
        assert_eq!(quiet.date, date(7));
        assert!(quiet.window.is_none());
        assert!(quiet.windows.is_empty());
        assert_eq!(quiet.max_height_m, 1.0);
        assert_eq!(quiet.min_height_m, 0.3);

        assert_eq!(forecast.overall.max_height_m, 2.4);
        assert_eq!(forecast.overall.min_height_m, 0.3);
        assert_eq!(forecast.overall.total_boatable, Duration::minutes(135));
        assert_eq!(forecast.overall.best_day, Some(date(6)));
    }

    #[test]
    fn primary_window_is_longest_of_the_day() {
        let samples = hourly(&[(6, 2.1)]);
        let windows = vec![window(6, 7, 30), window(6, 15, 80)];
        let forecast = summarize(&[], &samples, &windows, DateRange::new(date(6), 1)).unwrap();

        let day = &forecast.days[0];
        assert_eq!(day.windows.len(), 2);
        assert_eq!(day.window.as_ref().unwrap().duration, Duration::minutes(80));
        assert_eq!(forecast.overall.total_boatable, Duration::minutes(110));
    }

    #[test]
    fn best_day_tie_goes_to_earliest() {
        let samples = hourly(&[(6, 2.0), (7, 2.0), (8, 2.0)]);
        let windows = vec![window(6, 8, 60), window(7, 8, 120), window(8, 8, 120)];
        let forecast = summarize(&[], &samples, &windows, DateRange::new(date(6), 3)).unwrap();
        assert_eq!(forecast.overall.best_day, Some(date(7)));
    }

    #[test]
    fn no_windows_means_no_best_day() {
        let samples = hourly(&[(6, 1.0), (7, 1.1)]);
        let forecast = summarize(&[], &samples, &[], DateRange::new(date(6), 2)).unwrap();
        assert_eq!(forecast.overall.best_day, None);
        assert_eq!(forecast.overall.total_boatable, Duration::zero());
    }

    #[test]
    fn uncovered_day_is_missing_data() {
        let samples = hourly(&[(6, 2.0)]);
        let err = summarize(&[], &samples, &[], DateRange::new(date(6), 2)).unwrap_err();
        assert_eq!(err, ForecastError::MissingDay { date: date(7) });
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn samples_outside_range_are_ignored() {
        let samples = hourly(&[(5, 3.5), (6, 2.0), (7, 0.9)]);
        let windows = vec![window(5, 9, 200), window(6, 9, 10)];
        let forecast = summarize(&[], &samples, &windows, DateRange::new(date(6), 1)).unwrap();

        assert_eq!(forecast.overall.max_height_m, 2.0);
        assert_eq!(forecast.overall.best_day, Some(date(6)));
        assert_eq!(forecast.overall.total_boatable, Duration::minutes(10));
    }

    #[test]
    fn tides_are_grouped_by_local_day() {
        let samples = hourly(&[(6, 2.0), (7, 1.9)]);
        let tide = |ts, height_m, kind| TideEvent {
            timestamp: ts,
            height_m,
            kind,
        };
        let events = vec![
            tide(at(5, 21, 40), 0.42, TideKind::Low),
            tide(at(6, 4, 2), 2.21, TideKind::High),
            tide(at(6, 10, 18), 0.61, TideKind::Low),
            tide(at(7, 0, 15), 2.0, TideKind::High),
            tide(at(8, 6, 30), 0.5, TideKind::Low),
        ];
        let forecast = summarize(&events, &samples, &[], DateRange::new(date(6), 2)).unwrap();

        let first: Vec<_> = forecast.days[0].tides.iter().map(|e| e.timestamp).collect();
        assert_eq!(first, vec![at(6, 4, 2), at(6, 10, 18)]);
        assert_eq!(forecast.days[1].tides.len(), 1);
        assert_eq!(forecast.days[1].tides[0].kind, TideKind::High);
    }
}
