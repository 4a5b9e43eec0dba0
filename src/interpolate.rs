//! # Tide Curve Interpolation
//!
//! Providers publish only the turning points of the tide: a high, then a
//! low, then a high again. This module fills in the water level between
//! them so the window scan can work minute by minute.
//!
//! ## Curve Shape
//!
//! Between two extrema `(t0, h0)` and `(t1, h1)` the height follows half a
//! cosine period:
//!
//! ```text
//! p      = (t - t0) / (t1 - t0)            // 0.0 at t0, 1.0 at t1
//! height = h0 + (h1 - h0) * (1 - cos(p·π)) / 2
//! ```
//!
//! The weight `(1 - cos(p·π)) / 2` rises from 0 to 1 with zero slope at
//! both ends, so the water slows to a stand at every high and low. A falling
//! segment uses the same weight with a negative `h1 - h0`, which mirrors
//! the rising shape. The weight never leaves `[0, 1]`, so the curve stays
//! between its two endpoint heights.
//!
//! This is a geometric approximation; it does not model harmonic
//! constituents.
//!
//! ## Sampling Grid
//!
//! The first sample sits on the first event. Each segment then contributes
//! samples at `t0 + k·interval` strictly before `t1`, plus one sample exactly
//! on `t1` carrying the event's own height. Spacing is therefore exact
//! everywhere except, possibly, right before an event.

use crate::{ForecastError, Sample, SequenceFault, TideEvent};
use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use std::f64::consts::PI;
use tracing::debug;

/// Check ordering and alternation of an event sequence.
///
/// The offending event's index is reported; the earlier event of the pair is
/// assumed correct.
pub fn validate_events(events: &[TideEvent]) -> Result<(), ForecastError> {
    if events.len() < 2 {
        return Err(ForecastError::TooFewEvents {
            count: events.len(),
        });
    }

    for (i, pair) in events.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        let fault = if next.timestamp <= prev.timestamp {
            Some(SequenceFault::NotIncreasing)
        } else if next.kind == prev.kind {
            Some(SequenceFault::RepeatedKind(next.kind))
        } else {
            None
        };

        if let Some(fault) = fault {
            return Err(ForecastError::MalformedEventSequence {
                index: i + 1,
                fault,
            });
        }
    }

    Ok(())
}

/// Height at `progress` (0.0 to 1.0) of the way from `h0` to `h1`.
pub fn cosine_height(h0: f64, h1: f64, progress: f64) -> f64 {
    if h0 == h1 {
        return h0;
    }
    let weight = (1.0 - (progress * PI).cos()) / 2.0;
    h0 + (h1 - h0) * weight
}

/// `t + interval`, or an error when the result leaves chrono's range.
fn step(t: DateTime<Tz>, interval: Duration) -> Result<DateTime<Tz>, ForecastError> {
    t.checked_add_signed(interval).ok_or_else(|| {
        ForecastError::InvalidConfiguration(format!(
            "sampling interval {interval} steps past the representable range from {t}"
        ))
    })
}

/// Sample the tide curve described by `events` every `interval`.
///
/// # Errors
/// - [`ForecastError::InvalidConfiguration`] if `interval` is not positive
/// - [`ForecastError::TooFewEvents`] for fewer than two events
/// - [`ForecastError::MalformedEventSequence`] for unordered or
///   non-alternating events
pub fn interpolate(events: &[TideEvent], interval: Duration) -> Result<Vec<Sample>, ForecastError> {
    if interval <= Duration::zero() {
        return Err(ForecastError::InvalidConfiguration(format!(
            "sampling interval must be positive, got {interval}"
        )));
    }
    validate_events(events)?;

    let first = &events[0];
    let last = &events[events.len() - 1];
    let span = last.timestamp.signed_duration_since(first.timestamp);
    let step_ms = interval.num_milliseconds().max(1);
    let estimate = (span.num_milliseconds() / step_ms) as usize + events.len();

    let mut samples = Vec::with_capacity(estimate);
    samples.push(Sample {
        timestamp: first.timestamp,
        height_m: first.height_m,
    });

    for pair in events.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let segment = to.timestamp.signed_duration_since(from.timestamp);
        let segment_ms = segment.num_milliseconds() as f64;

        let mut t = step(from.timestamp, interval)?;
        while t < to.timestamp {
            let elapsed = t.signed_duration_since(from.timestamp).num_milliseconds() as f64;
            samples.push(Sample {
                timestamp: t,
                height_m: cosine_height(from.height_m, to.height_m, elapsed / segment_ms),
            });
            t = step(t, interval)?;
        }

        // Land exactly on the extremum
        samples.push(Sample {
            timestamp: to.timestamp,
            height_m: to.height_m,
        });
    }

    debug!(
        segments = events.len() - 1,
        samples = samples.len(),
        "interpolated tide curve"
    );

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, TideKind};
    use chrono::TimeZone;
    use chrono_tz::Australia::Brisbane;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
        Brisbane
            .with_ymd_and_hms(2025, 1, day, hour, minute, 0)
            .unwrap()
    }

    fn event(ts: DateTime<Tz>, height_m: f64, kind: TideKind) -> TideEvent {
        TideEvent {
            timestamp: ts,
            height_m,
            kind,
        }
    }

    fn tide_day() -> Vec<TideEvent> {
        vec![
            event(at(6, 0, 0), 0.5, TideKind::Low),
            event(at(6, 6, 0), 2.0, TideKind::High),
            event(at(6, 12, 0), 0.5, TideKind::Low),
            event(at(6, 18, 17), 2.3, TideKind::High),
        ]
    }

    #[test]
    fn covers_first_to_last_event_every_minute() {
        let samples = interpolate(&tide_day(), Duration::minutes(1)).unwrap();

        assert_eq!(samples.first().unwrap().timestamp, at(6, 0, 0));
        assert_eq!(samples.last().unwrap().timestamp, at(6, 18, 17));
        // 18h17m of minutes plus the first sample
        assert_eq!(samples.len(), 18 * 60 + 17 + 1);

        for pair in samples.windows(2) {
            assert_eq!(
                pair[1].timestamp - pair[0].timestamp,
                Duration::minutes(1),
                "gap at {}",
                pair[0].timestamp
            );
        }
    }

    #[test]
    fn irregular_gap_only_before_an_event() {
        let events = tide_day();
        let samples = interpolate(&events, Duration::minutes(10)).unwrap();
        let event_times: Vec<_> = events.iter().map(|e| e.timestamp).collect();

        for pair in samples.windows(2) {
            let gap = pair[1].timestamp - pair[0].timestamp;
            assert!(gap > Duration::zero());
            if gap != Duration::minutes(10) {
                assert!(
                    event_times.contains(&pair[1].timestamp),
                    "short gap must end on an event, ended at {}",
                    pair[1].timestamp
                );
            }
        }
    }

    #[test]
    fn passes_through_every_event() {
        let events = tide_day();
        let samples = interpolate(&events, Duration::minutes(7)).unwrap();

        for e in &events {
            let sample = samples
                .iter()
                .find(|s| s.timestamp == e.timestamp)
                .expect("event instant should be sampled");
            assert!((sample.height_m - e.height_m).abs() < 1e-9);
        }
    }

    #[test]
    fn never_overshoots_segment_endpoints() {
        let events = tide_day();
        let samples = interpolate(&events, Duration::minutes(1)).unwrap();

        for pair in events.windows(2) {
            let lo = pair[0].height_m.min(pair[1].height_m);
            let hi = pair[0].height_m.max(pair[1].height_m);
            for s in samples
                .iter()
                .filter(|s| s.timestamp >= pair[0].timestamp && s.timestamp <= pair[1].timestamp)
            {
                assert!(
                    s.height_m >= lo - 1e-12 && s.height_m <= hi + 1e-12,
                    "{} m at {} outside [{lo}, {hi}]",
                    s.height_m,
                    s.timestamp
                );
            }
        }
    }

    #[test]
    fn midpoint_is_halfway_and_curve_eases() {
        let samples = interpolate(&tide_day()[..2], Duration::minutes(1)).unwrap();
        let mid = samples.iter().find(|s| s.timestamp == at(6, 3, 0)).unwrap();
        assert!((mid.height_m - 1.25).abs() < 1e-9);

        // Slow near the low, fast in the middle
        let early = samples[1].height_m - samples[0].height_m;
        let middle = samples[181].height_m - samples[180].height_m;
        assert!(early < middle);
    }

    #[test]
    fn falling_segment_mirrors_rising() {
        let rising = cosine_height(0.5, 2.0, 0.25);
        let falling = cosine_height(2.0, 0.5, 0.75);
        assert!((rising - falling).abs() < 1e-12);
        assert_eq!(cosine_height(2.0, 0.5, 0.0), 2.0);
    }

    #[test]
    fn equal_heights_stay_flat() {
        let events = vec![
            event(at(6, 0, 0), 1.6, TideKind::High),
            event(at(6, 2, 0), 1.6, TideKind::Low),
        ];
        let samples = interpolate(&events, Duration::minutes(1)).unwrap();
        assert!(samples.iter().all(|s| s.height_m == 1.6));
    }

    #[test]
    fn too_few_events_is_insufficient_data() {
        let err = interpolate(&[], Duration::minutes(1)).unwrap_err();
        assert_eq!(err, ForecastError::TooFewEvents { count: 0 });

        let single = vec![event(at(6, 0, 0), 1.0, TideKind::High)];
        let err = interpolate(&single, Duration::minutes(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn rejects_non_positive_interval() {
        let err = interpolate(&tide_day(), Duration::zero()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        let err = interpolate(&tide_day(), Duration::minutes(-5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn rejects_interval_that_overflows_the_clock() {
        let err = interpolate(&tide_day(), Duration::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

        // Valid as a duration, but nearly two million years past 2025 is not a date
        let huge = Duration::try_minutes(1_000_000_000_000).unwrap();
        let err = interpolate(&tide_day(), huge).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn interval_longer_than_a_segment_keeps_only_events() {
        let samples = interpolate(&tide_day(), Duration::days(1)).unwrap();
        let times: Vec<_> = samples.iter().map(|s| s.timestamp).collect();
        let events: Vec<_> = tide_day().iter().map(|e| e.timestamp).collect();
        assert_eq!(times, events);
    }

    #[test]
    fn rejects_out_of_order_events() {
        let mut events = tide_day();
        events[2].timestamp = at(6, 5, 0);
        let err = interpolate(&events, Duration::minutes(1)).unwrap_err();
        assert_eq!(
            err,
            ForecastError::MalformedEventSequence {
                index: 2,
                fault: SequenceFault::NotIncreasing,
            }
        );

        let duplicate = vec![
            event(at(6, 0, 0), 0.5, TideKind::Low),
            event(at(6, 0, 0), 2.0, TideKind::High),
        ];
        assert_eq!(
            validate_events(&duplicate).unwrap_err().kind(),
            ErrorKind::MalformedEventSequence
        );
    }

    #[test]
    fn rejects_repeated_kind() {
        let events = vec![
            event(at(6, 0, 0), 0.5, TideKind::Low),
            event(at(6, 6, 0), 2.0, TideKind::High),
            event(at(6, 12, 0), 1.9, TideKind::High),
        ];
        let err = interpolate(&events, Duration::minutes(1)).unwrap_err();
        assert_eq!(
            err,
            ForecastError::MalformedEventSequence {
                index: 2,
                fault: SequenceFault::RepeatedKind(TideKind::High),
            }
        );
    }
}
