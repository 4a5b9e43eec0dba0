//! # Fallback Tide Model
//!
//! This module provides synthetic tide extrema when the provider cannot be
//! reached. It produces the same shape of data as [`crate::tide_data`]
//! (alternating High/Low [`TideEvent`]s) so the rest of the pipeline runs
//! unchanged, and the report marks the result as OFFLINE.
//!
//! ## Model Characteristics
//!
//! ### Semidiurnal Pattern
//! - **Period**: 12.42 hours (principal lunar M2), so a high or low every
//!   6.21 hours
//! - **Mean level**: 1.25 m above chart datum (Moreton Bay)
//! - **Amplitude**: 0.75 m (M2) plus up to 0.20 m (S2)
//!
//! ### Spring–Neap Envelope
//! The S2 contribution is scaled by `cos(2φ)` where `φ` is the moon's
//! phase angle, so ranges peak around new and full moon and shrink at the
//! quarters. The moon's age is measured from the new moon of 2000-01-06
//! 18:14 UTC using the mean synodic month.
//!
//! ### Accuracy Trade-offs
//! - ✅ **Correct period**: matches the real semidiurnal cycle
//! - ✅ **Spring–neap envelope**: bigger tides near new/full moon
//! - ✅ **Deterministic**: the same range always yields the same events
//! - ❌ **Not station-synchronised**: high water times can be hours off
//! - ❌ **No diurnal inequality or weather effects**

use crate::tide_data::{check_range, FetchError, TideSource};
use crate::{DateRange, TideEvent, TideKind};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::f64::consts::TAU;
use tracing::warn;

const MEAN_LEVEL_M: f64 = 1.25;
const A_M2_M: f64 = 0.75;
const A_S2_M: f64 = 0.20;

/// Half of the M2 period, in seconds (6 h 12 m 36 s)
const HALF_M2_SECS: i64 = 22_356;

/// Mean synodic month in days
const SYNODIC_MONTH_DAYS: f64 = 29.530_588_2;

/// Reference new moon, 2000-01-06 18:14 UTC, as a Unix timestamp
const REFERENCE_NEW_MOON: i64 = 947_182_440;

/// Reference high water anchoring the synthetic phase (2000-01-01 03:30 UTC)
const REFERENCE_HIGH_WATER: i64 = 946_697_400;

/// Tidal amplitude at `instant`, including the spring–neap modulation.
fn amplitude_at(instant: i64) -> f64 {
    let age_days = (instant - REFERENCE_NEW_MOON) as f64 / 86_400.0;
    let phase = (age_days / SYNODIC_MONTH_DAYS).rem_euclid(1.0) * TAU;
    A_M2_M + A_S2_M * (2.0 * phase).cos()
}

/// Local midnight starting `date`, as a Unix timestamp
fn local_midnight(date: chrono::NaiveDate, tz: Tz) -> i64 {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.timestamp())
        // Zones whose clocks skip midnight: an hour early still brackets the day
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN).and_utc().timestamp() - 3_600)
}

/// Generate synthetic extrema that bracket every day of `range` in `tz`.
///
/// The first event is at or before the range's first local midnight and the
/// last one at or after the midnight that closes it.
pub fn approximate(range: DateRange, tz: Tz) -> Vec<TideEvent> {
    let from = local_midnight(range.start, tz);
    let until = local_midnight(range.end() + Duration::days(1), tz);

    let first_k = (from - REFERENCE_HIGH_WATER).div_euclid(HALF_M2_SECS);
    let last_k = (until - REFERENCE_HIGH_WATER).div_euclid(HALF_M2_SECS) + 1;

    let mut events = Vec::with_capacity((last_k - first_k + 1) as usize);
    for k in first_k..=last_k {
        let instant = REFERENCE_HIGH_WATER + k * HALF_M2_SECS;
        let Some(utc) = DateTime::<Utc>::from_timestamp(instant, 0) else {
            continue;
        };

        let amplitude = amplitude_at(instant);
        let (kind, height_m) = if k.rem_euclid(2) == 0 {
            (TideKind::High, MEAN_LEVEL_M + amplitude)
        } else {
            (TideKind::Low, MEAN_LEVEL_M - amplitude)
        };

        events.push(TideEvent {
            timestamp: utc.with_timezone(&tz),
            // Round to centimetres like published tables
            height_m: (height_m * 100.0).round() / 100.0,
            kind,
        });
    }

    events
}

/// [`TideSource`] backed by [`approximate`]
pub struct OfflineSource {
    pub timezone: Tz,
}

#[async_trait]
impl TideSource for OfflineSource {
    async fn fetch_events(&self, range: DateRange) -> Result<Vec<TideEvent>, FetchError> {
        check_range(range)?;
        warn!("using offline tide approximation");
        Ok(approximate(range, self.timezone))
    }
}
