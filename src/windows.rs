//! # Boatable Window Extraction
//!
//! Scans interpolated samples in time order and groups the boatable ones
//! into windows. A sample is boatable when its height is at or above the
//! threshold **and** its local time of day lies inside the daylight bounds
//! (both ends inclusive).
//!
//! A window closes at its last boatable sample when any of these happen:
//! - the next sample is not boatable
//! - the next sample falls on a different local calendar day
//! - the samples run out
//!
//! Windows therefore never straddle midnight, and a day without a single
//! boatable sample contributes nothing.

use crate::{BoatableWindow, Sample, WindowConfig};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use tracing::trace;

/// Whether one sample passes the height and daylight tests.
pub fn is_boatable(sample: &Sample, config: &WindowConfig) -> bool {
    sample.height_m >= config.threshold_m && config.daylight.contains(sample.timestamp.time())
}

/// Run currently being built
struct OpenWindow {
    date: NaiveDate,
    start: DateTime<Tz>,
    last: DateTime<Tz>,
}

impl OpenWindow {
    fn close(self) -> BoatableWindow {
        trace!(date = %self.date, start = %self.start, end = %self.last, "window closed");
        BoatableWindow {
            date: self.date,
            start: self.start,
            end: self.last,
            duration: self.last.signed_duration_since(self.start),
        }
    }
}

/// Collect every boatable window in `samples`, in time order.
///
/// `samples` must be sorted by timestamp, as [`crate::interpolate::interpolate`]
/// produces them.
pub fn extract_windows(samples: &[Sample], config: &WindowConfig) -> Vec<BoatableWindow> {
    let mut found = Vec::new();
    let mut open: Option<OpenWindow> = None;

    for sample in samples {
        let date = sample.timestamp.date_naive();

        // Midnight always ends a run
        if open.as_ref().is_some_and(|w| w.date != date) {
            if let Some(window) = open.take() {
                found.push(window.close());
            }
        }

        if is_boatable(sample, config) {
            match open.as_mut() {
                Some(window) => window.last = sample.timestamp,
                None => {
                    open = Some(OpenWindow {
                        date,
                        start: sample.timestamp,
                        last: sample.timestamp,
                    })
                }
            }
        } else if let Some(window) = open.take() {
            found.push(window.close());
        }
    }

    if let Some(window) = open.take() {
        found.push(window.close());
    }

    found
}
