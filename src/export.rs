//! # CSV Export
//!
//! Writes one row per day with up to two windows, the layout the ramp's
//! printed tide sheet has always used:
//!
//! ```text
//! Date,Window 1,Duration 1,Window 2,Duration 2,Max Height,Min Height
//! "Monday, January 06",06:00 AM - 08:04 AM,02:04,,,2.00,0.50
//! ```

use crate::{BoatableWindow, DailySummary, Forecast};
use chrono::Duration;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// One CSV line
#[derive(Debug, Serialize)]
pub struct DayRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Window 1")]
    pub window_1: String,
    #[serde(rename = "Duration 1")]
    pub duration_1: String,
    #[serde(rename = "Window 2")]
    pub window_2: String,
    #[serde(rename = "Duration 2")]
    pub duration_2: String,
    #[serde(rename = "Max Height")]
    pub max_height: String,
    #[serde(rename = "Min Height")]
    pub min_height: String,
}

/// `HH:MM`, hours not wrapped at 24
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// `06:00 AM - 08:04 AM`
pub fn format_window(window: &BoatableWindow) -> String {
    format!(
        "{} - {}",
        window.start.format("%I:%M %p"),
        window.end.format("%I:%M %p")
    )
}

impl From<&DailySummary> for DayRow {
    fn from(day: &DailySummary) -> Self {
        let slot = |i: usize| {
            day.windows
                .get(i)
                .map(|w| (format_window(w), format_duration(w.duration)))
                .unwrap_or_default()
        };
        let (window_1, duration_1) = slot(0);
        let (window_2, duration_2) = slot(1);

        DayRow {
            date: day.date.format("%A, %B %d").to_string(),
            window_1,
            duration_1,
            window_2,
            duration_2,
            max_height: format!("{:.2}", day.max_height_m),
            min_height: format!("{:.2}", day.min_height_m),
        }
    }
}

/// Write the forecast as CSV to any writer.
pub fn write_csv_to<W: Write>(writer: W, forecast: &Forecast) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    for day in &forecast.days {
        csv.serialize(DayRow::from(day))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the forecast as CSV to `path`, replacing any existing file.
pub fn write_csv<P: AsRef<Path>>(path: P, forecast: &Forecast) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path.as_ref())?;
    write_csv_to(file, forecast)?;
    info!(path = %path.as_ref().display(), days = forecast.days.len(), "wrote tide windows CSV");
    Ok(())
}
