//! # Terminal Rendering
//!
//! Prints a forecast as a table with one line per day. Each line ends with
//! a bar across the daylight hours, one cell per half hour, filled where a
//! boatable window touches that half hour. The bar makes a week's pattern
//! (windows drifting later by roughly fifty minutes a day) easy to spot.
//! The day's highs and lows follow the bar.
//!
//! ```text
//! Date        Window                Dur    Max   Min   06    09    12    15
//! Mon 06 Jan  06:00 AM - 08:04 AM  02:04  2.00  0.50  █████·················  H 06:00 2.00 / L 12:00 0.50
//! ```

use crate::config::{Config, DaylightWindow};
use crate::export::{format_duration, format_window};
use crate::{DailySummary, Forecast, TideKind};
use chrono::{Duration, NaiveTime, Timelike};

/// Width of one bar cell
const SLOT_MINUTES: i64 = 30;

const FILLED: char = '█';
const EMPTY: char = '·';

/// Start times of the half-hour cells covering `daylight`
fn slots(daylight: &DaylightWindow) -> Vec<NaiveTime> {
    let mut out = Vec::new();
    let mut t = daylight.start;
    loop {
        out.push(t);
        let (next, wrapped) = t.overflowing_add_signed(Duration::minutes(SLOT_MINUTES));
        if wrapped != 0 || next > daylight.end {
            break;
        }
        t = next;
    }
    out
}

/// One character per half hour of daylight.
pub fn daylight_bar(day: &DailySummary, daylight: &DaylightWindow) -> String {
    slots(daylight)
        .into_iter()
        .map(|slot| {
            let slot_end = slot + Duration::minutes(SLOT_MINUTES);
            let covered = day.windows.iter().any(|w| {
                let (start, end) = (w.start.time(), w.end.time());
                start < slot_end && end >= slot
            });
            if covered {
                FILLED
            } else {
                EMPTY
            }
        })
        .collect()
}

/// `H 04:02 2.21 / L 10:18 0.61`, or `-` for a day without extrema
pub fn tide_list(day: &DailySummary) -> String {
    if day.tides.is_empty() {
        return "-".to_string();
    }
    day.tides
        .iter()
        .map(|e| {
            let mark = match e.kind {
                TideKind::High => 'H',
                TideKind::Low => 'L',
            };
            format!("{mark} {} {:.2}", e.timestamp.format("%H:%M"), e.height_m)
        })
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Hour labels lined up with [`daylight_bar`] cells, every third hour.
fn hour_axis(daylight: &DaylightWindow) -> String {
    let cells = slots(daylight);
    let mut axis = vec![' '; cells.len() + 2];
    for (i, t) in cells.iter().enumerate() {
        if t.minute() == 0 && t.hour() % 3 == 0 {
            for (j, ch) in format!("{:02}", t.hour()).chars().enumerate() {
                if let Some(cell) = axis.get_mut(i + j) {
                    *cell = ch;
                }
            }
        }
    }
    axis.into_iter().collect::<String>().trim_end().to_string()
}

/// Build the full report as a string.
pub fn render(forecast: &Forecast, config: &Config, offline: bool) -> String {
    let daylight = &config.window.daylight;
    let mut out = String::new();

    out.push_str(&format!(
        "{} | tide >= {:.2} m | daylight {}-{}\n",
        config.location.name,
        config.window.threshold_m,
        daylight.start.format("%H:%M"),
        daylight.end.format("%H:%M"),
    ));
    if offline {
        out.push_str("⚠ OFFLINE (approximate tides)\n");
    }
    out.push('\n');

    let cells = slots(daylight).len();
    out.push_str(&format!(
        "{:<11} {:<20} {:>5} {:>5} {:>5}  {:<cells$}  {}\n",
        "Date",
        "Window",
        "Dur",
        "Max",
        "Min",
        hour_axis(daylight),
        "Tides",
    ));

    for day in &forecast.days {
        let (window, duration) = match &day.window {
            Some(w) => (format_window(w), format_duration(w.duration)),
            None => ("-".to_string(), "-".to_string()),
        };
        let extra = match day.windows.len() {
            0 | 1 => String::new(),
            n => format!(" (+{})", n - 1),
        };
        out.push_str(&format!(
            "{:<11} {:<20} {:>5} {:>5.2} {:>5.2}  {}{}  {}\n",
            day.date.format("%a %d %b").to_string(),
            window,
            duration,
            day.max_height_m,
            day.min_height_m,
            daylight_bar(day, daylight),
            extra,
            tide_list(day),
        ));
    }

    let overall = &forecast.overall;
    let tide_points: usize = forecast.days.iter().map(|d| d.tides.len()).sum();
    out.push('\n');
    out.push_str(&format!(
        "Max {:.2} m  Min {:.2} m  Tides {}  Boatable {}  Best day {}\n",
        overall.max_height_m,
        overall.min_height_m,
        tide_points,
        format_duration(overall.total_boatable),
        overall
            .best_day
            .map(|d| d.format("%a %d %b").to_string())
            .unwrap_or_else(|| "none".to_string()),
    ));

    out
}

/// Render the forecast to stdout.
pub fn draw_ascii(forecast: &Forecast, config: &Config, offline: bool) {
    print!("{}", render(forecast, config, offline));
}
