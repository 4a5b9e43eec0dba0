//! # Forecast Errors
//!
//! Every failure the core can report. Nothing here is retried or repaired:
//! the pipeline stops at the first broken invariant and says which one,
//! and for which event or day.

use crate::TideKind;
use chrono::NaiveDate;
use thiserror::Error;

/// Broad classification of a [`ForecastError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Not enough events, or a requested day with no samples
    InsufficientData,
    /// Events out of order or not alternating High/Low
    MalformedEventSequence,
    /// Bad interval, threshold or daylight bounds
    InvalidConfiguration,
}

/// What exactly is wrong with an event sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceFault {
    /// Timestamp is not later than the previous event's
    NotIncreasing,
    /// Same kind as the previous event
    RepeatedKind(TideKind),
}

impl std::fmt::Display for SequenceFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceFault::NotIncreasing => write!(f, "timestamp does not follow the previous event"),
            SequenceFault::RepeatedKind(kind) => write!(f, "two consecutive {kind} tides"),
        }
    }
}

/// Errors surfaced by interpolation, window extraction and aggregation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Fewer than two events cannot describe a curve
    #[error("insufficient data: need at least 2 tide events, got {count}")]
    TooFewEvents { count: usize },

    /// A requested day is outside the span covered by the events
    #[error("insufficient data: no samples cover {date}")]
    MissingDay { date: NaiveDate },

    /// The event sequence breaks ordering or alternation
    #[error("malformed event sequence at event {index}: {fault}")]
    MalformedEventSequence { index: usize, fault: SequenceFault },

    /// Window parameters are unusable
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ForecastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::TooFewEvents { .. } | ForecastError::MissingDay { .. } => {
                ErrorKind::InsufficientData
            }
            ForecastError::MalformedEventSequence { .. } => ErrorKind::MalformedEventSequence,
            ForecastError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_variants() {
        assert_eq!(
            ForecastError::TooFewEvents { count: 1 }.kind(),
            ErrorKind::InsufficientData
        );
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(
            ForecastError::MissingDay { date }.kind(),
            ErrorKind::InsufficientData
        );
        assert_eq!(
            ForecastError::InvalidConfiguration("x".into()).kind(),
            ErrorKind::InvalidConfiguration
        );
    }

    #[test]
    fn messages_name_the_failure() {
        let err = ForecastError::MalformedEventSequence {
            index: 3,
            fault: SequenceFault::RepeatedKind(TideKind::High),
        };
        assert_eq!(
            err.to_string(),
            "malformed event sequence at event 3: two consecutive high tides"
        );
    }
}
