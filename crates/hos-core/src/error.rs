//! Engine error types.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Validation errors for caller-supplied values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Cycle hours must be a finite number of hours within the cycle limit.
    #[error("current cycle hours must be between 0 and {max}, got {value}")]
    CycleHoursOutOfRange { value: f64, max: f64 },

    /// A mileage figure was negative or not a number.
    #[error("mileage must be a non-negative number, got {value}")]
    InvalidMileage { value: f64 },
}

/// Errors from timeline operations.
///
/// Every variant is raised before any state is touched, so the session the
/// operation was called on is still valid afterwards.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HosError {
    /// A new event is timestamped before the previous one.
    #[error("clock regression: {attempted} is earlier than the last recorded event at {previous}")]
    ClockRegression {
        previous: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    /// The day session has already been closed into a daily log.
    #[error("the log for {date} has already been finalized")]
    AlreadyFinalized { date: NaiveDate },

    /// The timestamp falls outside the session's log day.
    #[error("{timestamp} falls outside the log day {date}")]
    OutsideLogDay {
        date: NaiveDate,
        timestamp: DateTime<Utc>,
    },

    /// Invalid input value.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
