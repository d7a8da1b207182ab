//! Log-day boundaries and hour-of-day arithmetic.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Number of hours on a log sheet.
pub const HOURS_PER_DAY: f64 = 24.0;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// A calendar day of driver activity, anchored at its starting instant.
///
/// A log day always spans exactly 24 elapsed hours from `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDay {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
}

impl LogDay {
    pub const fn new(date: NaiveDate, start: DateTime<Utc>) -> Self {
        Self { date, start }
    }

    /// The log day for `date` starting at midnight in `tz`.
    pub fn in_timezone<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        Self {
            date,
            start: midnight_to_utc(date, tz),
        }
    }

    /// First instant after this log day.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::hours(24)
    }

    /// The log day immediately after this one.
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            date: self.date.succ_opt().unwrap_or(self.date),
            start: self.end(),
        }
    }

    /// Whether `timestamp` is at or after the end of this day.
    pub fn has_ended_by(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.end()
    }

    /// Fractional hours from the start of the day to `timestamp`, clamped to `[0, 24]`.
    #[expect(
        clippy::cast_precision_loss,
        reason = "millisecond offsets within a day fit in f64"
    )]
    pub fn hour_of_day(&self, timestamp: DateTime<Utc>) -> f64 {
        let elapsed_ms = (timestamp - self.start).num_milliseconds();
        (elapsed_ms as f64 / MS_PER_HOUR).clamp(0.0, HOURS_PER_DAY)
    }
}

/// Converts a date at local midnight in `tz` to UTC.
/// Handles DST ambiguity by picking the earlier time.
fn midnight_to_utc<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        // Single or ambiguous (DST fall-back): use the earlier time
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            // DST spring-forward gap at midnight; 1am local exists
            let one_am = midnight + Duration::hours(1);
            tz.from_local_datetime(&one_am)
                .earliest()
                .map_or_else(|| midnight.and_utc(), |dt| dt.with_timezone(&Utc))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    }

    #[test]
    fn utc_day_starts_at_midnight() {
        let day = LogDay::in_timezone(date(), &Utc);
        assert_eq!(day.start.to_rfc3339(), "2025-03-04T00:00:00+00:00");
        assert_eq!(day.end().to_rfc3339(), "2025-03-05T00:00:00+00:00");
    }

    #[test]
    fn offset_day_starts_at_local_midnight() {
        let chicago = FixedOffset::west_opt(6 * 3600).unwrap();
        let day = LogDay::in_timezone(date(), &chicago);
        assert_eq!(day.start.to_rfc3339(), "2025-03-04T06:00:00+00:00");
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "whole and half hours are exact in f64")]
    fn hour_of_day_is_fractional_and_clamped() {
        let day = LogDay::in_timezone(date(), &Utc);
        assert_eq!(day.hour_of_day(day.start), 0.0);
        assert_eq!(day.hour_of_day(day.start + Duration::minutes(90)), 1.5);
        assert_eq!(day.hour_of_day(day.end()), 24.0);
        assert_eq!(day.hour_of_day(day.end() + Duration::hours(3)), 24.0);
        assert_eq!(day.hour_of_day(day.start - Duration::hours(1)), 0.0);
    }

    #[test]
    fn next_day_is_contiguous() {
        let day = LogDay::in_timezone(date(), &Utc);
        let next = day.next();
        assert_eq!(next.start, day.end());
        assert_eq!(next.date, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
        assert!(day.has_ended_by(next.start));
        assert!(!next.has_ended_by(next.start));
    }
}
