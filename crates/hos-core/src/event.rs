//! Duty-status change events and the append-only event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::DutyCategory;
use crate::error::HosError;

/// How a duty change was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Entered by the driver.
    #[default]
    Manual,
    /// Produced by the system, e.g. a seeded status or a day rollover.
    Automatic,
}

impl ChangeKind {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
        }
    }
}

impl std::str::FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "automatic" => Ok(Self::Automatic),
            _ => Err(format!("invalid change kind: {s}")),
        }
    }
}

/// A single duty-status change. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub timestamp: DateTime<Utc>,
    pub category: DutyCategory,
    /// Free-text location; empty when unknown.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub change_kind: ChangeKind,
}

impl StatusEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        category: DutyCategory,
        location: impl Into<String>,
        change_kind: ChangeKind,
    ) -> Self {
        Self {
            timestamp,
            category,
            location: location.into(),
            change_kind,
        }
    }

    /// Whether the location carries information worth putting in remarks.
    pub fn has_location(&self) -> bool {
        !self.location.trim().is_empty()
    }
}

/// Ordered record of the duty changes of one log day.
///
/// Never empty: a log always starts with its seeded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StatusEvent>", into = "Vec<StatusEvent>")]
pub struct StatusEventLog {
    events: Vec<StatusEvent>,
}

impl StatusEventLog {
    /// Starts a log with one automatic seed event.
    pub fn seeded(timestamp: DateTime<Utc>, category: DutyCategory) -> Self {
        Self {
            events: vec![StatusEvent::new(
                timestamp,
                category,
                String::new(),
                ChangeKind::Automatic,
            )],
        }
    }

    /// Rebuilds a log from stored events, checking their ordering.
    pub fn from_events(events: Vec<StatusEvent>) -> Result<Self, InvalidEventLog> {
        if events.is_empty() {
            return Err(InvalidEventLog::Empty);
        }
        if let Some(pair) = events.windows(2).find(|w| w[1].timestamp < w[0].timestamp) {
            return Err(InvalidEventLog::OutOfOrder {
                at: pair[1].timestamp,
            });
        }
        Ok(Self { events })
    }

    /// Appends an event.
    ///
    /// Equal timestamps are accepted; only strictly earlier ones are rejected.
    pub fn record(&mut self, event: StatusEvent) -> Result<(), HosError> {
        let previous = self.last().timestamp;
        if event.timestamp < previous {
            return Err(HosError::ClockRegression {
                previous,
                attempted: event.timestamp,
            });
        }
        self.events.push(event);
        Ok(())
    }

    pub fn events(&self) -> &[StatusEvent] {
        &self.events
    }

    /// The most recent event.
    pub fn last(&self) -> &StatusEvent {
        // Constructors guarantee at least one event.
        &self.events[self.events.len() - 1]
    }

    #[expect(clippy::len_without_is_empty, reason = "a log always holds its seed event")]
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl TryFrom<Vec<StatusEvent>> for StatusEventLog {
    type Error = InvalidEventLog;

    fn try_from(events: Vec<StatusEvent>) -> Result<Self, Self::Error> {
        Self::from_events(events)
    }
}

impl From<StatusEventLog> for Vec<StatusEvent> {
    fn from(log: StatusEventLog) -> Self {
        log.events
    }
}

/// Stored events that cannot form a log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEventLog {
    #[error("event log must contain at least one event")]
    Empty,
    #[error("event log is out of order at {at}")]
    OutOfOrder { at: DateTime<Utc> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0)
            .single()
            .expect("valid test timestamp")
            + Duration::minutes(minutes)
    }

    #[test]
    fn seeded_log_has_one_automatic_off_duty_event() {
        let log = StatusEventLog::seeded(ts(0), DutyCategory::OffDuty);
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().category, DutyCategory::OffDuty);
        assert_eq!(log.last().change_kind, ChangeKind::Automatic);
    }

    #[test]
    fn record_appends_in_order() {
        let mut log = StatusEventLog::seeded(ts(0), DutyCategory::OffDuty);
        log.record(StatusEvent::new(ts(60), DutyCategory::OnDuty, "Yard", ChangeKind::Manual))
            .unwrap();
        // Same instant is not a regression
        log.record(StatusEvent::new(ts(60), DutyCategory::Driving, "", ChangeKind::Manual))
            .unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.last().category, DutyCategory::Driving);
    }

    #[test]
    fn record_rejects_clock_regression_and_keeps_log() {
        let mut log = StatusEventLog::seeded(ts(0), DutyCategory::OffDuty);
        log.record(StatusEvent::new(ts(120), DutyCategory::OnDuty, "", ChangeKind::Manual))
            .unwrap();
        let before = log.clone();

        let err = log
            .record(StatusEvent::new(ts(90), DutyCategory::Driving, "", ChangeKind::Manual))
            .unwrap_err();

        assert!(matches!(err, HosError::ClockRegression { previous, attempted }
            if previous == ts(120) && attempted == ts(90)));
        assert_eq!(log, before);
    }

    #[test]
    fn from_events_validates_order() {
        assert_eq!(
            StatusEventLog::from_events(Vec::new()).unwrap_err(),
            InvalidEventLog::Empty
        );
        let events = vec![
            StatusEvent::new(ts(10), DutyCategory::OffDuty, "", ChangeKind::Automatic),
            StatusEvent::new(ts(5), DutyCategory::OnDuty, "", ChangeKind::Manual),
        ];
        assert!(matches!(
            StatusEventLog::from_events(events),
            Err(InvalidEventLog::OutOfOrder { .. })
        ));
    }

    #[test]
    fn event_serializes_camel_case() {
        let event = StatusEvent::new(ts(0), DutyCategory::Driving, "Reno, NV", ChangeKind::Manual);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["category"], 2);
        assert_eq!(json["changeKind"], "manual");
        assert_eq!(json["location"], "Reno, NV");
    }
}
