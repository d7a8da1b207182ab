//! The day session: one log day's event log plus its derived timeline.
//!
//! Sessions are values. Every operation takes `&self` and returns a new
//! session, so a rejected operation leaves the caller's session untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::category::DutyCategory;
use crate::compliance::{self, ComplianceConfig, ComplianceReport};
use crate::error::HosError;
use crate::event::{ChangeKind, InvalidEventLog, StatusEvent, StatusEventLog};
use crate::record::{
    DailyLogRecord, LoggedSegment, TripMetadata, derive_remarks, estimate_miles, round_miles,
};
use crate::segment::{Segment, SegmentCompiler, close_open_segment};
use crate::summary::DailySummary;
use crate::time::{HOURS_PER_DAY, LogDay};

/// Lifecycle of a day session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Accepting duty changes.
    Open,
    /// Closed into a daily log. Terminal.
    Finalized,
}

impl SessionState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Finalized => "finalized",
        }
    }
}

/// A requested duty-status change.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub category: DutyCategory,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub kind: ChangeKind,
}

impl StatusChange {
    /// A manual change entered by the driver.
    pub fn manual(
        category: DutyCategory,
        location: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            location: location.into(),
            timestamp,
            kind: ChangeKind::Manual,
        }
    }

    fn into_event(self) -> StatusEvent {
        StatusEvent::new(self.timestamp, self.category, self.location, self.kind)
    }
}

/// How the day's mileage is established when closing a day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mileage {
    /// Figure reported by the mileage service.
    Reported(f64),
    /// No figure available: estimate from driving hours at this average speed.
    Estimated { average_speed: f64 },
}

impl Mileage {
    fn resolve(self, summary: &DailySummary) -> f64 {
        match self {
            Self::Reported(miles) => round_miles(miles),
            Self::Estimated { average_speed } => estimate_miles(summary.driving, average_speed),
        }
    }
}

/// The result of closing a day.
#[derive(Debug, Clone, PartialEq)]
pub struct Finalization {
    /// The closed session, now in the `Finalized` state.
    pub finalized: DaySession,
    /// The immutable record for the day.
    pub record: DailyLogRecord,
    /// A fresh session for the following day.
    pub next: DaySession,
}

/// One log day of duty changes and the timeline derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySession {
    day: LogDay,
    log: StatusEventLog,
    segments: Vec<Segment>,
    summary: DailySummary,
    finalized_at: Option<DateTime<Utc>>,
}

impl DaySession {
    /// Starts a session seeded with one off-duty event at `seeded_at`.
    pub fn start(day: LogDay, seeded_at: DateTime<Utc>) -> Self {
        Self::start_with(day, seeded_at, DutyCategory::OffDuty)
    }

    /// Starts a session whose opening status is `category`.
    pub fn start_with(day: LogDay, seeded_at: DateTime<Utc>, category: DutyCategory) -> Self {
        Self::derive(day, StatusEventLog::seeded(seeded_at, category), None)
    }

    /// Rebuilds a stored session. A session finalized at `finalized_at` gets
    /// its trailing segment closed there.
    pub fn restore(
        day: LogDay,
        events: Vec<StatusEvent>,
        finalized_at: Option<DateTime<Utc>>,
    ) -> Result<Self, InvalidEventLog> {
        let log = StatusEventLog::from_events(events)?;
        Ok(Self::derive(day, log, finalized_at))
    }

    fn derive(day: LogDay, log: StatusEventLog, finalized_at: Option<DateTime<Utc>>) -> Self {
        let mut segments = SegmentCompiler::rebuild(&log, &day);
        if let Some(at) = finalized_at {
            close_open_segment(&mut segments, day.hour_of_day(at));
        }
        let summary = DailySummary::from_segments(&segments);
        Self {
            day,
            log,
            segments,
            summary,
            finalized_at,
        }
    }

    pub const fn day(&self) -> &LogDay {
        &self.day
    }

    pub const fn date(&self) -> NaiveDate {
        self.day.date
    }

    pub fn events(&self) -> &[StatusEvent] {
        self.log.events()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub const fn summary(&self) -> &DailySummary {
        &self.summary
    }

    pub const fn state(&self) -> SessionState {
        if self.finalized_at.is_some() {
            SessionState::Finalized
        } else {
            SessionState::Open
        }
    }

    /// When the day was closed, if it has been.
    pub const fn finalized_at(&self) -> Option<DateTime<Utc>> {
        self.finalized_at
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }

    /// Category of the most recent event.
    pub fn current_category(&self) -> DutyCategory {
        self.log.last().category
    }

    /// Evaluates the current summary against `config`.
    pub fn compliance(&self, config: &ComplianceConfig) -> ComplianceReport {
        compliance::evaluate(&self.summary, config)
    }

    /// Appends a duty change and recomputes the timeline.
    ///
    /// The change must fall inside this log day; crossing midnight is handled
    /// by [`crate::Finalizer::record_change`].
    pub fn record_change(&self, change: StatusChange) -> Result<Self, HosError> {
        self.ensure_open()?;
        self.ensure_within_day(change.timestamp)?;
        if self.day.has_ended_by(change.timestamp) {
            return Err(HosError::OutsideLogDay {
                date: self.day.date,
                timestamp: change.timestamp,
            });
        }

        let mut log = self.log.clone();
        log.record(change.into_event())?;
        let next = Self::derive(self.day, log, None);
        tracing::debug!(
            date = %next.day.date,
            category = %next.current_category(),
            segments = next.segments.len(),
            "recorded duty change"
        );
        Ok(next)
    }

    /// Checks that the session can be finalized at `now`.
    ///
    /// Runs before any collaborator is contacted so a doomed finalize fails fast.
    /// A `now` past midnight passes; [`crate::Finalizer::finalize`] rolls the
    /// session over to the day holding `now` first.
    pub fn check_finalize(&self, now: DateTime<Utc>) -> Result<(), HosError> {
        self.ensure_open()?;
        self.ensure_within_day(now)?;
        let previous = self.log.last().timestamp;
        if now < previous {
            return Err(HosError::ClockRegression {
                previous,
                attempted: now,
            });
        }
        Ok(())
    }

    /// Closes the day at `now` and starts an off-duty session for the next day.
    ///
    /// `now` must fall inside the log day, midnight included. Later times go
    /// through [`crate::Finalizer::finalize`] so the hours after midnight keep
    /// their status.
    pub fn finalize(
        &self,
        now: DateTime<Utc>,
        trip: &TripMetadata,
        mileage: Mileage,
    ) -> Result<Finalization, HosError> {
        self.check_finalize(now)?;
        if now > self.day.end() {
            return Err(HosError::OutsideLogDay {
                date: self.day.date,
                timestamp: now,
            });
        }
        let next = Self::start(self.day.next(), now);
        Ok(self.close_into(self.day.hour_of_day(now), now, trip, mileage, next))
    }

    /// Closes the day at midnight because an event crossed into the next day.
    ///
    /// The next session opens at midnight with the status active at the end of
    /// this one.
    pub fn roll_over(&self, trip: &TripMetadata, mileage: Mileage) -> Result<Finalization, HosError> {
        self.ensure_open()?;
        let next_day = self.day.next();
        let next = Self::start_with(next_day, next_day.start, self.current_category());
        Ok(self.close_into(HOURS_PER_DAY, self.day.end(), trip, mileage, next))
    }

    fn close_into(
        &self,
        close_hour: f64,
        finalized_at: DateTime<Utc>,
        trip: &TripMetadata,
        mileage: Mileage,
        next: Self,
    ) -> Finalization {
        let mut segments = self.segments.clone();
        close_open_segment(&mut segments, close_hour);
        let summary = DailySummary::from_segments(&segments);

        let record = DailyLogRecord::new(
            self.day.date,
            mileage.resolve(&summary),
            segments.iter().filter_map(LoggedSegment::from_segment).collect(),
            summary,
            derive_remarks(self.log.events(), trip),
            trip.clone(),
            finalized_at,
        );

        let finalized = Self {
            day: self.day,
            log: self.log.clone(),
            segments,
            summary,
            finalized_at: Some(finalized_at),
        };

        tracing::info!(
            date = %self.day.date,
            total_hours = summary.total(),
            miles = record.total_miles(),
            "finalized daily log"
        );

        Finalization {
            finalized,
            record,
            next,
        }
    }

    fn ensure_open(&self) -> Result<(), HosError> {
        if self.is_finalized() {
            return Err(HosError::AlreadyFinalized {
                date: self.day.date,
            });
        }
        Ok(())
    }

    fn ensure_within_day(&self, timestamp: DateTime<Utc>) -> Result<(), HosError> {
        if timestamp < self.day.start {
            return Err(HosError::OutsideLogDay {
                date: self.day.date,
                timestamp,
            });
        }
        Ok(())
    }
}
