//! Day finalization against external collaborators.
//!
//! The mileage service and the log store sit behind traits so the core can be
//! driven by the SQLite store, the remote API, or test doubles.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::HosError;
use crate::record::{DEFAULT_AVERAGE_SPEED_MPH, DailyLogRecord, TripMetadata};
use crate::session::{DaySession, Finalization, Mileage, StatusChange};

/// The mileage service could not produce a figure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mileage unavailable: {reason}")]
pub struct MileageUnavailable {
    pub reason: String,
}

/// The log store rejected or failed to accept a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to persist daily log: {reason}")]
pub struct PersistenceFailure {
    pub reason: String,
}

impl PersistenceFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Supplies the authoritative mileage for the day being closed.
pub trait MileageSource {
    fn today_mileage(&self) -> Result<f64, MileageUnavailable>;
}

/// Durable storage for finalized logs.
pub trait LogStore {
    /// Persists a record and returns it as stored.
    fn save_log(&mut self, record: &DailyLogRecord) -> Result<DailyLogRecord, PersistenceFailure>;

    /// All stored records, oldest first.
    fn list_logs(&self) -> Result<Vec<DailyLogRecord>, PersistenceFailure>;
}

/// A mileage source that never has a figure. Finalization falls back to the
/// driving-time estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMileage;

impl MileageSource for NoMileage {
    fn today_mileage(&self) -> Result<f64, MileageUnavailable> {
        Err(MileageUnavailable {
            reason: "no mileage service configured".to_string(),
        })
    }
}

/// A closed day plus the result of handing its record to the store.
///
/// A persistence failure does not undo the close: the finalized session and
/// record are still returned so the caller can retry the save.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeOutcome {
    pub finalized: DaySession,
    pub record: DailyLogRecord,
    pub next: DaySession,
    pub persistence: Result<DailyLogRecord, PersistenceFailure>,
    /// Days closed at midnight before this one, oldest first.
    pub rolled_over: Vec<FinalizeOutcome>,
}

impl FinalizeOutcome {
    /// The first store failure among the rolled-over days and this one.
    pub fn persistence_failure(&self) -> Option<&PersistenceFailure> {
        self.rolled_over
            .iter()
            .chain(std::iter::once(self))
            .find_map(|outcome| outcome.persistence.as_ref().err())
    }
}

/// Result of recording a change that may have crossed midnight.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeOutcome {
    /// Session holding the new event.
    pub session: DaySession,
    /// Days closed at midnight on the way, oldest first.
    pub rolled_over: Vec<FinalizeOutcome>,
}

/// Closes days and persists the resulting records.
#[derive(Debug)]
pub struct Finalizer<M, S> {
    mileage: M,
    store: S,
    average_speed: f64,
}

impl<M: MileageSource, S: LogStore> Finalizer<M, S> {
    pub const fn new(mileage: M, store: S) -> Self {
        Self {
            mileage,
            store,
            average_speed: DEFAULT_AVERAGE_SPEED_MPH,
        }
    }

    /// Average speed for the mileage estimate.
    #[must_use]
    pub fn with_average_speed(mut self, average_speed: f64) -> Self {
        self.average_speed = average_speed;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Finalizes `session` at `now`.
    ///
    /// Session and trip checks run before the mileage service is contacted.
    /// When `now` lies past midnight, each day in between is first closed at
    /// midnight as [`Self::record_change`] does, and the day holding `now` is
    /// the one finalized.
    pub fn finalize(
        &mut self,
        session: &DaySession,
        now: DateTime<Utc>,
        trip: &TripMetadata,
    ) -> Result<FinalizeOutcome, HosError> {
        trip.validate()?;
        session.check_finalize(now)?;
        let mut current = session.clone();
        let mut rolled_over = Vec::new();
        while now > current.day().end() {
            let outcome = self.persist(current.roll_over(trip, self.estimate())?);
            current = outcome.next.clone();
            rolled_over.push(outcome);
        }
        let mileage = self.resolve_mileage();
        let finalization = current.finalize(now, trip, mileage)?;
        Ok(FinalizeOutcome {
            rolled_over,
            ..self.persist(finalization)
        })
    }

    /// Records a change, closing any days it crosses into at midnight.
    ///
    /// Rolled-over days use the driving-time estimate, since the mileage
    /// service only reports the current day.
    pub fn record_change(
        &mut self,
        session: &DaySession,
        change: StatusChange,
        trip: &TripMetadata,
    ) -> Result<ChangeOutcome, HosError> {
        let mut current = session.clone();
        let mut rolled_over = Vec::new();
        if !current.is_finalized() && current.day().has_ended_by(change.timestamp) {
            trip.validate()?;
        }
        while !current.is_finalized() && current.day().has_ended_by(change.timestamp) {
            let finalization = current.roll_over(trip, self.estimate())?;
            let outcome = self.persist(finalization);
            current = outcome.next.clone();
            rolled_over.push(outcome);
        }
        let session = current.record_change(change)?;
        Ok(ChangeOutcome {
            session,
            rolled_over,
        })
    }

    const fn estimate(&self) -> Mileage {
        Mileage::Estimated {
            average_speed: self.average_speed,
        }
    }

    fn resolve_mileage(&self) -> Mileage {
        match self.mileage.today_mileage() {
            Ok(miles) if miles.is_finite() && miles >= 0.0 => Mileage::Reported(miles),
            Ok(miles) => {
                tracing::warn!(miles, "ignoring invalid mileage figure, using estimate");
                self.estimate()
            }
            Err(e) => {
                tracing::warn!(error = %e, "mileage service unavailable, using estimate");
                self.estimate()
            }
        }
    }

    fn persist(&mut self, finalization: Finalization) -> FinalizeOutcome {
        let Finalization {
            finalized,
            record,
            next,
        } = finalization;
        let persistence = self.store.save_log(&record);
        if let Err(e) = &persistence {
            tracing::warn!(date = %record.date(), error = %e, "daily log not persisted");
        }
        FinalizeOutcome {
            finalized,
            record,
            next,
            persistence,
            rolled_over: Vec::new(),
        }
    }
}
