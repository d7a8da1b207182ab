//! Core domain logic for hours-of-service driver logs.
//!
//! This crate contains the fundamental types and logic for:
//! - Sessions: recording duty changes for one log day
//! - Segments: compiling the event log into a contiguous 24-hour timeline
//! - Summaries and compliance: per-category totals and the driving limit
//! - Grid projection: clipping segments to the hour buckets of a log sheet
//! - Finalization: closing a day into an immutable record and persisting it

pub mod category;
pub mod compliance;
pub mod error;
pub mod event;
pub mod finalizer;
pub mod grid;
pub mod record;
pub mod segment;
pub mod session;
pub mod summary;
pub mod time;

pub use category::{DutyCategory, UnknownDutyCategory};
pub use compliance::{ComplianceConfig, ComplianceReport, ComplianceStatus, UnenforcedCycleRule};
pub use error::{HosError, ValidationError};
pub use event::{ChangeKind, InvalidEventLog, StatusEvent, StatusEventLog};
pub use finalizer::{
    ChangeOutcome, FinalizeOutcome, Finalizer, LogStore, MileageSource, MileageUnavailable,
    NoMileage, PersistenceFailure,
};
pub use grid::GridRect;
pub use record::{DailyLogRecord, LoggedSegment, TripMetadata};
pub use segment::{Segment, SegmentEnd};
pub use session::{DaySession, Finalization, Mileage, SessionState, StatusChange};
pub use summary::DailySummary;
pub use time::LogDay;
