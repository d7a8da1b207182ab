//! Event-to-interval compilation.
//!
//! Every event closes the open segment at its hour and opens a new one. Two
//! consecutive events with the same category still yield two adjacent
//! segments: the timeline keeps one segment per event.

use serde::{Deserialize, Serialize};

use crate::category::DutyCategory;
use crate::event::StatusEventLog;
use crate::time::{HOURS_PER_DAY, LogDay};

/// Where a segment ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "hour", rename_all = "snake_case")]
pub enum SegmentEnd {
    /// Still accumulating time.
    Open,
    /// Closed at an hour of day in `(0, 24]`.
    ClosedAt(f64),
}

/// A half-open interval of the log day spent in one duty category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub category: DutyCategory,
    pub start: f64,
    pub end: SegmentEnd,
}

impl Segment {
    pub const fn open(category: DutyCategory, start: f64) -> Self {
        Self {
            category,
            start,
            end: SegmentEnd::Open,
        }
    }

    pub const fn closed(category: DutyCategory, start: f64, end: f64) -> Self {
        Self {
            category,
            start,
            end: SegmentEnd::ClosedAt(end),
        }
    }

    pub const fn is_open(&self) -> bool {
        matches!(self.end, SegmentEnd::Open)
    }

    /// Closing hour, if closed.
    pub const fn end_hour(&self) -> Option<f64> {
        match self.end {
            SegmentEnd::Open => None,
            SegmentEnd::ClosedAt(hour) => Some(hour),
        }
    }

    /// Closing hour, treating an open segment as reaching `open_until`.
    pub fn end_or(&self, open_until: f64) -> f64 {
        self.end_hour().unwrap_or(open_until)
    }

    /// Duration in hours; `None` while open.
    pub fn duration(&self) -> Option<f64> {
        self.end_hour().map(|end| end - self.start)
    }
}

/// Incremental segment builder holding exactly one open segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentCompiler {
    segments: Vec<Segment>,
}

impl SegmentCompiler {
    /// Starts a day whose opening status is `category`.
    ///
    /// The first segment always begins at hour 0.
    pub fn new(category: DutyCategory) -> Self {
        Self {
            segments: vec![Segment::open(category, 0.0)],
        }
    }

    /// Compiles a whole event log against its log day.
    pub fn rebuild(log: &StatusEventLog, day: &LogDay) -> Vec<Segment> {
        let events = log.events();
        let mut compiler = Self::new(events[0].category);
        for event in &events[1..] {
            compiler.apply(event.category, day.hour_of_day(event.timestamp));
        }
        compiler.finish()
    }

    /// Closes the open segment at `hour` and opens a new one for `category`.
    pub fn apply(&mut self, category: DutyCategory, hour: f64) {
        self.close(hour);
        self.segments.push(Segment::open(category, hour));
    }

    /// Closes the trailing open segment at `hour`.
    ///
    /// `hour` is clamped so that it never precedes the segment's start and
    /// never passes the end of the day.
    pub fn close(&mut self, hour: f64) {
        close_open_segment(&mut self.segments, hour);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn finish(self) -> Vec<Segment> {
        self.segments
    }
}

/// Closes the trailing open segment of an already compiled timeline.
pub fn close_open_segment(segments: &mut [Segment], hour: f64) {
    if let Some(last) = segments.last_mut() {
        if last.is_open() {
            last.end = SegmentEnd::ClosedAt(hour.clamp(last.start, HOURS_PER_DAY));
        }
    }
}

/// Checks the timeline invariants: contiguous and at most one open segment, last.
#[expect(clippy::float_cmp, reason = "adjacent segments share the exact same hour value")]
pub fn is_well_formed(segments: &[Segment]) -> bool {
    let contiguous = segments
        .windows(2)
        .all(|pair| pair[0].end_hour().is_some_and(|end| end == pair[1].start));
    let open_count = segments.iter().filter(|s| s.is_open()).count();
    let open_is_last = segments.last().is_some_and(Segment::is_open) || open_count == 0;
    contiguous && open_count <= 1 && open_is_last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ChangeKind, StatusEvent};
    use chrono::{DateTime, Duration, NaiveDate, Utc};

    fn day() -> LogDay {
        LogDay::in_timezone(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), &Utc)
    }

    fn at(hours: f64) -> DateTime<Utc> {
        #[expect(clippy::cast_possible_truncation, reason = "test hours are small")]
        let minutes = (hours * 60.0).round() as i64;
        day().start + Duration::minutes(minutes)
    }

    fn log_of(changes: &[(f64, DutyCategory)]) -> StatusEventLog {
        let mut log = StatusEventLog::seeded(at(0.0), DutyCategory::OffDuty);
        for (hour, category) in changes {
            log.record(StatusEvent::new(at(*hour), *category, "", ChangeKind::Manual))
                .unwrap();
        }
        log
    }

    #[test]
    fn seeded_log_compiles_to_one_open_segment() {
        let segments = SegmentCompiler::rebuild(&log_of(&[]), &day());
        assert_eq!(segments, vec![Segment::open(DutyCategory::OffDuty, 0.0)]);
    }

    #[test]
    fn each_event_closes_previous_and_opens_next() {
        let segments = SegmentCompiler::rebuild(
            &log_of(&[(6.0, DutyCategory::OnDuty), (7.5, DutyCategory::Driving)]),
            &day(),
        );
        assert_eq!(
            segments,
            vec![
                Segment::closed(DutyCategory::OffDuty, 0.0, 6.0),
                Segment::closed(DutyCategory::OnDuty, 6.0, 7.5),
                Segment::open(DutyCategory::Driving, 7.5),
            ]
        );
        assert!(is_well_formed(&segments));
    }

    #[test]
    fn same_category_events_are_not_merged() {
        let segments = SegmentCompiler::rebuild(
            &log_of(&[
                (8.0, DutyCategory::Driving),
                (10.0, DutyCategory::Driving),
                (11.0, DutyCategory::Driving),
            ]),
            &day(),
        );
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[1], Segment::closed(DutyCategory::Driving, 8.0, 10.0));
        assert_eq!(segments[2], Segment::closed(DutyCategory::Driving, 10.0, 11.0));
        assert_eq!(segments[3], Segment::open(DutyCategory::Driving, 11.0));
    }

    #[test]
    fn contiguity_holds_for_many_changes() {
        let changes: Vec<(f64, DutyCategory)> = (1..48)
            .map(|i| {
                let hour = f64::from(i) * 0.5;
                (hour, DutyCategory::ALL[usize::try_from(i).unwrap() % 4])
            })
            .collect();
        let segments = SegmentCompiler::rebuild(&log_of(&changes), &day());
        assert_eq!(segments.len(), 48);
        assert!(is_well_formed(&segments));
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_hour(), Some(pair[1].start));
        }
    }

    #[test]
    fn close_marks_midnight_distinct_from_open() {
        let mut compiler = SegmentCompiler::new(DutyCategory::SleeperBerth);
        compiler.close(24.0);
        let segments = compiler.finish();
        assert_eq!(segments[0].end, SegmentEnd::ClosedAt(24.0));
        assert!(!segments[0].is_open());
    }

    #[test]
    fn close_is_a_no_op_on_closed_timeline() {
        let mut segments = vec![Segment::closed(DutyCategory::OnDuty, 0.0, 5.0)];
        close_open_segment(&mut segments, 9.0);
        assert_eq!(segments[0].end_hour(), Some(5.0));
    }

    #[test]
    fn malformed_timelines_are_detected() {
        let gap = vec![
            Segment::closed(DutyCategory::OffDuty, 0.0, 5.0),
            Segment::open(DutyCategory::OnDuty, 6.0),
        ];
        assert!(!is_well_formed(&gap));

        let open_in_middle = vec![
            Segment::open(DutyCategory::OffDuty, 0.0),
            Segment::closed(DutyCategory::OnDuty, 6.0, 7.0),
        ];
        assert!(!is_well_formed(&open_in_middle));
    }
}
