//! Finalized daily log records and their serialized shape.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::category::DutyCategory;
use crate::error::ValidationError;
use crate::event::StatusEvent;
use crate::segment::Segment;
use crate::summary::DailySummary;

/// Upper bound for hours reported against the 70-hour/8-day cycle.
pub const MAX_CYCLE_HOURS: f64 = 70.0;

/// Average speed used when no authoritative mileage is available.
pub const DEFAULT_AVERAGE_SPEED_MPH: f64 = 55.0;

const REMARK_SEPARATOR: &str = " → ";
const EMPTY_REMARKS: &str = "En route";

/// Driver, vehicle and trip details printed on each log sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripMetadata {
    pub driver_name: String,
    pub carrier_name: String,
    pub carrier_address: String,
    pub home_terminal: String,
    pub vehicle_number: String,
    pub trailer_number: String,
    pub current_location: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    /// Hours already used in the current cycle. Reported, not enforced.
    pub current_cycle_hours: f64,
}

impl TripMetadata {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let hours = self.current_cycle_hours;
        if !hours.is_finite() || !(0.0..=MAX_CYCLE_HOURS).contains(&hours) {
            return Err(ValidationError::CycleHoursOutOfRange {
                value: hours,
                max: MAX_CYCLE_HOURS,
            });
        }
        Ok(())
    }

    /// Pickup location, if one was entered.
    pub fn pickup(&self) -> Option<&str> {
        let pickup = self.pickup_location.trim();
        (!pickup.is_empty()).then_some(pickup)
    }
}

/// A closed segment as it appears in a finalized log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggedSegment {
    #[serde(rename = "status")]
    pub category: DutyCategory,
    pub start: f64,
    pub end: f64,
}

impl LoggedSegment {
    /// Converts a closed segment; open segments have no logged form.
    pub const fn from_segment(segment: &Segment) -> Option<Self> {
        match segment.end_hour() {
            Some(end) => Some(Self {
                category: segment.category,
                start: segment.start,
                end,
            }),
            None => None,
        }
    }

    pub const fn to_segment(self) -> Segment {
        Segment::closed(self.category, self.start, self.end)
    }
}

/// An immutable, finalized log for one day.
///
/// Serializes to the shape consumed by download and print:
/// `{date, totalMiles, segments, summary, remarks, tripData, finalizedAt}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogRecord {
    date: NaiveDate,
    total_miles: f64,
    segments: Vec<LoggedSegment>,
    summary: DailySummary,
    remarks: String,
    trip_data: TripMetadata,
    finalized_at: DateTime<Utc>,
}

impl DailyLogRecord {
    pub(crate) const fn new(
        date: NaiveDate,
        total_miles: f64,
        segments: Vec<LoggedSegment>,
        summary: DailySummary,
        remarks: String,
        trip_data: TripMetadata,
        finalized_at: DateTime<Utc>,
    ) -> Self {
        Self {
            date,
            total_miles,
            segments,
            summary,
            remarks,
            trip_data,
            finalized_at,
        }
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub const fn total_miles(&self) -> f64 {
        self.total_miles
    }

    pub fn segments(&self) -> &[LoggedSegment] {
        &self.segments
    }

    /// Segments in timeline form, e.g. for grid projection.
    pub fn timeline(&self) -> Vec<Segment> {
        self.segments.iter().map(|s| s.to_segment()).collect()
    }

    pub const fn summary(&self) -> &DailySummary {
        &self.summary
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub const fn trip_data(&self) -> &TripMetadata {
        &self.trip_data
    }

    pub const fn finalized_at(&self) -> DateTime<Utc> {
        self.finalized_at
    }
}

/// Builds the remarks line from the day's events.
///
/// Distinct non-empty locations in first-seen order, then the pickup location
/// if it is not already listed.
pub fn derive_remarks(events: &[StatusEvent], trip: &TripMetadata) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for event in events.iter().filter(|e| e.has_location()) {
        let location = event.location.trim();
        if !seen.contains(&location) {
            seen.push(location);
        }
    }
    if let Some(pickup) = trip.pickup() {
        if !seen.contains(&pickup) {
            seen.push(pickup);
        }
    }
    if seen.is_empty() {
        return EMPTY_REMARKS.to_string();
    }
    seen.join(REMARK_SEPARATOR)
}

/// Miles implied by driving time at `average_speed`, rounded to 0.1.
pub fn estimate_miles(driving_hours: f64, average_speed: f64) -> f64 {
    round_miles(driving_hours * average_speed)
}

/// Rounds a mileage figure to one decimal.
pub fn round_miles(miles: f64) -> f64 {
    (miles * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChangeKind;
    use chrono::TimeZone;

    fn event(location: &str) -> StatusEvent {
        StatusEvent::new(
            Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap(),
            DutyCategory::OnDuty,
            location,
            ChangeKind::Manual,
        )
    }

    #[test]
    fn remarks_are_distinct_locations_in_order() {
        let events = [
            event(""),
            event("New York, NY"),
            event("  "),
            event("Scranton, PA"),
            event("New York, NY"),
            event(" Scranton, PA "),
        ];
        let remarks = derive_remarks(&events, &TripMetadata::default());
        assert_eq!(remarks, "New York, NY → Scranton, PA");
    }

    #[test]
    fn remarks_append_pickup_once() {
        let trip = TripMetadata {
            pickup_location: "Chicago, IL".to_string(),
            ..TripMetadata::default()
        };
        let remarks = derive_remarks(&[event("Gary, IN")], &trip);
        assert_eq!(remarks, "Gary, IN → Chicago, IL");

        let remarks = derive_remarks(&[event("Chicago, IL")], &trip);
        assert_eq!(remarks, "Chicago, IL");
    }

    #[test]
    fn remarks_default_when_no_locations() {
        assert_eq!(derive_remarks(&[event("")], &TripMetadata::default()), "En route");
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "rounded values are compared exactly")]
    fn mileage_heuristic_uses_average_speed() {
        assert_eq!(estimate_miles(6.0, DEFAULT_AVERAGE_SPEED_MPH), 330.0);
        assert_eq!(estimate_miles(2.5, DEFAULT_AVERAGE_SPEED_MPH), 137.5);
        assert_eq!(estimate_miles(0.0, DEFAULT_AVERAGE_SPEED_MPH), 0.0);
    }

    #[test]
    fn cycle_hours_are_validated() {
        let mut trip = TripMetadata {
            current_cycle_hours: 42.5,
            ..TripMetadata::default()
        };
        assert!(trip.validate().is_ok());

        trip.current_cycle_hours = 70.5;
        assert!(matches!(
            trip.validate(),
            Err(ValidationError::CycleHoursOutOfRange { .. })
        ));

        trip.current_cycle_hours = f64::NAN;
        assert!(trip.validate().is_err());
    }

    #[test]
    fn logged_segment_serializes_status_index() {
        let segment = LoggedSegment {
            category: DutyCategory::OnDuty,
            start: 6.0,
            end: 7.5,
        };
        let json = serde_json::to_value(segment).unwrap();
        assert_eq!(json, serde_json::json!({"status": 3, "start": 6.0, "end": 7.5}));
        assert!(LoggedSegment::from_segment(&Segment::open(DutyCategory::Driving, 1.0)).is_none());
    }

    #[test]
    fn record_serializes_download_shape() {
        let record = DailyLogRecord::new(
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            110.0,
            vec![
                LoggedSegment {
                    category: DutyCategory::OffDuty,
                    start: 0.0,
                    end: 22.0,
                },
                LoggedSegment {
                    category: DutyCategory::Driving,
                    start: 22.0,
                    end: 24.0,
                },
            ],
            DailySummary {
                off_duty: 22.0,
                driving: 2.0,
                ..DailySummary::default()
            },
            "En route".to_string(),
            TripMetadata::default(),
            Utc.with_ymd_and_hms(2025, 1, 16, 0, 0, 0).unwrap(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2025-01-15");
        assert_eq!(json["totalMiles"], 110.0);
        assert_eq!(json["segments"][1]["status"], 2);
        assert_eq!(json["summary"]["offDuty"], 22.0);
        assert_eq!(json["summary"]["onDuty"], 0.0);
        assert_eq!(json["tripData"]["currentCycleHours"], 0.0);
        assert_eq!(json["remarks"], "En route");

        let parsed: DailyLogRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);

        insta::assert_snapshot!(serde_json::to_string_pretty(&record).unwrap(), @r#"
        {
          "date": "2025-01-15",
          "totalMiles": 110.0,
          "segments": [
            {
              "status": 0,
              "start": 0.0,
              "end": 22.0
            },
            {
              "status": 2,
              "start": 22.0,
              "end": 24.0
            }
          ],
          "summary": {
            "offDuty": 22.0,
            "sleeper": 0.0,
            "driving": 2.0,
            "onDuty": 0.0
          },
          "remarks": "En route",
          "tripData": {
            "driverName": "",
            "carrierName": "",
            "carrierAddress": "",
            "homeTerminal": "",
            "vehicleNumber": "",
            "trailerNumber": "",
            "currentLocation": "",
            "pickupLocation": "",
            "dropoffLocation": "",
            "currentCycleHours": 0.0
          },
          "finalizedAt": "2025-01-16T00:00:00Z"
        }
        "#);
    }
}
