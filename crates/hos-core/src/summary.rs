//! Per-category hour totals.

use serde::{Deserialize, Serialize};

use crate::category::DutyCategory;
use crate::segment::Segment;

/// Hours spent in each duty category, rounded to 0.01.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub off_duty: f64,
    pub sleeper: f64,
    pub driving: f64,
    pub on_duty: f64,
}

impl DailySummary {
    /// Sums closed segment durations per category.
    ///
    /// The open segment contributes nothing. Zero or negative durations are
    /// skipped. Each total is rounded independently.
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut totals = [0.0_f64; 4];
        for segment in segments {
            let Some(duration) = segment.duration() else {
                continue;
            };
            if duration <= 0.0 {
                continue;
            }
            totals[usize::from(segment.category.index())] += duration;
        }
        Self {
            off_duty: round_hours(totals[0]),
            sleeper: round_hours(totals[1]),
            driving: round_hours(totals[2]),
            on_duty: round_hours(totals[3]),
        }
    }

    /// Total for one category.
    pub const fn hours(&self, category: DutyCategory) -> f64 {
        match category {
            DutyCategory::OffDuty => self.off_duty,
            DutyCategory::SleeperBerth => self.sleeper,
            DutyCategory::Driving => self.driving,
            DutyCategory::OnDuty => self.on_duty,
        }
    }

    /// Sum of all four categories.
    pub fn total(&self) -> f64 {
        self.off_duty + self.sleeper + self.driving + self.on_duty
    }
}

/// Rounds hours to two decimals, halves away from zero.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
