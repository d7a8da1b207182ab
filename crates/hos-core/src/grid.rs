//! Projection of segments onto the 24-hour log grid.

use serde::{Deserialize, Serialize};

use crate::category::DutyCategory;
use crate::segment::Segment;
use crate::time::HOURS_PER_DAY;

/// Number of hour buckets on a log sheet.
pub const BUCKETS: u8 = 24;

/// A filled region inside one hour bucket of one category row.
///
/// `left` and `width` are fractions of the bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRect {
    pub category: DutyCategory,
    pub bucket: u8,
    pub left: f64,
    pub width: f64,
}

/// Clips every segment to the hour buckets it overlaps.
///
/// Open segments are drawn to the end of the day. Output is ordered by
/// bucket, then category, then segment order; no rectangle crosses a bucket
/// boundary.
pub fn project(segments: &[Segment]) -> Vec<GridRect> {
    let mut rects = Vec::new();
    for bucket in 0..BUCKETS {
        let hour = f64::from(bucket);
        for category in DutyCategory::ALL {
            for segment in segments.iter().filter(|s| s.category == category) {
                let end = segment.end_or(HOURS_PER_DAY);
                if segment.start >= hour + 1.0 || end <= hour {
                    continue;
                }
                let overlap_start = (segment.start - hour).max(0.0);
                let overlap_end = (end - hour).min(1.0);
                let width = overlap_end - overlap_start;
                if width <= 0.0 {
                    continue;
                }
                rects.push(GridRect {
                    category,
                    bucket,
                    left: overlap_start,
                    width,
                });
            }
        }
    }
    rects
}

/// Fraction of each bucket filled per category row, `[row][bucket]`.
pub fn coverage(rects: &[GridRect]) -> [[f64; BUCKETS as usize]; 4] {
    let mut rows = [[0.0; BUCKETS as usize]; 4];
    for rect in rects {
        rows[usize::from(rect.category.index())][usize::from(rect.bucket)] += rect.width;
    }
    rows
}
