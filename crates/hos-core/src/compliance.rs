//! Hours-of-service threshold checks.

use serde::{Deserialize, Serialize};

use crate::summary::DailySummary;

/// Configured HOS thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Driving hours per day at which the day becomes a violation.
    pub max_driving_hours: f64,

    /// The 70-hour/8-day cycle limit.
    ///
    /// Carried for reporting only: it is not evaluated.
    pub cycle: UnenforcedCycleRule,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            max_driving_hours: 11.0,
            cycle: UnenforcedCycleRule::default(),
        }
    }
}

/// Cycle limit collected from configuration but never applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnenforcedCycleRule {
    pub limit_hours: f64,
    pub days: u32,
}

impl Default for UnenforcedCycleRule {
    fn default() -> Self {
        Self {
            limit_hours: 70.0,
            days: 8,
        }
    }
}

/// Two-valued compliance signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Compliant,
    Violation,
}

/// Outcome of evaluating a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub status: ComplianceStatus,
    pub driving_hours: f64,
    pub max_driving_hours: f64,
}

impl ComplianceReport {
    pub fn is_compliant(&self) -> bool {
        self.status == ComplianceStatus::Compliant
    }
}

/// Applies the driving-hours rule: strictly below the limit is compliant.
pub fn evaluate(summary: &DailySummary, config: &ComplianceConfig) -> ComplianceReport {
    let status = if summary.driving < config.max_driving_hours {
        ComplianceStatus::Compliant
    } else {
        ComplianceStatus::Violation
    };
    ComplianceReport {
        status,
        driving_hours: summary.driving,
        max_driving_hours: config.max_driving_hours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driving(hours: f64) -> DailySummary {
        DailySummary {
            driving: hours,
            ..DailySummary::default()
        }
    }

    #[test]
    fn below_limit_is_compliant() {
        let config = ComplianceConfig::default();
        assert!(evaluate(&driving(0.0), &config).is_compliant());
        assert!(evaluate(&driving(10.99), &config).is_compliant());
        assert!(evaluate(&driving(10.999), &config).is_compliant());
    }

    #[test]
    fn limit_itself_is_a_violation() {
        let config = ComplianceConfig::default();
        let report = evaluate(&driving(11.0), &config);
        assert_eq!(report.status, ComplianceStatus::Violation);
        assert!(evaluate(&driving(13.5), &config).status == ComplianceStatus::Violation);
    }

    #[test]
    fn report_carries_driving_total() {
        let config = ComplianceConfig {
            max_driving_hours: 10.0,
            ..ComplianceConfig::default()
        };
        let report = evaluate(&driving(9.25), &config);
        assert!((report.driving_hours - 9.25).abs() < f64::EPSILON);
        assert!((report.max_driving_hours - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cycle_rule_is_not_evaluated() {
        let config = ComplianceConfig {
            cycle: UnenforcedCycleRule {
                limit_hours: 0.0,
                days: 8,
            },
            ..ComplianceConfig::default()
        };
        assert!(evaluate(&driving(2.0), &config).is_compliant());
    }
}
