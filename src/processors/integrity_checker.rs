use crate::error::Result;
use crate::models::{Observation, TimeSeries};
use crate::utils::constants::{
    DAILY_TEMPERATURE_MAX, DAILY_TEMPERATURE_MEAN, DAILY_TEMPERATURE_MIN, MAX_VALID_HUMIDITY,
    MAX_VALID_PRECIPITATION, MAX_VALID_TEMP, MAX_VALID_WIND_DIRECTION, MAX_VALID_WIND_SPEED,
    MIN_VALID_TEMP,
};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub table: String,
    pub total_records: usize,
    pub complete_records: usize,
    pub missing_values: BTreeMap<String, usize>,
    pub gaps: Vec<Gap>,
    pub violations: Vec<Violation>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.gaps.is_empty()
            && self.violations.is_empty()
            && self.complete_records == self.total_records
    }
}

/// Stretch between two consecutive observations wider than the cadence interval
#[derive(Debug, Clone, PartialEq)]
pub struct Gap {
    pub after: NaiveDateTime,
    pub before: NaiveDateTime,
    pub missing_intervals: i64,
}

#[derive(Debug, Clone)]
pub struct Violation {
    pub timestamp: NaiveDateTime,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationType {
    OutOfRange,
    MinGreaterThanMax,
    MeanOutsideRange,
    SuspiciousJump,
}

/// Plausible physical range for a parameter, by its unit suffix and name
fn valid_range(parameter: &str) -> Option<(f64, f64)> {
    if parameter.starts_with("temperature") {
        Some((MIN_VALID_TEMP, MAX_VALID_TEMP))
    } else if parameter.starts_with("relative_humidity") {
        Some((0.0, MAX_VALID_HUMIDITY))
    } else if parameter.starts_with("precipitation") {
        Some((0.0, MAX_VALID_PRECIPITATION))
    } else if parameter.starts_with("wind_direction") {
        Some((0.0, MAX_VALID_WIND_DIRECTION))
    } else if parameter.starts_with("wind_speed") || parameter.starts_with("wind_gusts") {
        Some((0.0, MAX_VALID_WIND_SPEED))
    } else {
        None
    }
}

pub struct IntegrityChecker {
    temperature_jump_threshold: f64,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self {
            temperature_jump_threshold: 20.0, // °C between consecutive observations
        }
    }

    pub fn with_jump_threshold(threshold: f64) -> Self {
        Self {
            temperature_jump_threshold: threshold,
        }
    }

    /// Check a series for gaps, missing values and implausible readings
    pub fn check_integrity(&self, series: &TimeSeries) -> Result<IntegrityReport> {
        let mut report = IntegrityReport {
            table: series.table_name().to_string(),
            total_records: series.len(),
            complete_records: series.len() - series.incomplete_count(),
            missing_values: BTreeMap::new(),
            gaps: Vec::new(),
            violations: Vec::new(),
        };

        for (index, parameter) in series.parameters().iter().enumerate() {
            let missing = series
                .observations()
                .iter()
                .filter(|o| o.value(index).is_none())
                .count();
            report.missing_values.insert(parameter.clone(), missing);
        }

        self.check_spacing(series, &mut report);
        self.check_ranges(series, &mut report);
        self.check_daily_temperatures(series, &mut report)?;
        self.check_temperature_jumps(series, &mut report);

        if report.is_clean() {
            debug!(table = %report.table, "Integrity check passed");
        } else {
            warn!(
                table = %report.table,
                gaps = report.gaps.len(),
                violations = report.violations.len(),
                incomplete = report.total_records - report.complete_records,
                "Integrity check found issues"
            );
        }

        Ok(report)
    }

    fn check_spacing(&self, series: &TimeSeries, report: &mut IntegrityReport) {
        let interval = series.cadence().interval();

        for window in series.observations().windows(2) {
            let step = window[1].timestamp - window[0].timestamp;
            if step > interval {
                report.gaps.push(Gap {
                    after: window[0].timestamp,
                    before: window[1].timestamp,
                    missing_intervals: step.num_seconds() / interval.num_seconds() - 1,
                });
            }
        }
    }

    fn check_ranges(&self, series: &TimeSeries, report: &mut IntegrityReport) {
        for (index, parameter) in series.parameters().iter().enumerate() {
            let Some((min, max)) = valid_range(parameter) else {
                continue;
            };

            for observation in series.observations() {
                if let Some(value) = observation.value(index) {
                    if !(min..=max).contains(&value) {
                        report.violations.push(Violation {
                            timestamp: observation.timestamp,
                            violation_type: ViolationType::OutOfRange,
                            details: format!(
                                "{} value {} is outside valid range [{}, {}]",
                                parameter, value, min, max
                            ),
                        });
                    }
                }
            }
        }
    }

    /// Daily min/mean/max ordering, when all three columns are present
    fn check_daily_temperatures(
        &self,
        series: &TimeSeries,
        report: &mut IntegrityReport,
    ) -> Result<()> {
        if !(series.has_parameter(DAILY_TEMPERATURE_MIN)
            && series.has_parameter(DAILY_TEMPERATURE_MAX))
        {
            return Ok(());
        }

        let min_index = series.column_index(DAILY_TEMPERATURE_MIN)?;
        let max_index = series.column_index(DAILY_TEMPERATURE_MAX)?;
        let mean_index = series.column_index(DAILY_TEMPERATURE_MEAN).ok();

        for observation in series.observations() {
            let (Some(min), Some(max)) = (observation.value(min_index), observation.value(max_index))
            else {
                continue;
            };

            if min > max {
                report.violations.push(Violation {
                    timestamp: observation.timestamp,
                    violation_type: ViolationType::MinGreaterThanMax,
                    details: format!("min temperature {} exceeds max {}", min, max),
                });
            } else if let Some(mean) = mean_index.and_then(|i| observation.value(i)) {
                if !(min..=max).contains(&mean) {
                    report.violations.push(Violation {
                        timestamp: observation.timestamp,
                        violation_type: ViolationType::MeanOutsideRange,
                        details: format!("mean temperature {} outside [{}, {}]", mean, min, max),
                    });
                }
            }
        }

        Ok(())
    }

    fn check_temperature_jumps(&self, series: &TimeSeries, report: &mut IntegrityReport) {
        let columns: Vec<(usize, &String)> = series
            .parameters()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.starts_with("temperature"))
            .collect();

        let observations: &[Observation] = series.observations();
        for window in observations.windows(2) {
            let (prev, curr) = (&window[0], &window[1]);

            for (index, parameter) in &columns {
                if let (Some(a), Some(b)) = (prev.value(*index), curr.value(*index)) {
                    let jump = (b - a).abs();
                    if jump > self.temperature_jump_threshold {
                        report.violations.push(Violation {
                            timestamp: curr.timestamp,
                            violation_type: ViolationType::SuspiciousJump,
                            details: format!(
                                "{} jumped {:.1}°C from {} to {}",
                                parameter, jump, prev.timestamp, curr.timestamp
                            ),
                        });
                    }
                }
            }
        }
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();
        let percent = |n: usize| {
            if report.total_records == 0 {
                0.0
            } else {
                100.0 * n as f64 / report.total_records as f64
            }
        };

        summary.push_str(&format!("=== Integrity Check Report: {} ===\n", report.table));
        summary.push_str(&format!("Total Records: {}\n", report.total_records));
        summary.push_str(&format!(
            "Complete Records: {} ({:.1}%)\n",
            report.complete_records,
            percent(report.complete_records)
        ));

        summary.push_str("\nMissing Values:\n");
        for (parameter, missing) in &report.missing_values {
            summary.push_str(&format!(
                "  {:<34} {} ({:.1}%)\n",
                parameter,
                missing,
                percent(*missing)
            ));
        }

        summary.push_str(&format!("\nGaps: {}\n", report.gaps.len()));
        for gap in report.gaps.iter().take(10) {
            summary.push_str(&format!(
                "  {} -> {} ({} missing)\n",
                gap.after, gap.before, gap.missing_intervals
            ));
        }

        summary.push_str(&format!("\nViolations: {}\n", report.violations.len()));
        if !report.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, violation) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {}: {}\n",
                    i + 1,
                    violation.timestamp,
                    violation.details
                ));
            }
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cadence;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn daily() -> TimeSeries {
        TimeSeries::builder(Cadence::Daily)
            .parameters(&[
                DAILY_TEMPERATURE_MAX,
                DAILY_TEMPERATURE_MIN,
                DAILY_TEMPERATURE_MEAN,
                "precipitation_sum_mm",
            ])
            .day(date(1), vec![Some(15.0), Some(5.0), Some(10.0), Some(0.0)])
            .day(date(2), vec![Some(14.0), Some(6.0), Some(20.0), None])
            .day(date(5), vec![Some(4.0), Some(8.0), Some(6.0), Some(-1.0)])
            .day(date(6), vec![Some(45.0), Some(25.0), Some(30.0), Some(2.0)])
            .build()
            .unwrap()
    }

    #[test]
    fn test_detects_gaps_and_missing_values() {
        let report = IntegrityChecker::new().check_integrity(&daily()).unwrap();

        assert_eq!(report.total_records, 4);
        assert_eq!(report.complete_records, 3);
        assert_eq!(report.missing_values["precipitation_sum_mm"], 1);
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].missing_intervals, 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_detects_violations() {
        let report = IntegrityChecker::new().check_integrity(&daily()).unwrap();
        let kinds: Vec<ViolationType> = report.violations.iter().map(|v| v.violation_type).collect();

        assert!(kinds.contains(&ViolationType::OutOfRange));
        assert!(kinds.contains(&ViolationType::MeanOutsideRange));
        assert!(kinds.contains(&ViolationType::MinGreaterThanMax));
        assert!(kinds.contains(&ViolationType::SuspiciousJump));

        let summary = IntegrityChecker::new().generate_summary(&report);
        assert!(summary.contains("=== Integrity Check Report: daily_data ==="));
        assert!(summary.contains("Gaps: 1"));
    }

    #[test]
    fn test_regular_series_is_clean() {
        let series = TimeSeries::builder(Cadence::Daily)
            .parameters(&["temperature_2m_mean_C"])
            .day(date(1), vec![Some(10.0)])
            .day(date(2), vec![Some(12.0)])
            .build()
            .unwrap();

        let report = IntegrityChecker::new().check_integrity(&series).unwrap();
        assert!(report.is_clean());
    }
}
