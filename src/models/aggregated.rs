use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::error::{AnalysisError, Result};
use crate::models::{Cadence, Timeframe};
use crate::utils::stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Mean,
    Max,
    Min,
    Std,
}

impl Statistic {
    pub const ALL: [Statistic; 4] = [
        Statistic::Mean,
        Statistic::Max,
        Statistic::Min,
        Statistic::Std,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Max => "max",
            Statistic::Min => "min",
            Statistic::Std => "std",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rollup of one parameter over one bucket.
///
/// A bucket without values is all NaN. A single value has a NaN `std`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub count: usize,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub std: f64,
}

impl Statistics {
    pub fn empty() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            max: f64::NAN,
            min: f64::NAN,
            std: f64::NAN,
        }
    }

    /// NaN inputs count as missing
    pub fn from_values(values: &[f64]) -> Self {
        let values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if values.is_empty() {
            return Self::empty();
        }

        let min = stats::min(&values);
        let max = stats::max(&values);
        Self {
            count: values.len(),
            // rounding can push the mean of near-equal values past the extremes
            mean: stats::mean(&values).clamp(min, max),
            max,
            min,
            std: stats::sample_std(&values),
        }
    }

    pub fn get(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::Mean => self.mean,
            Statistic::Max => self.max,
            Statistic::Min => self.min,
            Statistic::Std => self.std,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// One resampled bucket; `statistics` line up with the table's parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPeriod {
    pub period_end: NaiveDate,
    pub observation_count: usize,
    pub statistics: Vec<Statistics>,
}

impl AggregatedPeriod {
    pub fn is_empty(&self) -> bool {
        self.observation_count == 0
    }

    pub fn statistics(&self, index: usize) -> Statistics {
        self.statistics
            .get(index)
            .copied()
            .unwrap_or_else(Statistics::empty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedTable {
    pub cadence: Cadence,
    pub timeframe: Timeframe,
    pub parameters: Vec<String>,
    pub periods: Vec<AggregatedPeriod>,
}

impl AggregatedTable {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn parameter_index(&self, name: &str) -> Result<usize> {
        self.parameters
            .iter()
            .position(|p| p == name)
            .ok_or_else(|| AnalysisError::MissingColumn {
                table: format!("{} {} aggregate", self.cadence, self.timeframe),
                column: name.to_string(),
            })
    }

    pub fn period(&self, period_end: NaiveDate) -> Option<&AggregatedPeriod> {
        self.periods
            .binary_search_by_key(&period_end, |p| p.period_end)
            .ok()
            .map(|i| &self.periods[i])
    }

    /// One statistic of one parameter across every bucket
    pub fn column(&self, parameter: &str, statistic: Statistic) -> Result<Vec<(NaiveDate, f64)>> {
        let index = self.parameter_index(parameter)?;
        Ok(self
            .periods
            .iter()
            .map(|p| (p.period_end, p.statistics(index).get(statistic)))
            .collect())
    }

    pub fn empty_period_count(&self) -> usize {
        self.periods.iter().filter(|p| p.is_empty()).count()
    }

    /// Copy of the table without buckets that had no observations
    pub fn drop_empty(&self) -> AggregatedTable {
        AggregatedTable {
            cadence: self.cadence,
            timeframe: self.timeframe,
            parameters: self.parameters.clone(),
            periods: self
                .periods
                .iter()
                .filter(|p| !p.is_empty())
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_from_values() {
        let stats = Statistics::from_values(&[1.0, 2.0, 3.0]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.std, 1.0);
    }

    #[test]
    fn test_single_value_has_nan_std() {
        let stats = Statistics::from_values(&[4.2]);
        assert_eq!(stats.mean, 4.2);
        assert!(stats.std.is_nan());
    }

    #[test]
    fn test_mean_stays_within_extremes() {
        let stats = Statistics::from_values(&[0.1, 0.1, 0.1]);
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
    }

    #[test]
    fn test_empty_statistics() {
        let stats = Statistics::from_values(&[]);
        assert!(stats.is_empty());
        for statistic in Statistic::ALL {
            assert!(stats.get(statistic).is_nan());
        }
    }
}
