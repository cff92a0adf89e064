use crate::analyzers::Aggregator;
use crate::error::{AnalysisError, Result};
use crate::models::{AggregatedPeriod, AggregatedTable, TimeSeries, Timeframe};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariabilityMode {
    Above,
    Below,
}

impl VariabilityMode {
    /// NaN never satisfies either comparison
    pub fn matches(&self, std: f64, threshold: f64) -> bool {
        match self {
            VariabilityMode::Above => std > threshold,
            VariabilityMode::Below => std < threshold,
        }
    }
}

impl fmt::Display for VariabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariabilityMode::Above => write!(f, "above"),
            VariabilityMode::Below => write!(f, "below"),
        }
    }
}

impl FromStr for VariabilityMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "above" => Ok(VariabilityMode::Above),
            "below" | "under" => Ok(VariabilityMode::Below),
            _ => Err(AnalysisError::InvalidVariabilityMode(s.to_string())),
        }
    }
}

/// Selects buckets by the standard deviation of one parameter
#[derive(Debug, Clone, Default)]
pub struct VariabilityFilter {
    aggregator: Aggregator,
}

impl VariabilityFilter {
    pub fn new() -> Self {
        Self {
            aggregator: Aggregator::new(),
        }
    }

    pub fn with_aggregator(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    pub fn filter(
        &self,
        aggregated: &AggregatedTable,
        parameter: &str,
        threshold: f64,
        mode: VariabilityMode,
    ) -> Result<Vec<AggregatedPeriod>> {
        let index = aggregated.parameter_index(parameter)?;

        let selected: Vec<AggregatedPeriod> = aggregated
            .periods
            .iter()
            .filter(|period| mode.matches(period.statistics(index).std, threshold))
            .cloned()
            .collect();

        debug!(
            parameter,
            threshold,
            %mode,
            selected = selected.len(),
            total = aggregated.len(),
            "Filtered variability"
        );

        Ok(selected)
    }

    /// Aggregate `series` into `timeframe`, then filter
    pub fn filter_series(
        &self,
        series: &TimeSeries,
        parameter: &str,
        timeframe: Timeframe,
        threshold: f64,
        mode: VariabilityMode,
    ) -> Result<Vec<AggregatedPeriod>> {
        let aggregated = self.aggregator.aggregate(series, timeframe)?;
        self.filter(&aggregated, parameter, threshold, mode)
    }
}
