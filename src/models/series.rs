use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalysisError, Result};
use crate::utils::constants::{DAILY_PARAMETERS, DAILY_TABLE, HOURLY_PARAMETERS, HOURLY_TABLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Hourly,
    Daily,
}

impl Cadence {
    pub fn table_name(&self) -> &'static str {
        match self {
            Cadence::Hourly => HOURLY_TABLE,
            Cadence::Daily => DAILY_TABLE,
        }
    }

    /// Parameter columns every table of this cadence carries
    pub fn parameters(&self) -> &'static [&'static str] {
        match self {
            Cadence::Hourly => &HOURLY_PARAMETERS,
            Cadence::Daily => &DAILY_PARAMETERS,
        }
    }

    pub fn interval(&self) -> Duration {
        match self {
            Cadence::Hourly => Duration::hours(1),
            Cadence::Daily => Duration::days(1),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Hourly => write!(f, "hourly"),
            Cadence::Daily => write!(f, "daily"),
        }
    }
}

impl FromStr for Cadence {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Ok(Cadence::Hourly),
            "daily" => Ok(Cadence::Daily),
            _ => Err(AnalysisError::InvalidCadence(s.to_string())),
        }
    }
}

/// One timestamped row; `values` line up with the owning series' parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub values: Vec<Option<f64>>,
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, values: Vec<Option<f64>>) -> Self {
        Self { timestamp, values }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }
}

/// Ordered, timestamp-indexed table of observations for one cadence.
///
/// Timestamps are strictly increasing. The series is immutable once built;
/// derived views such as [`TimeSeries::drop_incomplete`] return new series.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    cadence: Cadence,
    parameters: Vec<String>,
    observations: Vec<Observation>,
}

impl TimeSeries {
    pub fn new(
        cadence: Cadence,
        parameters: Vec<String>,
        observations: Vec<Observation>,
    ) -> Result<Self> {
        for observation in &observations {
            if observation.values.len() != parameters.len() {
                return Err(AnalysisError::InvalidFormat(format!(
                    "Observation at {} has {} values, expected {}",
                    observation.timestamp,
                    observation.values.len(),
                    parameters.len()
                )));
            }
        }

        for window in observations.windows(2) {
            if window[1].timestamp <= window[0].timestamp {
                return Err(AnalysisError::UnorderedTimestamp {
                    timestamp: window[1].timestamp.to_string(),
                });
            }
        }

        Ok(Self {
            cadence,
            parameters,
            observations,
        })
    }

    pub fn builder(cadence: Cadence) -> TimeSeriesBuilder {
        TimeSeriesBuilder::new(cadence)
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn table_name(&self) -> &'static str {
        self.cadence.table_name()
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }

    /// Position of a parameter column, failing with the table and column name
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.parameters
            .iter()
            .position(|p| p == name)
            .ok_or_else(|| AnalysisError::MissingColumn {
                table: self.table_name().to_string(),
                column: name.to_string(),
            })
    }

    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        for name in names {
            self.column_index(name)?;
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let index = self.column_index(name)?;
        Ok(self.observations.iter().map(|o| o.value(index)).collect())
    }

    /// Non-null values of a column, in timestamp order
    pub fn present_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.column(name)?.into_iter().flatten().collect())
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.observations.first(), self.observations.last()) {
            (Some(first), Some(last)) => Some((first.date(), last.date())),
            _ => None,
        }
    }

    /// Copy of the series without rows that have any missing value
    pub fn drop_incomplete(&self) -> TimeSeries {
        Self {
            cadence: self.cadence,
            parameters: self.parameters.clone(),
            observations: self
                .observations
                .iter()
                .filter(|o| o.is_complete())
                .cloned()
                .collect(),
        }
    }

    pub fn incomplete_count(&self) -> usize {
        self.observations.iter().filter(|o| !o.is_complete()).count()
    }
}

pub struct TimeSeriesBuilder {
    cadence: Cadence,
    parameters: Option<Vec<String>>,
    observations: Vec<Observation>,
}

impl TimeSeriesBuilder {
    pub fn new(cadence: Cadence) -> Self {
        Self {
            cadence,
            parameters: None,
            observations: Vec::new(),
        }
    }

    /// Override the cadence's default parameter schema
    pub fn parameters(mut self, parameters: &[&str]) -> Self {
        self.parameters = Some(parameters.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn observation(mut self, timestamp: NaiveDateTime, values: Vec<Option<f64>>) -> Self {
        self.observations.push(Observation::new(timestamp, values));
        self
    }

    /// Observation stamped at midnight of `date`
    pub fn day(self, date: NaiveDate, values: Vec<Option<f64>>) -> Self {
        self.observation(date.and_time(NaiveTime::MIN), values)
    }

    pub fn build(self) -> Result<TimeSeries> {
        let parameters = self.parameters.unwrap_or_else(|| {
            self.cadence
                .parameters()
                .iter()
                .map(|p| p.to_string())
                .collect()
        });
        TimeSeries::new(self.cadence, parameters, self.observations)
    }
}
