use crate::analyzers::{Aggregator, VariabilityFilter, VariabilityMode};
use crate::error::Result;
use crate::models::{AggregatedPeriod, AggregatedTable, Cadence, Statistics, TimeSeries, Timeframe};
use crate::readers::SqliteReader;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

/// Per-parameter overview of one loaded table
#[derive(Debug)]
pub struct SeriesSummary {
    pub table: String,
    pub total_records: usize,
    pub complete_records: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub parameters: Vec<ParameterSummary>,
}

#[derive(Debug)]
pub struct ParameterSummary {
    pub name: String,
    pub missing: usize,
    pub statistics: Statistics,
}

/// One analysis session over immutable hourly and daily snapshots
pub struct WeatherAnalyzer {
    hourly: TimeSeries,
    daily: TimeSeries,
    aggregator: Aggregator,
}

impl WeatherAnalyzer {
    pub fn new(hourly: TimeSeries, daily: TimeSeries) -> Self {
        Self {
            hourly,
            daily,
            aggregator: Aggregator::new(),
        }
    }

    /// Load both tables; a missing table or column ends the session before it starts
    pub fn from_store(reader: &SqliteReader) -> Result<Self> {
        let hourly = reader.read_hourly()?;
        let daily = reader.read_daily()?;

        info!(
            hourly = hourly.len(),
            daily = daily.len(),
            "Analysis session ready"
        );

        Ok(Self::new(hourly, daily))
    }

    pub fn hourly(&self) -> &TimeSeries {
        &self.hourly
    }

    pub fn daily(&self) -> &TimeSeries {
        &self.daily
    }

    pub fn series(&self, cadence: Cadence) -> &TimeSeries {
        match cadence {
            Cadence::Hourly => &self.hourly,
            Cadence::Daily => &self.daily,
        }
    }

    pub fn aggregate(&self, cadence: Cadence, timeframe: Timeframe) -> Result<AggregatedTable> {
        self.aggregator.aggregate(self.series(cadence), timeframe)
    }

    pub fn aggregate_hourly(&self, timeframe: Timeframe) -> Result<AggregatedTable> {
        self.aggregate(Cadence::Hourly, timeframe)
    }

    pub fn aggregate_daily(&self, timeframe: Timeframe) -> Result<AggregatedTable> {
        self.aggregate(Cadence::Daily, timeframe)
    }

    /// Every timeframe of one cadence, on `max_workers` threads when given
    pub fn aggregate_all(
        &self,
        cadence: Cadence,
        max_workers: Option<usize>,
    ) -> Result<BTreeMap<Timeframe, AggregatedTable>> {
        let series = self.series(cadence);
        match max_workers {
            Some(workers) => self.aggregator.aggregate_all_with_workers(series, workers),
            None => self.aggregator.aggregate_all(series),
        }
    }

    pub fn filter_variability(
        &self,
        cadence: Cadence,
        parameter: &str,
        timeframe: Timeframe,
        threshold: f64,
        mode: VariabilityMode,
    ) -> Result<Vec<AggregatedPeriod>> {
        VariabilityFilter::with_aggregator(self.aggregator.clone()).filter_series(
            self.series(cadence),
            parameter,
            timeframe,
            threshold,
            mode,
        )
    }

    pub fn summarize(&self, cadence: Cadence) -> SeriesSummary {
        SeriesSummary::from_series(self.series(cadence))
    }
}

impl SeriesSummary {
    pub fn from_series(series: &TimeSeries) -> Self {
        let parameters = series
            .parameters()
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let values: Vec<f64> = series
                    .observations()
                    .iter()
                    .filter_map(|o| o.value(index))
                    .collect();
                ParameterSummary {
                    name: name.clone(),
                    missing: series.len() - values.len(),
                    statistics: Statistics::from_values(&values),
                }
            })
            .collect();

        Self {
            table: series.table_name().to_string(),
            total_records: series.len(),
            complete_records: series.len() - series.incomplete_count(),
            date_range: series.date_range(),
            parameters,
        }
    }

    pub fn summary(&self) -> String {
        let range = match self.date_range {
            Some((first, last)) => format!(
                "{} to {} ({} days)",
                first,
                last,
                last.signed_duration_since(first).num_days() + 1
            ),
            None => "No observations".to_string(),
        };

        let complete_pct = if self.total_records == 0 {
            0.0
        } else {
            100.0 * self.complete_records as f64 / self.total_records as f64
        };

        format!(
            "Table: {}\n\
            Date Range: {}\n\
            Records: {} total, {:.1}% complete",
            self.table, range, self.total_records, complete_pct
        )
    }

    pub fn detailed_summary(&self) -> String {
        let mut summary = self.summary();
        summary.push_str("\n\nParameters (count / missing / mean / min / max / std):\n");

        for parameter in &self.parameters {
            let stats = &parameter.statistics;
            if stats.is_empty() {
                summary.push_str(&format!(
                    "- {}: No valid measurements ({} missing)\n",
                    parameter.name, parameter.missing
                ));
            } else {
                summary.push_str(&format!(
                    "- {}: {} / {} / {:.2} / {:.2} / {:.2} / {:.2}\n",
                    parameter.name,
                    stats.count,
                    parameter.missing,
                    stats.mean,
                    stats.min,
                    stats.max,
                    stats.std
                ));
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::{DAILY_TEMPERATURE_MAX, HOURLY_TEMPERATURE};
    use chrono::{Duration, NaiveDateTime};

    fn session() -> WeatherAnalyzer {
        let start = NaiveDateTime::parse_from_str("2024-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let mut hourly = TimeSeries::builder(Cadence::Hourly).parameters(&[HOURLY_TEMPERATURE]);
        for hour in 0..72 {
            let value = if hour % 24 == 5 { None } else { Some((hour % 24) as f64) };
            hourly = hourly.observation(start + Duration::hours(hour), vec![value]);
        }

        let day = start.date();
        let daily = TimeSeries::builder(Cadence::Daily)
            .parameters(&[DAILY_TEMPERATURE_MAX])
            .day(day, vec![Some(23.0)])
            .day(day + Duration::days(1), vec![Some(23.0)])
            .day(day + Duration::days(40), vec![Some(10.0)])
            .build()
            .unwrap();

        WeatherAnalyzer::new(hourly.build().unwrap(), daily)
    }

    #[test]
    fn test_aggregate_by_cadence() {
        let analyzer = session();

        let weekly = analyzer.aggregate_hourly(Timeframe::Week).unwrap();
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly.periods[0].observation_count, 72);
        assert_eq!(weekly.periods[0].statistics(0).count, 69);

        let monthly = analyzer.aggregate_daily(Timeframe::Month).unwrap();
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly.periods[0].statistics(0).std, 0.0);
    }

    #[test]
    fn test_aggregate_all_and_variability() {
        let analyzer = session();

        let all = analyzer.aggregate_all(Cadence::Daily, Some(2)).unwrap();
        assert_eq!(all.len(), Timeframe::ALL.len());

        // January's two equal values have zero spread, February's single value has NaN
        let steady = analyzer
            .filter_variability(
                Cadence::Daily,
                DAILY_TEMPERATURE_MAX,
                Timeframe::Month,
                0.5,
                VariabilityMode::Below,
            )
            .unwrap();
        assert_eq!(steady.len(), 1);
        assert_eq!(steady[0].period_end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn test_summarize() {
        let analyzer = session();
        let summary = analyzer.summarize(Cadence::Hourly);

        assert_eq!(summary.total_records, 72);
        assert_eq!(summary.complete_records, 69);
        assert_eq!(summary.parameters[0].missing, 3);
        assert!(summary.summary().contains("hourly_data"));
        assert!(summary.detailed_summary().contains(HOURLY_TEMPERATURE));
    }
}
