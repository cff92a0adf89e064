use crate::error::{AnalysisError, Result};
use crate::models::{AggregatedPeriod, AggregatedTable, Statistics, TimeSeries, Timeframe};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::debug;

/// Resamples a series into calendar buckets and rolls up every parameter.
///
/// Buckets run contiguously from the one holding the first observation to
/// the one holding the last. Buckets without observations are kept with NaN
/// statistics; callers decide whether to drop them.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    parameters: Option<Vec<String>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self { parameters: None }
    }

    /// Restrict the rollup to these parameters, in this order
    pub fn with_parameters(parameters: &[&str]) -> Self {
        Self {
            parameters: Some(parameters.iter().map(|p| p.to_string()).collect()),
        }
    }

    fn selected_columns(&self, series: &TimeSeries) -> Result<Vec<(String, usize)>> {
        match &self.parameters {
            Some(parameters) => parameters
                .iter()
                .map(|name| Ok((name.clone(), series.column_index(name)?)))
                .collect(),
            None => Ok(series
                .parameters()
                .iter()
                .cloned()
                .enumerate()
                .map(|(index, name)| (name, index))
                .collect()),
        }
    }

    /// Row range of every bucket, keyed by the bucket's last day
    pub fn bucket_ranges(
        &self,
        series: &TimeSeries,
        timeframe: Timeframe,
    ) -> Vec<(NaiveDate, Range<usize>)> {
        let Some((first, last)) = series.date_range() else {
            return Vec::new();
        };

        let observations = series.observations();
        let last_end = timeframe.period_end(last);
        let mut period_end = timeframe.period_end(first);
        let mut start = 0;
        let mut buckets = Vec::new();

        while period_end <= last_end {
            let stop = start + observations[start..].partition_point(|o| o.date() <= period_end);
            buckets.push((period_end, start..stop));
            start = stop;
            period_end = timeframe.next_period_end(period_end);
        }

        buckets
    }

    pub fn aggregate(&self, series: &TimeSeries, timeframe: Timeframe) -> Result<AggregatedTable> {
        let columns = self.selected_columns(series)?;
        let observations = series.observations();

        let periods: Vec<AggregatedPeriod> = self
            .bucket_ranges(series, timeframe)
            .into_iter()
            .map(|(period_end, range)| {
                let rows = &observations[range];
                if rows.is_empty() {
                    debug!(%period_end, %timeframe, "Empty bucket, statistics left as NaN");
                }

                let statistics = columns
                    .iter()
                    .map(|(_, index)| {
                        let values: Vec<f64> = rows.iter().filter_map(|o| o.value(*index)).collect();
                        Statistics::from_values(&values)
                    })
                    .collect();

                AggregatedPeriod {
                    period_end,
                    observation_count: rows.len(),
                    statistics,
                }
            })
            .collect();

        let table = AggregatedTable {
            cadence: series.cadence(),
            timeframe,
            parameters: columns.into_iter().map(|(name, _)| name).collect(),
            periods,
        };

        debug!(
            cadence = %table.cadence,
            %timeframe,
            buckets = table.len(),
            empty = table.empty_period_count(),
            "Aggregated series"
        );

        Ok(table)
    }

    /// Aggregate the series into every timeframe; timeframes run in parallel
    pub fn aggregate_all(&self, series: &TimeSeries) -> Result<BTreeMap<Timeframe, AggregatedTable>> {
        Timeframe::ALL
            .par_iter()
            .map(|timeframe| {
                self.aggregate(series, *timeframe)
                    .map(|table| (*timeframe, table))
            })
            .collect()
    }

    /// [`Aggregator::aggregate_all`] on a dedicated pool of `max_workers` threads
    pub fn aggregate_all_with_workers(
        &self,
        series: &TimeSeries,
        max_workers: usize,
    ) -> Result<BTreeMap<Timeframe, AggregatedTable>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .build()
            .map_err(|e| AnalysisError::Config(e.to_string()))?;

        pool.install(|| self.aggregate_all(series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cadence, Statistic};
    use chrono::{Duration, NaiveDateTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_series(start: NaiveDate, values: &[Option<f64>]) -> TimeSeries {
        let mut builder = TimeSeries::builder(Cadence::Daily).parameters(&["x"]);
        for (i, value) in values.iter().enumerate() {
            builder = builder.day(start + Duration::days(i as i64), vec![*value]);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_monthly_rollup() {
        // January 30-31 and February 1-2
        let series = daily_series(
            date(2024, 1, 30),
            &[Some(1.0), Some(3.0), Some(10.0), Some(20.0)],
        );

        let table = Aggregator::new().aggregate(&series, Timeframe::Month).unwrap();

        assert_eq!(table.len(), 2);
        let january = table.period(date(2024, 1, 31)).unwrap();
        assert_eq!(january.observation_count, 2);
        assert_eq!(january.statistics(0).mean, 2.0);
        assert_eq!(january.statistics(0).std, 2.0f64.sqrt());

        let february = table.period(date(2024, 2, 29)).unwrap();
        assert_eq!(february.statistics(0).min, 10.0);
        assert_eq!(february.statistics(0).max, 20.0);
    }

    #[test]
    fn test_gap_produces_empty_bucket() {
        let series = TimeSeries::builder(Cadence::Daily)
            .parameters(&["x"])
            .day(date(2024, 1, 15), vec![Some(1.0)])
            .day(date(2024, 3, 15), vec![Some(2.0)])
            .build()
            .unwrap();

        let table = Aggregator::new().aggregate(&series, Timeframe::Month).unwrap();

        assert_eq!(table.len(), 3);
        let february = &table.periods[1];
        assert_eq!(february.period_end, date(2024, 2, 29));
        assert!(february.is_empty());
        assert!(february.statistics(0).mean.is_nan());
        assert!(february.statistics(0).std.is_nan());

        assert_eq!(table.drop_empty().len(), 2);
    }

    #[test]
    fn test_single_observation_bucket_has_nan_std() {
        let series = daily_series(date(2024, 1, 1), &[Some(5.0)]);
        let table = Aggregator::new().aggregate(&series, Timeframe::Year).unwrap();

        assert_eq!(table.len(), 1);
        let stats = table.periods[0].statistics(0);
        assert_eq!(stats.mean, 5.0);
        assert!(stats.std.is_nan());
    }

    #[test]
    fn test_nulls_are_ignored_within_bucket() {
        let series = daily_series(date(2024, 1, 1), &[Some(2.0), None, Some(4.0)]);
        let table = Aggregator::new().aggregate(&series, Timeframe::Week).unwrap();

        let stats = table.periods[0].statistics(0);
        assert_eq!(table.periods[0].observation_count, 3);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 3.0);
    }

    #[test]
    fn test_hourly_sunday_belongs_to_its_week() {
        let sunday_evening =
            NaiveDateTime::parse_from_str("2024-01-07 23:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let monday_morning =
            NaiveDateTime::parse_from_str("2024-01-08 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();

        let series = TimeSeries::builder(Cadence::Hourly)
            .parameters(&["x"])
            .observation(sunday_evening, vec![Some(1.0)])
            .observation(monday_morning, vec![Some(2.0)])
            .build()
            .unwrap();

        let table = Aggregator::new().aggregate(&series, Timeframe::Week).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.periods[0].period_end, date(2024, 1, 7));
        assert_eq!(table.periods[0].statistics(0).mean, 1.0);
        assert_eq!(table.periods[1].period_end, date(2024, 1, 14));
    }

    #[test]
    fn test_selected_parameters() {
        let series = TimeSeries::builder(Cadence::Daily)
            .parameters(&["a", "b"])
            .day(date(2024, 1, 1), vec![Some(1.0), Some(100.0)])
            .build()
            .unwrap();

        let table = Aggregator::with_parameters(&["b"])
            .aggregate(&series, Timeframe::Month)
            .unwrap();
        assert_eq!(table.parameters, vec!["b".to_string()]);
        assert_eq!(
            table.column("b", Statistic::Max).unwrap(),
            vec![(date(2024, 1, 31), 100.0)]
        );

        let missing = Aggregator::with_parameters(&["c"]).aggregate(&series, Timeframe::Month);
        assert!(matches!(missing, Err(AnalysisError::MissingColumn { .. })));
    }

    #[test]
    fn test_aggregate_all_timeframes() {
        let values: Vec<Option<f64>> = (0..400).map(|i| Some(i as f64)).collect();
        let series = daily_series(date(2023, 1, 1), &values);

        let tables = Aggregator::new().aggregate_all_with_workers(&series, 2).unwrap();
        assert_eq!(tables.len(), 4);
        assert_eq!(tables[&Timeframe::Year].len(), 2);
        assert_eq!(tables[&Timeframe::Season].len(), 5);
        assert_eq!(tables[&Timeframe::Month].len(), 14);
    }

    #[test]
    fn test_empty_series_has_no_buckets() {
        let series = TimeSeries::builder(Cadence::Daily)
            .parameters(&["x"])
            .build()
            .unwrap();
        let table = Aggregator::new().aggregate(&series, Timeframe::Week).unwrap();
        assert!(table.is_empty());
    }
}
