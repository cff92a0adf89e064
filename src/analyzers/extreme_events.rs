use crate::analyzers::Aggregator;
use crate::error::{AnalysisError, Result};
use crate::models::{
    Bounds, EventCounts, EventFlags, ExtremeAverages, ExtremeEvent, ExtremeReport,
    ExtremeThresholds, FlaggedSeries, PeriodFrequency, TimeSeries, Timeframe, YearlyFrequency,
};
use crate::utils::constants::{
    DAILY_PRECIPITATION_SUM, DAILY_TEMPERATURE_MAX, DAILY_TEMPERATURE_MIN, DAILY_WIND_SPEED_MAX,
    DEFAULT_HIGH_PERCENTILE, DEFAULT_LOW_PERCENTILE,
};
use crate::utils::stats;
use chrono::Datelike;
use tracing::{debug, info};

/// Percentile-based extreme event detection over a daily series.
///
/// Bucketing for the frequency tables is delegated to the composed
/// [`Aggregator`], so yearly and sub-yearly counts share its calendar rules.
#[derive(Debug, Clone)]
pub struct ExtremeEventDetector {
    aggregator: Aggregator,
    low_percentile: f64,
    high_percentile: f64,
}

impl ExtremeEventDetector {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator,
            low_percentile: DEFAULT_LOW_PERCENTILE,
            high_percentile: DEFAULT_HIGH_PERCENTILE,
        }
    }

    pub fn with_percentiles(mut self, low: f64, high: f64) -> Self {
        self.low_percentile = low;
        self.high_percentile = high;
        self
    }

    fn percentile(&self, daily: &TimeSeries, column: &str, q: f64) -> Result<f64> {
        let values: Vec<f64> = daily
            .present_values(column)?
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect();

        if values.is_empty() {
            return Err(AnalysisError::MissingData(format!(
                "no values in column '{}' of '{}'",
                column,
                daily.table_name()
            )));
        }

        Ok(stats::quantile(&values, q))
    }

    /// Compute the low/high bounds over the whole daily history
    pub fn define_thresholds(&self, daily: &TimeSeries) -> Result<ExtremeThresholds> {
        daily.require_columns(&[
            DAILY_TEMPERATURE_MAX,
            DAILY_TEMPERATURE_MIN,
            DAILY_PRECIPITATION_SUM,
            DAILY_WIND_SPEED_MAX,
        ])?;

        let thresholds = ExtremeThresholds {
            temperature: Bounds {
                low: self.percentile(daily, DAILY_TEMPERATURE_MIN, self.low_percentile)?,
                high: self.percentile(daily, DAILY_TEMPERATURE_MAX, self.high_percentile)?,
            },
            precipitation: Bounds {
                low: self.percentile(daily, DAILY_PRECIPITATION_SUM, self.low_percentile)?,
                high: self.percentile(daily, DAILY_PRECIPITATION_SUM, self.high_percentile)?,
            },
            wind_speed: Bounds {
                low: self.percentile(daily, DAILY_WIND_SPEED_MAX, self.low_percentile)?,
                high: self.percentile(daily, DAILY_WIND_SPEED_MAX, self.high_percentile)?,
            },
        };

        debug!(?thresholds, "Defined extreme thresholds");
        Ok(thresholds)
    }

    /// Attach the six extreme flags to every row of `daily`
    pub fn flag_events(
        &self,
        daily: &TimeSeries,
        thresholds: &ExtremeThresholds,
    ) -> Result<FlaggedSeries> {
        let mut source_columns = [0usize; 6];
        for event in ExtremeEvent::ALL {
            source_columns[event.index()] = daily.column_index(event.source_parameter())?;
        }

        let flags: Vec<EventFlags> = daily
            .observations()
            .iter()
            .map(|observation| {
                let mut flags = EventFlags::default();
                for event in ExtremeEvent::ALL {
                    let flagged = observation
                        .value(source_columns[event.index()])
                        .is_some_and(|value| thresholds.is_extreme(event, value));
                    flags.set(event, flagged);
                }
                flags
            })
            .collect();

        Ok(FlaggedSeries::new(
            daily.clone(),
            *thresholds,
            source_columns,
            flags,
        ))
    }

    /// Flag counts per calendar year present in the data
    pub fn calculate_frequency(&self, flagged: &FlaggedSeries) -> Vec<YearlyFrequency> {
        self.calculate_frequency_for(flagged, Timeframe::Year)
            .into_iter()
            .map(|row| YearlyFrequency {
                year: row.period_end.year(),
                counts: row.counts,
            })
            .collect()
    }

    /// Flag counts per bucket of `timeframe`; buckets without rows are left out
    pub fn calculate_frequency_for(
        &self,
        flagged: &FlaggedSeries,
        timeframe: Timeframe,
    ) -> Vec<PeriodFrequency> {
        let flags = flagged.flags();

        self.aggregator
            .bucket_ranges(flagged.series(), timeframe)
            .into_iter()
            .filter(|(_, range)| !range.is_empty())
            .map(|(period_end, range)| {
                let mut counts = EventCounts::default();
                for row_flags in &flags[range] {
                    counts.add(row_flags);
                }
                PeriodFrequency { period_end, counts }
            })
            .collect()
    }

    /// Mean raw value over the flagged rows of each event; 0 when nothing is flagged
    pub fn calculate_average_values(&self, flagged: &FlaggedSeries) -> ExtremeAverages {
        let averages = ExtremeAverages::from_fn(|event| {
            let values = flagged.flagged_values(event);
            if values.is_empty() {
                0.0
            } else {
                stats::mean(&values)
            }
        });

        for event in ExtremeEvent::ALL {
            info!(
                "Average {} (Extreme Events): {:.2} {}",
                event.label(),
                averages.get(event),
                event.unit()
            );
        }

        averages
    }

    /// Thresholds, flags, yearly frequencies and averages in one pass
    pub fn detect(&self, daily: &TimeSeries) -> Result<ExtremeReport> {
        let thresholds = self.define_thresholds(daily)?;
        let flagged = self.flag_events(daily, &thresholds)?;
        let yearly = self.calculate_frequency(&flagged);
        let averages = self.calculate_average_values(&flagged);
        let flagged_days = flagged.flags().iter().filter(|f| f.any()).count();

        info!(
            days = flagged.len(),
            flagged_days,
            years = yearly.len(),
            "Extreme event detection complete"
        );

        Ok(ExtremeReport {
            thresholds,
            total_days: flagged.len(),
            flagged_days,
            yearly,
            averages,
        })
    }
}

impl Default for ExtremeEventDetector {
    fn default() -> Self {
        Self::new(Aggregator::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cadence;
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;

    const COLUMNS: [&str; 4] = [
        DAILY_TEMPERATURE_MAX,
        DAILY_TEMPERATURE_MIN,
        DAILY_PRECIPITATION_SUM,
        DAILY_WIND_SPEED_MAX,
    ];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 40 days spanning two years, values rising with the day index
    fn daily() -> TimeSeries {
        let start = date(2023, 12, 12);
        let mut builder = TimeSeries::builder(Cadence::Daily).parameters(&COLUMNS);
        for i in 0..40 {
            let x = i as f64;
            let precipitation = if i % 2 == 0 { 0.0 } else { x };
            builder = builder.day(
                start + Duration::days(i),
                vec![Some(10.0 + x), Some(x - 5.0), Some(precipitation), Some(x)],
            );
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_thresholds_are_ordered() {
        let detector = ExtremeEventDetector::default();
        let thresholds = detector.define_thresholds(&daily()).unwrap();

        assert!(thresholds.temperature.low <= thresholds.temperature.high);
        assert!(thresholds.precipitation.low <= thresholds.precipitation.high);
        assert!(thresholds.wind_speed.low <= thresholds.wind_speed.high);

        // wind 0..=39: 5th percentile at position 1.95, 95th at 37.05
        assert!((thresholds.wind_speed.low - 1.95).abs() < 1e-9);
        assert!((thresholds.wind_speed.high - 37.05).abs() < 1e-9);
        assert_eq!(thresholds.precipitation.low, 0.0);
    }

    #[test]
    fn test_flags_and_frequency() {
        let detector = ExtremeEventDetector::default();
        let series = daily();
        let thresholds = detector.define_thresholds(&series).unwrap();
        let flagged = detector.flag_events(&series, &thresholds).unwrap();

        assert_eq!(flagged.len(), 40);
        // top two wind values (38, 39) exceed 37.05, bottom two (0, 1) are under 1.95
        assert_eq!(flagged.count(ExtremeEvent::HighWindSpeed), 2);
        assert_eq!(flagged.count(ExtremeEvent::LowWindSpeed), 2);
        // the low precipitation bound is 0, nothing is strictly below it
        assert_eq!(flagged.count(ExtremeEvent::LowPrecipitation), 0);

        let yearly = detector.calculate_frequency(&flagged);
        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly[0].year, 2023);
        assert_eq!(yearly[1].year, 2024);
        assert_eq!(yearly[0].counts.extreme_low_wind_speed, 2);
        assert_eq!(yearly[1].counts.extreme_high_wind_speed, 2);

        let total: u32 = yearly.iter().map(|y| y.counts.total()).sum();
        let expected: usize = ExtremeEvent::ALL.iter().map(|e| flagged.count(*e)).sum();
        assert_eq!(total as usize, expected);
    }

    #[test]
    fn test_one_day_can_set_several_flags() {
        let detector = ExtremeEventDetector::default();
        let series = daily();
        let thresholds = detector.define_thresholds(&series).unwrap();
        let flagged = detector.flag_events(&series, &thresholds).unwrap();

        // the last day is the hottest and windiest
        let last = flagged.flags().last().unwrap();
        assert!(last.get(ExtremeEvent::HighTemp));
        assert!(last.get(ExtremeEvent::HighWindSpeed));
        assert!(last.count() >= 2);
    }

    #[test]
    fn test_raising_high_threshold_never_adds_flags() {
        let detector = ExtremeEventDetector::default();
        let series = daily();
        let base = detector.define_thresholds(&series).unwrap();

        for event in [
            ExtremeEvent::HighTemp,
            ExtremeEvent::HighPrecipitation,
            ExtremeEvent::HighWindSpeed,
        ] {
            let mut previous = usize::MAX;
            for step in 0..10 {
                let raised = base.with_bound(event, base.bound(event) + step as f64 * 2.0);
                let count = detector.flag_events(&series, &raised).unwrap().count(event);
                assert!(count <= previous);
                previous = count;
            }
        }
    }

    #[test]
    fn test_average_defaults_to_zero() {
        let detector = ExtremeEventDetector::default();
        let series = daily();
        let thresholds = detector.define_thresholds(&series).unwrap();
        let flagged = detector.flag_events(&series, &thresholds).unwrap();

        let averages = detector.calculate_average_values(&flagged);
        assert_eq!(averages.avg_low_precip, 0.0);
        assert_eq!(averages.avg_high_wind, 38.5);
        assert_eq!(averages.avg_low_wind, 0.5);
    }

    #[test]
    fn test_nulls_never_flag() {
        let series = TimeSeries::builder(Cadence::Daily)
            .parameters(&COLUMNS)
            .day(date(2024, 1, 1), vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0)])
            .day(date(2024, 1, 2), vec![None, None, None, None])
            .day(date(2024, 1, 3), vec![Some(3.0), Some(3.0), Some(3.0), Some(3.0)])
            .build()
            .unwrap();

        let detector = ExtremeEventDetector::default();
        let thresholds = detector.define_thresholds(&series).unwrap();
        let flagged = detector.flag_events(&series, &thresholds).unwrap();
        assert!(!flagged.flags()[1].any());
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let series = TimeSeries::builder(Cadence::Daily)
            .parameters(&[DAILY_TEMPERATURE_MAX])
            .day(date(2024, 1, 1), vec![Some(1.0)])
            .build()
            .unwrap();

        let err = ExtremeEventDetector::default()
            .define_thresholds(&series)
            .unwrap_err();
        assert!(err.to_string().contains(DAILY_TEMPERATURE_MIN));
    }

    #[test]
    fn test_monthly_frequency_uses_aggregator_buckets() {
        let detector = ExtremeEventDetector::default();
        let series = daily();
        let thresholds = detector.define_thresholds(&series).unwrap();
        let flagged = detector.flag_events(&series, &thresholds).unwrap();

        let monthly = detector.calculate_frequency_for(&flagged, Timeframe::Month);
        let ends: Vec<NaiveDate> = monthly.iter().map(|m| m.period_end).collect();
        assert_eq!(ends, vec![date(2023, 12, 31), date(2024, 1, 31)]);
    }

    #[test]
    fn test_detect_report() {
        let report = ExtremeEventDetector::default().detect(&daily()).unwrap();
        assert_eq!(report.total_days, 40);
        assert!(report.flagged_days > 0);
        assert!(report.summary().contains("=== Extreme Weather Report ==="));
    }
}
