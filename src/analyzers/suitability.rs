use crate::config::ScoringConfig;
use crate::error::{AnalysisError, Result};
use crate::models::{ScoreRecord, ScoreTable, TimeSeries};
use crate::utils::constants::{DAILY_PRECIPITATION_SUM, DAILY_TEMPERATURE_MEAN, DAILY_WIND_SPEED_MAX};
use crate::utils::progress::ProgressReporter;
use tracing::{debug, info, warn};

/// Scores a day's weather for outdoor events on a 0-100 scale.
///
/// Three sub-scores in [0, 1] are weighted and summed:
///
/// - temperature: 1 inside the ideal range, otherwise falling off linearly with
///   the distance from the lower ideal bound, scaled by the range width;
/// - precipitation: 1 at or below the ideal amount, else 0;
/// - wind speed: falling off linearly with the distance from the ideal speed,
///   reaching 0 one ideal-speed away.
#[derive(Debug, Clone, Default)]
pub struct SuitabilityScorer {
    config: ScoringConfig,
}

impl SuitabilityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn temperature_score(&self, temperature: f64) -> f64 {
        let ScoringConfig {
            ideal_temp_min,
            ideal_temp_max,
            ..
        } = self.config;

        if (ideal_temp_min..=ideal_temp_max).contains(&temperature) {
            1.0
        } else {
            let width = ideal_temp_max - ideal_temp_min;
            (1.0 - (temperature - ideal_temp_min).abs() / width).clamp(0.0, 1.0)
        }
    }

    fn precipitation_score(&self, precipitation: f64) -> f64 {
        if precipitation <= self.config.ideal_precipitation {
            1.0
        } else {
            0.0
        }
    }

    fn wind_speed_score(&self, wind_speed: f64) -> f64 {
        let ideal = self.config.ideal_wind_speed;
        (1.0 - (wind_speed - ideal).abs() / ideal).clamp(0.0, 1.0)
    }

    /// Composite score; non-finite inputs produce a non-finite result
    pub fn score(&self, temperature: f64, precipitation: f64, wind_speed: f64) -> f64 {
        100.0
            * (self.config.temperature_weight * self.temperature_score(temperature)
                + self.config.precipitation_weight * self.precipitation_score(precipitation)
                + self.config.wind_speed_weight * self.wind_speed_score(wind_speed))
    }

    /// [`SuitabilityScorer::score`] that rejects non-finite inputs, naming the row by `key`
    pub fn try_score(
        &self,
        key: &str,
        temperature: f64,
        precipitation: f64,
        wind_speed: f64,
    ) -> Result<f64> {
        for (name, value) in [
            ("temperature", temperature),
            ("precipitation", precipitation),
            ("wind speed", wind_speed),
        ] {
            if !value.is_finite() {
                return Err(AnalysisError::Computation {
                    key: key.to_string(),
                    message: format!("{} is not a finite number ({})", name, value),
                });
            }
        }

        Ok(self.score(temperature, precipitation, wind_speed))
    }

    pub fn score_series(&self, daily: &TimeSeries) -> Result<ScoreTable> {
        self.score_series_with_progress(daily, &ProgressReporter::silent())
    }

    /// Score every daily row; rows with a null input are skipped, rows that fail are logged and skipped
    pub fn score_series_with_progress(
        &self,
        daily: &TimeSeries,
        progress: &ProgressReporter,
    ) -> Result<ScoreTable> {
        let temperature = daily.column_index(DAILY_TEMPERATURE_MEAN)?;
        let precipitation = daily.column_index(DAILY_PRECIPITATION_SUM)?;
        let wind_speed = daily.column_index(DAILY_WIND_SPEED_MAX)?;

        let mut table = ScoreTable::default();

        for observation in daily.observations() {
            progress.increment(1);

            let inputs = (
                observation.value(temperature),
                observation.value(precipitation),
                observation.value(wind_speed),
            );
            let (Some(t), Some(p), Some(w)) = inputs else {
                debug!(date = %observation.date(), "Skipping row with missing score input");
                table.skipped_rows += 1;
                continue;
            };

            let date = observation.date();
            match self.try_score(&date.to_string(), t, p, w) {
                Ok(score) => table.records.push(ScoreRecord::new(date, score)),
                Err(e) => {
                    warn!("Error processing row {}: {}", date, e);
                    table.failed_rows += 1;
                }
            }
        }

        progress.finish_with_message(&format!("Scored {} days", table.len()));
        info!(
            scored = table.len(),
            skipped = table.skipped_rows,
            failed = table.failed_rows,
            "Suitability scoring complete"
        );

        Ok(table)
    }
}
