use crate::error::Result;
use crate::utils::constants::{
    CONFIG_ENV_PREFIX, DEFAULT_HIGH_PERCENTILE, DEFAULT_LOW_PERCENTILE, DEFAULT_OUTPUT_DIR,
    GOOD_EVENT_THRESHOLD, IDEAL_PRECIPITATION, IDEAL_TEMP_MAX, IDEAL_TEMP_MIN, IDEAL_WIND_SPEED,
    PRECIPITATION_WEIGHT, TEMPERATURE_WEIGHT, WIND_SPEED_WEIGHT,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::{Validate, ValidationError};

/// Weights and ideal conditions for the event suitability score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_scoring"))]
#[serde(default)]
pub struct ScoringConfig {
    #[validate(range(min = 0.0, max = 1.0))]
    pub temperature_weight: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub precipitation_weight: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub wind_speed_weight: f64,
    pub ideal_temp_min: f64,
    pub ideal_temp_max: f64,
    #[validate(range(min = 0.0))]
    pub ideal_precipitation: f64,
    #[validate(range(min = 0.0))]
    pub ideal_wind_speed: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub good_event_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            temperature_weight: TEMPERATURE_WEIGHT,
            precipitation_weight: PRECIPITATION_WEIGHT,
            wind_speed_weight: WIND_SPEED_WEIGHT,
            ideal_temp_min: IDEAL_TEMP_MIN,
            ideal_temp_max: IDEAL_TEMP_MAX,
            ideal_precipitation: IDEAL_PRECIPITATION,
            ideal_wind_speed: IDEAL_WIND_SPEED,
            good_event_threshold: GOOD_EVENT_THRESHOLD,
        }
    }
}

fn validate_scoring(scoring: &ScoringConfig) -> std::result::Result<(), ValidationError> {
    let weight_sum =
        scoring.temperature_weight + scoring.precipitation_weight + scoring.wind_speed_weight;
    if (weight_sum - 1.0).abs() > 1e-6 {
        return Err(ValidationError::new("weights_must_sum_to_one"));
    }
    if scoring.ideal_temp_min >= scoring.ideal_temp_max {
        return Err(ValidationError::new("ideal_temp_min_must_be_below_max"));
    }
    if scoring.ideal_wind_speed <= 0.0 {
        return Err(ValidationError::new("ideal_wind_speed_must_be_positive"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_extremes"))]
#[serde(default)]
pub struct ExtremesConfig {
    #[validate(range(min = 0.0, max = 1.0))]
    pub low_percentile: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub high_percentile: f64,
}

impl Default for ExtremesConfig {
    fn default() -> Self {
        Self {
            low_percentile: DEFAULT_LOW_PERCENTILE,
            high_percentile: DEFAULT_HIGH_PERCENTILE,
        }
    }
}

fn validate_extremes(extremes: &ExtremesConfig) -> std::result::Result<(), ValidationError> {
    if extremes.low_percentile >= extremes.high_percentile {
        return Err(ValidationError::new("low_percentile_must_be_below_high"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    #[validate(length(min = 1))]
    pub compression: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            compression: "snappy".to_string(),
        }
    }
}

/// Tunable settings, layered from defaults, an optional TOML file and
/// `WEATHER_ANALYZER__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnalysisConfig {
    #[validate(nested)]
    pub scoring: ScoringConfig,
    #[validate(nested)]
    pub extremes: ExtremesConfig,
    #[validate(nested)]
    pub output: OutputConfig,
}

impl AnalysisConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: AnalysisConfig = builder
            .add_source(
                config::Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}
