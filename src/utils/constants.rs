/// Table names in the observation store
pub const HOURLY_TABLE: &str = "hourly_data";
pub const DAILY_TABLE: &str = "daily_data";

/// Timestamp column shared by both tables
pub const DATE_COLUMN: &str = "date";

/// Hourly parameters
pub const HOURLY_TEMPERATURE: &str = "temperature_2m_C";
pub const HOURLY_HUMIDITY: &str = "relative_humidity_2m_percent";
pub const HOURLY_PRECIPITATION: &str = "precipitation_mm";
pub const HOURLY_WIND_SPEED: &str = "wind_speed_10m_kmh";
pub const HOURLY_WIND_DIRECTION: &str = "wind_direction_10m_deg";
pub const HOURLY_WIND_GUSTS: &str = "wind_gusts_10m_kmh";

pub const HOURLY_PARAMETERS: [&str; 6] = [
    HOURLY_TEMPERATURE,
    HOURLY_HUMIDITY,
    HOURLY_PRECIPITATION,
    HOURLY_WIND_SPEED,
    HOURLY_WIND_DIRECTION,
    HOURLY_WIND_GUSTS,
];

/// Daily parameters
pub const DAILY_TEMPERATURE_MAX: &str = "temperature_2m_max_C";
pub const DAILY_TEMPERATURE_MIN: &str = "temperature_2m_min_C";
pub const DAILY_TEMPERATURE_MEAN: &str = "temperature_2m_mean_C";
pub const DAILY_PRECIPITATION_SUM: &str = "precipitation_sum_mm";
pub const DAILY_WIND_SPEED_MAX: &str = "wind_speed_10m_max_kmh";
pub const DAILY_WIND_GUSTS_MAX: &str = "wind_gusts_10m_max_kmh";
pub const DAILY_WIND_DIRECTION_DOMINANT: &str = "wind_direction_10m_dominant_deg";

pub const DAILY_PARAMETERS: [&str; 7] = [
    DAILY_TEMPERATURE_MAX,
    DAILY_TEMPERATURE_MIN,
    DAILY_TEMPERATURE_MEAN,
    DAILY_PRECIPITATION_SUM,
    DAILY_WIND_SPEED_MAX,
    DAILY_WIND_GUSTS_MAX,
    DAILY_WIND_DIRECTION_DOMINANT,
];

/// Extreme event percentiles
pub const DEFAULT_LOW_PERCENTILE: f64 = 0.05;
pub const DEFAULT_HIGH_PERCENTILE: f64 = 0.95;

/// Ideal outdoor event conditions
pub const IDEAL_TEMP_MIN: f64 = 18.0;
pub const IDEAL_TEMP_MAX: f64 = 25.0;
pub const IDEAL_PRECIPITATION: f64 = 0.0;
pub const IDEAL_WIND_SPEED: f64 = 10.0;

/// Suitability score weights
pub const TEMPERATURE_WEIGHT: f64 = 0.4;
pub const PRECIPITATION_WEIGHT: f64 = 0.3;
pub const WIND_SPEED_WEIGHT: f64 = 0.3;

/// Scores at or above this are good event days
pub const GOOD_EVENT_THRESHOLD: f64 = 70.0;

/// Physical plausibility limits
pub const MIN_VALID_TEMP: f64 = -60.0;
pub const MAX_VALID_TEMP: f64 = 60.0;
pub const MAX_VALID_HUMIDITY: f64 = 100.0;
pub const MAX_VALID_PRECIPITATION: f64 = 500.0;
pub const MAX_VALID_WIND_SPEED: f64 = 400.0;
pub const MAX_VALID_WIND_DIRECTION: f64 = 360.0;

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Environment prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "WEATHER_ANALYZER";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
