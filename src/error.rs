use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Required table '{table}' not found")]
    MissingTable { table: String },

    #[error("Required column '{column}' not found in '{table}'")]
    MissingColumn { table: String, column: String },

    #[error("Invalid timeframe '{0}' (expected one of: week, month, season, year)")]
    InvalidTimeframe(String),

    #[error("Invalid variability mode '{0}' (expected 'above' or 'below')")]
    InvalidVariabilityMode(String),

    #[error("Invalid cadence '{0}' (expected 'hourly' or 'daily')")]
    InvalidCadence(String),

    #[error("Timestamp {timestamp} is not strictly after the previous observation")]
    UnorderedTimestamp { timestamp: String },

    #[error("Computation failed for row {key}: {message}")]
    Computation { key: String, message: String },

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}
