use crate::models::{Cadence, Timeframe};
use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

fn date_stamp() -> String {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    format!("{:02}{:02}{:02}", year, now.month(), now.day())
}

/// Generate default score filename with format: event-suitability-scores-{YYMMDD}.csv
pub fn generate_default_scores_filename(dir: &Path) -> PathBuf {
    let filename = format!("event-suitability-scores-{}.csv", date_stamp());
    dir.join(filename)
}

/// Generate default aggregate filename, e.g. daily-month-{YYMMDD}.parquet
pub fn generate_default_aggregate_filename(
    dir: &Path,
    cadence: Cadence,
    timeframe: Timeframe,
) -> PathBuf {
    let filename = format!("{}-{}-{}.parquet", cadence, timeframe, date_stamp());
    dir.join(filename)
}
