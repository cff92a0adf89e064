use crate::error::{AnalysisError, Result};
use crate::models::{Cadence, Observation, TimeSeries};
use crate::utils::constants::DATE_COLUMN;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, info};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Parse a stored `date` value.
///
/// Accepts plain dates, naive date-times and date-times carrying a UTC offset
/// (as dataframe exporters write them). Offsets keep their wall-clock time.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_local());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Ok(dt.naive_local());
        }
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }

    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")?;
    Ok(date.and_time(NaiveTime::MIN))
}

/// Read-only access to the `hourly_data` and `daily_data` observation tables
pub struct SqliteReader {
    conn: Connection,
}

impl SqliteReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalysisError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Database not found: {}", path.display()),
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!("Opened observation store {}", path.display());

        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Column names of `table`, in declaration order
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        if !self.table_exists(table)? {
            return Err(AnalysisError::MissingTable {
                table: table.to_string(),
            });
        }

        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(columns)
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        if !self.table_exists(table)? {
            return Err(AnalysisError::MissingTable {
                table: table.to_string(),
            });
        }

        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    /// Load the full table of `cadence` with its standard parameter schema
    pub fn read_series(&self, cadence: Cadence) -> Result<TimeSeries> {
        self.read_columns(cadence, cadence.parameters())
    }

    pub fn read_hourly(&self) -> Result<TimeSeries> {
        self.read_series(Cadence::Hourly)
    }

    pub fn read_daily(&self) -> Result<TimeSeries> {
        self.read_series(Cadence::Daily)
    }

    /// Load selected parameter columns of a cadence's table.
    ///
    /// Fails on the first absent table or column. Rows are ordered by their
    /// parsed timestamp; columns other than `date` and `parameters` are ignored.
    pub fn read_columns(&self, cadence: Cadence, parameters: &[&str]) -> Result<TimeSeries> {
        let table = cadence.table_name();
        let available = self.table_columns(table)?;

        for column in std::iter::once(&DATE_COLUMN).chain(parameters.iter()) {
            if !available.iter().any(|c| c == column) {
                return Err(AnalysisError::MissingColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                });
            }
        }

        let selected: Vec<String> = std::iter::once(DATE_COLUMN)
            .chain(parameters.iter().copied())
            .map(quote_identifier)
            .collect();
        let query = format!("SELECT {} FROM {}", selected.join(", "), quote_identifier(table));

        let mut stmt = self.conn.prepare(&query)?;
        let raw_rows = stmt
            .query_map([], |row| {
                let date: String = row.get(0)?;
                let mut values = Vec::with_capacity(parameters.len());
                for index in 0..parameters.len() {
                    values.push(row.get::<_, Option<f64>>(index + 1)?);
                }
                Ok((date, values))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut observations = raw_rows
            .into_iter()
            .map(|(date, values)| {
                let values = values
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect();
                Ok(Observation::new(parse_timestamp(&date)?, values))
            })
            .collect::<Result<Vec<_>>>()?;
        observations.sort_by_key(|o| o.timestamp);

        let series = TimeSeries::new(
            cadence,
            parameters.iter().map(|p| p.to_string()).collect(),
            observations,
        )?;

        info!(
            table,
            rows = series.len(),
            incomplete = series.incomplete_count(),
            "Loaded observation table"
        );

        Ok(series)
    }
}

pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::{DAILY_TABLE, HOURLY_TABLE};

    fn timestamp(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = timestamp("2024-03-01 00:00:00");
        assert_eq!(parse_timestamp("2024-03-01").unwrap(), midnight);
        assert_eq!(parse_timestamp("2024-03-01 00:00:00").unwrap(), midnight);
        assert_eq!(parse_timestamp("2024-03-01T00:00:00").unwrap(), midnight);
        assert_eq!(parse_timestamp("2024-03-01 00:00:00+00:00").unwrap(), midnight);
        assert_eq!(parse_timestamp("2024-03-01T00:00:00Z").unwrap(), midnight);
        assert_eq!(
            parse_timestamp("2024-03-01 23:00:00+02:00").unwrap(),
            timestamp("2024-03-01 23:00:00")
        );
        assert!(parse_timestamp("March 1st").is_err());
    }

    fn store() -> SqliteReader {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE daily_data (
                \"index\" INTEGER,
                date TEXT,
                temperature_2m_max_C REAL,
                precipitation_sum_mm REAL,
                weather_code REAL
            );
            INSERT INTO daily_data VALUES (1, '2024-01-02 00:00:00+00:00', 5.0, NULL, 3.0);
            INSERT INTO daily_data VALUES (0, '2024-01-01 00:00:00+00:00', 4.0, 1.5, 3.0);",
        )
        .unwrap();
        SqliteReader::from_connection(conn)
    }

    #[test]
    fn test_read_columns_sorts_and_keeps_nulls() {
        let reader = store();
        let series = reader
            .read_columns(
                Cadence::Daily,
                &["temperature_2m_max_C", "precipitation_sum_mm"],
            )
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.observations()[0].timestamp, timestamp("2024-01-01 00:00:00"));
        assert_eq!(
            series.column("precipitation_sum_mm").unwrap(),
            vec![Some(1.5), None]
        );
    }

    #[test]
    fn test_missing_table_and_column() {
        let reader = store();

        let err = reader.read_series(Cadence::Hourly).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingTable { ref table } if table == HOURLY_TABLE));

        let err = reader.read_series(Cadence::Daily).unwrap_err();
        match err {
            AnalysisError::MissingColumn { table, column } => {
                assert_eq!(table, DAILY_TABLE);
                assert_eq!(column, "temperature_2m_min_C");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_row_count() {
        let reader = store();
        assert_eq!(reader.row_count(DAILY_TABLE).unwrap(), 2);
        assert!(reader.row_count(HOURLY_TABLE).is_err());
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("index"), "\"index\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
