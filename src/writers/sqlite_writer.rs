use crate::error::Result;
use crate::models::TimeSeries;
use crate::readers::sqlite_reader::quote_identifier;
use crate::utils::constants::DATE_COLUMN;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::Path;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Persists series into the observation store, one table per cadence
pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Replace the cadence's table with the contents of `series`
    pub fn write_series(&mut self, series: &TimeSeries) -> Result<usize> {
        let table = quote_identifier(series.table_name());

        let mut columns = vec![format!("{} TEXT NOT NULL", quote_identifier(DATE_COLUMN))];
        columns.extend(
            series
                .parameters()
                .iter()
                .map(|p| format!("{} REAL", quote_identifier(p))),
        );

        let placeholders: Vec<String> = (1..=series.parameters().len() + 1)
            .map(|i| format!("?{}", i))
            .collect();

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({});",
            columns.join(", ")
        ))?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                table,
                placeholders.join(", ")
            ))?;

            for observation in series.observations() {
                let date = observation.timestamp.format(TIMESTAMP_FORMAT).to_string();
                let values = std::iter::once(rusqlite::types::Value::Text(date)).chain(
                    observation.values.iter().map(|v| match v {
                        Some(x) => rusqlite::types::Value::Real(*x),
                        None => rusqlite::types::Value::Null,
                    }),
                );
                stmt.execute(params_from_iter(values))?;
            }
        }

        tx.commit()?;
        info!(table = series.table_name(), rows = series.len(), "Stored series");

        Ok(series.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cadence;
    use crate::readers::SqliteReader;
    use chrono::NaiveDateTime;

    #[test]
    fn test_write_then_read_hourly() {
        let ts = |s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();
        let series = TimeSeries::builder(Cadence::Hourly)
            .observation(ts("2024-05-01 00:00:00"), vec![Some(12.5), Some(80.0), Some(0.0), Some(5.0), Some(180.0), Some(9.0)])
            .observation(ts("2024-05-01 01:00:00"), vec![Some(12.0), None, Some(0.2), Some(6.0), Some(190.0), None])
            .build()
            .unwrap();

        let mut writer = SqliteWriter::from_connection(Connection::open_in_memory().unwrap());
        assert_eq!(writer.write_series(&series).unwrap(), 2);
        // a second write replaces the table
        assert_eq!(writer.write_series(&series).unwrap(), 2);

        let reader = SqliteReader::from_connection(writer.into_connection());
        assert_eq!(reader.read_hourly().unwrap(), series);
    }
}
