use crate::error::{AnalysisError, Result};
use crate::models::{AggregatedTable, Statistic};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{ArrayRef, Date32Array, Float64Array, UInt64Array};
use arrow::datatypes::{DataType, Date32Type, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Writes aggregated tables as `period_end`, `observation_count`, then
/// `<parameter>_<mean|max|min|std>` per parameter. NaN statistics are stored as nulls.
pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(AnalysisError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    fn create_schema(&self, table: &AggregatedTable) -> Arc<Schema> {
        let mut fields = vec![
            Field::new("period_end", DataType::Date32, false),
            Field::new("observation_count", DataType::UInt64, false),
        ];
        for parameter in &table.parameters {
            for statistic in Statistic::ALL {
                fields.push(Field::new(
                    column_name(parameter, statistic),
                    DataType::Float64,
                    true,
                ));
            }
        }

        Arc::new(Schema::new(fields))
    }

    fn table_to_batch(&self, table: &AggregatedTable, schema: Arc<Schema>) -> Result<RecordBatch> {
        let period_ends: Vec<i32> = table
            .periods
            .iter()
            .map(|p| Date32Type::from_naive_date(p.period_end))
            .collect();
        let counts: Vec<u64> = table
            .periods
            .iter()
            .map(|p| p.observation_count as u64)
            .collect();

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(Date32Array::from(period_ends)),
            Arc::new(UInt64Array::from(counts)),
        ];

        for index in 0..table.parameters.len() {
            for statistic in Statistic::ALL {
                let values: Vec<Option<f64>> = table
                    .periods
                    .iter()
                    .map(|p| Some(p.statistics(index).get(statistic)).filter(|v| !v.is_nan()))
                    .collect();
                columns.push(Arc::new(Float64Array::from(values)));
            }
        }

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    pub fn write_table(&self, table: &AggregatedTable, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let schema = self.create_schema(table);
        let batch = self.table_to_batch(table, schema.clone())?;

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        info!(
            "Wrote {} {} buckets to {}",
            table.len(),
            table.timeframe,
            path.display()
        );
        Ok(())
    }

    /// Read one statistic column back; nulls come back as `None`
    pub fn read_column(&self, path: &Path, column: &str) -> Result<Vec<Option<f64>>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut values = Vec::new();
        for batch in reader {
            let batch = batch?;
            let array = batch
                .column_by_name(column)
                .ok_or_else(|| AnalysisError::MissingColumn {
                    table: path.display().to_string(),
                    column: column.to_string(),
                })?
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| {
                    AnalysisError::InvalidFormat(format!("Column {} is not Float64", column))
                })?;
            values.extend(array.iter());
        }

        Ok(values)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let columns = metadata.file_metadata().schema_descr().num_columns();
        let file_size = std::fs::metadata(path)?.len();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows,
            columns,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression: self.compression,
        })
    }
}

pub fn column_name(parameter: &str, statistic: Statistic) -> String {
    format!("{}_{}", parameter, statistic)
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub columns: usize,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let rows_per_group = match self.row_groups {
            0 => 0,
            groups => self.total_rows / i64::from(groups),
        };

        format!(
            "Wrote {} buckets x {} columns ({:.1} KiB, {:?})\n\
            Row groups: {} (~{} rows each)",
            self.total_rows,
            self.columns,
            self.file_size as f64 / 1024.0,
            self.compression,
            self.row_groups,
            rows_per_group
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::Aggregator;
    use crate::models::{Cadence, TimeSeries, Timeframe};
    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    fn table() -> AggregatedTable {
        let date = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        let series = TimeSeries::builder(Cadence::Daily)
            .parameters(&["temperature_2m_max_C"])
            .day(date(1, 10), vec![Some(4.0)])
            .day(date(1, 11), vec![Some(6.0)])
            .day(date(3, 2), vec![Some(9.0)])
            .build()
            .unwrap();
        Aggregator::new().aggregate(&series, Timeframe::Month).unwrap()
    }

    #[test]
    fn test_write_table() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_table(&table(), temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 3);
        assert_eq!(info.columns, 2 + 4);
        assert!(info.summary().starts_with("Wrote 3 buckets x 6 columns"));

        let means = writer.read_column(temp_file.path(), "temperature_2m_max_C_mean")?;
        assert_eq!(means, vec![Some(5.0), None, Some(9.0)]);

        let stds = writer.read_column(temp_file.path(), "temperature_2m_max_C_std")?;
        assert_eq!(stds[2], None);
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let compressions = ["snappy", "gzip", "lz4", "zstd", "none"];

        for compression in &compressions {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;

            let result = writer.write_table(&table(), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli-ish").is_err());
        Ok(())
    }
}
