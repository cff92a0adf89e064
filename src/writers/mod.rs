pub mod csv_writer;
pub mod parquet_writer;
pub mod sqlite_writer;

pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
pub use sqlite_writer::SqliteWriter;
