pub mod sqlite_reader;

pub use sqlite_reader::{parse_timestamp, SqliteReader};
