//! Error type for `mentor-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value does not fit its domain type.
  #[error("corrupt column {column}: {value}")]
  Corrupt { column: &'static str, value: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
