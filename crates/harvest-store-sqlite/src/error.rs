//! Error type for `harvest-store-sqlite`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// Every attempt to open the database returned a read-only handle.
  #[error("database at {0:?} is read-only")]
  ReadOnly(PathBuf),

  /// A single-row insert failed. Never retried.
  #[error("insert into {table} failed: {source}")]
  Insert {
    table:  &'static str,
    #[source]
    source: rusqlite::Error,
  },

  #[error("in-memory store has no database file")]
  NoDatabaseFile,

  #[error("export to {dest:?} failed: {source}")]
  Export {
    dest:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("export destination {0:?} is the live database")]
  ExportOntoSelf(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
