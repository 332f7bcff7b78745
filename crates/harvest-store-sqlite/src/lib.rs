//! SQLite backend for the DataHarvest telemetry store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

pub mod config;
pub mod encode;
pub mod export;
pub mod schema;
mod store;

pub mod error;

pub use config::{OpenRetry, StoreConfig};
pub use error::{Error, Result};
pub use store::SqliteStore;
