//! Store configuration.

use std::time::Duration;

use backon::ExponentialBuilder;
use serde::Deserialize;

use crate::encode::StampZone;

/// Options for [`SqliteStore::open`](crate::SqliteStore::open).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  /// Zone the `time` column is written in.
  pub time_zone:  StampZone,
  pub open_retry: OpenRetry,
}

/// Backoff used while the database only hands out read-only handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OpenRetry {
  pub max_times:    usize,
  pub min_delay_ms: u64,
  pub max_delay_ms: u64,
}

impl Default for OpenRetry {
  fn default() -> Self { Self { max_times: 5, min_delay_ms: 50, max_delay_ms: 2_000 } }
}

impl OpenRetry {
  pub fn policy(&self) -> ExponentialBuilder {
    ExponentialBuilder::default()
      .with_min_delay(Duration::from_millis(self.min_delay_ms))
      .with_max_delay(Duration::from_millis(self.max_delay_ms))
      .with_max_times(self.max_times)
      .with_jitter()
  }
}
