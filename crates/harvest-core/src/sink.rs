//! The `TelemetrySink` trait and its write outcome types.
//!
//! The trait is implemented by storage backends (e.g. `harvest-store-sqlite`).
//! Event sources and the `harvest` binary depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::event::{
  AccountsEvent, LocationEvent, NetworkEvent, TelemetryEvent, WifiConnectionEvent,
  WifiScanEvent,
};

/// Identifier generated by the store for an inserted row.
pub type RowId = i64;

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of writing a multi-entity event: one insert per entity.
///
/// Failed inserts are neither retried nor rolled back; the rows that did go
/// in stay in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
  /// Ids of the rows that were inserted, in entity order.
  pub inserted: Vec<RowId>,
  /// Number of entities whose insert failed.
  pub failed:   usize,
}

impl BatchOutcome {
  /// `false` if any individual insert failed.
  pub fn is_complete(&self) -> bool { self.failed == 0 }

  pub fn attempted(&self) -> usize { self.inserted.len() + self.failed }
}

/// Outcome of [`TelemetrySink::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
  Row { id: RowId },
  Batch(BatchOutcome),
}

impl Recorded {
  pub fn succeeded(&self) -> bool {
    match self {
      Recorded::Row { .. } => true,
      Recorded::Batch(outcome) => outcome.is_complete(),
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// The single writer interface every event source dispatches to.
///
/// All writes are append-only. `at` is the moment the event was observed; it
/// is formatted once and shared by every row the event produces.
pub trait TelemetrySink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Write one row per account.
  fn record_accounts(
    &self,
    event: AccountsEvent,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  fn record_location(
    &self,
    event: LocationEvent,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<RowId, Self::Error>> + Send + '_;

  /// Write one connectivity row. A missing network object is recorded as a
  /// disconnection.
  fn record_network(
    &self,
    event: NetworkEvent,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<RowId, Self::Error>> + Send + '_;

  fn record_wifi_connection(
    &self,
    event: WifiConnectionEvent,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<RowId, Self::Error>> + Send + '_;

  /// Write one row per scan result.
  fn record_wifi_scan(
    &self,
    event: WifiScanEvent,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  /// Dispatch any event to the matching write.
  fn record(
    &self,
    event: TelemetryEvent,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Recorded, Self::Error>> + Send + '_ {
    async move {
      Ok(match event {
        TelemetryEvent::Accounts(e) => Recorded::Batch(self.record_accounts(e, at).await?),
        TelemetryEvent::Location(e) => Recorded::Row { id: self.record_location(e, at).await? },
        TelemetryEvent::Network(e) => Recorded::Row { id: self.record_network(e, at).await? },
        TelemetryEvent::WifiConnection(e) => {
          Recorded::Row { id: self.record_wifi_connection(e, at).await? }
        }
        TelemetryEvent::WifiScan(e) => Recorded::Batch(self.record_wifi_scan(e, at).await?),
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn batch_is_complete_only_without_failures() {
    let ok = BatchOutcome { inserted: vec![1, 2, 3], failed: 0 };
    assert!(ok.is_complete());
    assert_eq!(ok.attempted(), 3);

    let partial = BatchOutcome { inserted: vec![1], failed: 2 };
    assert!(!partial.is_complete());
    assert_eq!(partial.attempted(), 3);
  }

  #[test]
  fn empty_batch_is_complete() {
    assert!(BatchOutcome::default().is_complete());
    assert!(Recorded::Batch(BatchOutcome::default()).succeeded());
  }

  #[test]
  fn single_row_always_succeeded() {
    assert!(Recorded::Row { id: 7 }.succeeded());
  }
}
