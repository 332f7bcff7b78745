//! [`SqliteStore`] — the SQLite implementation of [`TelemetrySink`].

use std::path::{Path, PathBuf};

use backon::Retryable as _;
use chrono::{DateTime, Utc};
use harvest_core::{
  event::{AccountsEvent, LocationEvent, NetworkEvent, WifiConnectionEvent, WifiScanEvent},
  sink::{BatchOutcome, RowId, TelemetrySink},
};
use rusqlite::DatabaseName;
use tracing::{Span, debug, error, info, info_span, trace, warn};

use crate::{
  Error, Result,
  config::{OpenRetry, StoreConfig},
  encode::{
    Row, StampZone, encode_account, encode_location, encode_network, encode_scan_result,
    encode_wifi_connection,
  },
  export::copy_database,
  schema::{self, SchemaInit},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A DataHarvest telemetry store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Every clone
/// logs under the span created when the store was opened.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  path: Option<PathBuf>,
  zone: StampZone,
  span: Span,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  ///
  /// Retries with backoff while the database hands out read-only handles.
  pub async fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let span = info_span!("store", path = %path.display());
    let conn = open_writable(&path, &config.open_retry, &span).await?;
    let store = Self { conn, path: Some(path), zone: config.time_zone, span };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self {
      conn,
      path: None,
      zone: StampZone::Utc,
      span: info_span!("store", path = ":memory:"),
    };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let init = self
      .conn
      .call(|conn| {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
          row.get::<_, String>(0)
        })?;
        Ok(schema::initialize(conn)?)
      })
      .await?;

    match init {
      SchemaInit::Created(report) => {
        info!(parent: &self.span, tables = ?report.created, "created database");
        for (table, e) in &report.failed {
          error!(parent: &self.span, table, error = %e, "failed to create table");
        }
      }
      SchemaInit::Upgraded { from } => {
        warn!(
          parent: &self.span,
          from,
          to = schema::SCHEMA_VERSION,
          "schema upgrades are not supported; tables left unchanged"
        );
      }
      SchemaInit::Current => debug!(parent: &self.span, "schema is current"),
      SchemaInit::Newer { version } => {
        warn!(parent: &self.span, version, "database written by a newer schema version");
      }
    }
    Ok(())
  }

  /// Insert a single row, returning its id.
  async fn insert_row(&self, row: Row) -> Result<RowId> {
    let table = row.table.name;
    trace!(parent: &self.span, ?row, "inserting row");

    let result = self.conn.call(move |conn| Ok(row.insert(conn))).await?;
    result.map_err(|source| {
      warn!(parent: &self.span, table, error = %source, "insert failed");
      Error::Insert { table, source }
    })
  }

  /// Insert each row on its own. Failures are counted, not propagated.
  async fn insert_rows(&self, rows: Vec<Row>) -> Result<BatchOutcome> {
    for row in &rows {
      trace!(parent: &self.span, ?row, "inserting row");
    }

    let results: Vec<(&'static str, rusqlite::Result<RowId>)> = self
      .conn
      .call(move |conn| {
        Ok(rows.iter().map(|row| (row.table.name, row.insert(conn))).collect())
      })
      .await?;

    let mut outcome = BatchOutcome::default();
    for (table, result) in results {
      match result {
        Ok(id) => outcome.inserted.push(id),
        Err(e) => {
          warn!(parent: &self.span, table, error = %e, "insert failed");
          outcome.failed += 1;
        }
      }
    }

    if !outcome.is_complete() {
      warn!(
        parent: &self.span,
        failed = outcome.failed,
        attempted = outcome.attempted(),
        "batch partially written"
      );
    }
    Ok(outcome)
  }

  // ── Export ────────────────────────────────────────────────────────────────

  /// Copy the live database file into `dest_dir` under the same name.
  ///
  /// The write-ahead log is checkpointed first so the copy holds every
  /// committed row. No lock is held against concurrent writers while the
  /// file is copied.
  pub async fn export_to(&self, dest_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let src = self.path.as_deref().ok_or(Error::NoDatabaseFile)?;

    let busy: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |row| row.get(0))?)
      })
      .await?;
    if busy != 0 {
      warn!(parent: &self.span, "checkpoint blocked by a reader; export may miss recent rows");
    }

    match copy_database(src, dest_dir.as_ref()).await {
      Ok(dest) => {
        info!(parent: &self.span, dest = %dest.display(), "exported database");
        Ok(dest)
      }
      Err(e) => {
        error!(parent: &self.span, error = %e, "export failed");
        Err(e)
      }
    }
  }

  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }
}

/// Open `path` until a writable handle comes back or the retries run out.
async fn open_writable(
  path: &Path,
  retry: &OpenRetry,
  span: &Span,
) -> Result<tokio_rusqlite::Connection> {
  (|| async {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let read_only = conn
      .call(|conn| Ok(conn.is_readonly(DatabaseName::Main)?))
      .await?;
    if read_only {
      return Err(Error::ReadOnly(path.to_path_buf()));
    }
    Ok::<_, Error>(conn)
  })
  .retry(retry.policy())
  .when(|e| matches!(e, Error::ReadOnly(_)))
  .notify(|_, delay| {
    debug!(parent: span, ?delay, "database is read-only; retrying");
  })
  .await
}

// ─── TelemetrySink impl ──────────────────────────────────────────────────────

impl TelemetrySink for SqliteStore {
  type Error = Error;

  async fn record_accounts(
    &self,
    event: AccountsEvent,
    at: DateTime<Utc>,
  ) -> Result<BatchOutcome> {
    let time = self.zone.format(at);
    let rows = event.accounts.iter().map(|a| encode_account(a, &time)).collect();
    self.insert_rows(rows).await
  }

  async fn record_location(&self, event: LocationEvent, at: DateTime<Utc>) -> Result<RowId> {
    let time = self.zone.format(at);
    self.insert_row(encode_location(&event, &time)).await
  }

  async fn record_network(&self, event: NetworkEvent, at: DateTime<Utc>) -> Result<RowId> {
    let time = self.zone.format(at);
    self.insert_row(encode_network(&event, &time)).await
  }

  async fn record_wifi_connection(
    &self,
    event: WifiConnectionEvent,
    at: DateTime<Utc>,
  ) -> Result<RowId> {
    let time = self.zone.format(at);
    self.insert_row(encode_wifi_connection(&event, &time)).await
  }

  // Scan results carry no time of their own here: the whole list shares the
  // moment the scan broadcast was observed.
  async fn record_wifi_scan(
    &self,
    event: WifiScanEvent,
    at: DateTime<Utc>,
  ) -> Result<BatchOutcome> {
    let time = self.zone.format(at);
    let rows = event.results.iter().map(|r| encode_scan_result(r, &time)).collect();
    self.insert_rows(rows).await
  }
}
