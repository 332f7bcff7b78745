//! Mapping from telemetry events to table rows.
//!
//! Every mapping is a one-to-one field transcription: the only additions are
//! the formatted timestamp and the network disconnection defaults. Floats are
//! widened to `REAL`, booleans stored as `0`/`1`.

use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};
use harvest_core::{
  event::{Account, LocationEvent, NetworkEvent, ScanResult, WifiConnectionEvent},
  sink::RowId,
};
use rusqlite::types::Value;
use serde::Deserialize;

use crate::schema::{ACCOUNTS, LOCATION, NETWORK, TIME_COLUMN, Table, WIFI_CONNECTION, WIFI_SCAN};

/// Recorded as the network `reason` when the event carried no network object:
/// no information implies a voluntary disconnect.
pub const DISCONNECTION_REASON: &str = "disconnection";

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Render `at` in the `time` column pattern `yyyy-MM-dd HH:mm:ss.S z`, e.g.
/// `2015-06-01 12:30:45.7 UTC`.
///
/// Milliseconds are not zero-padded. A leap second shows as second `60` with
/// its own milliseconds. The zone is the abbreviation chrono knows for `Tz`,
/// which is a numeric offset (`+02:00`) for anything but UTC.
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
  Tz::Offset: fmt::Display,
{
  format!(
    "{}.{} {}",
    at.format("%Y-%m-%d %H:%M:%S"),
    at.timestamp_subsec_millis() % 1_000,
    at.format("%Z")
  )
}

/// Zone the `time` column is written in.
///
/// On the device rows were stamped in its local zone with a zone name. Here
/// the default is `Utc`. `Local` uses the host zone and writes it as a
/// numeric offset such as `+02:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StampZone {
  #[default]
  Utc,
  Local,
}

impl StampZone {
  pub fn format(self, at: DateTime<Utc>) -> String {
    match self {
      StampZone::Utc => format_timestamp(&at),
      StampZone::Local => format_timestamp(&at.with_timezone(&Local)),
    }
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Column/value pairs destined for one table, in insert order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
  pub table:  &'static Table,
  pub values: Vec<(&'static str, Value)>,
}

impl Row {
  fn new(table: &'static Table, time: &str) -> Self {
    Self { table, values: vec![(TIME_COLUMN, Value::Text(time.to_owned()))] }
  }

  fn put(mut self, column: &'static str, value: Value) -> Self {
    debug_assert!(
      self.table.column(column).is_some(),
      "{column} is not a column of {}",
      self.table
    );
    self.values.push((column, value));
    self
  }

  pub fn get(&self, column: &str) -> Option<&Value> {
    self.values.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
  }

  /// Insert this row and return the generated `_id`.
  pub fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<RowId> {
    let columns: Vec<&str> = self.values.iter().map(|(c, _)| *c).collect();
    let mut stmt = conn.prepare_cached(&self.table.insert_sql(&columns))?;
    stmt.insert(rusqlite::params_from_iter(self.values.iter().map(|(_, v)| v)))
  }
}

fn text(s: &str) -> Value { Value::Text(s.to_owned()) }

fn opt_text(s: Option<&str>) -> Value { s.map_or(Value::Null, text) }

fn real(f: impl Into<f64>) -> Value { Value::Real(f.into()) }

// ─── Encoders ────────────────────────────────────────────────────────────────

pub fn encode_account(account: &Account, time: &str) -> Row {
  Row::new(&ACCOUNTS, time)
    .put("name", text(&account.name))
    .put("type", text(&account.account_type))
}

pub fn encode_location(fix: &LocationEvent, time: &str) -> Row {
  Row::new(&LOCATION, time)
    .put("latitude", real(fix.latitude))
    .put("longitude", real(fix.longitude))
    .put("bearing", real(fix.bearing))
    .put("speed", real(fix.speed))
    .put("altitude", real(fix.altitude))
    .put("accuracy", real(fix.accuracy))
}

pub fn encode_network(event: &NetworkEvent, time: &str) -> Row {
  let (type_name, subtype, state, reason) = match &event.info {
    Some(info) => (
      text(&info.type_name),
      text(&info.subtype_name),
      text(&info.state),
      opt_text(info.reason.as_deref()),
    ),
    None => (text(""), text(""), text(""), text(DISCONNECTION_REASON)),
  };

  Row::new(&NETWORK, time)
    .put("type", type_name)
    .put("subtype", subtype)
    .put("state", state)
    .put("reason", reason)
}

pub fn encode_wifi_connection(info: &WifiConnectionEvent, time: &str) -> Row {
  Row::new(&WIFI_CONNECTION, time)
    .put("ip_address", Value::Integer(info.ip_address.into()))
    .put("mac_address", text(&info.mac_address))
    .put("bssid", opt_text(info.bssid.as_deref()))
    .put("ssid", text(&info.ssid))
    .put("hidden", Value::Integer(info.hidden_ssid.into()))
}

pub fn encode_scan_result(result: &ScanResult, time: &str) -> Row {
  Row::new(&WIFI_SCAN, time)
    .put("bssid", text(&result.bssid))
    .put("ssid", text(&result.ssid))
    .put("capabilities", text(&result.capabilities))
}
