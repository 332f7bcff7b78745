//! Telemetry events — the plain data handed from event sources to a sink.
//!
//! Each variant of [`TelemetryEvent`] carries exactly what the platform
//! reported, with no derived fields. Mapping into table rows happens in the
//! storage backend.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, source::WifiAction};

// ─── Accounts ────────────────────────────────────────────────────────────────

/// One account registered on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub name:         String,
  #[serde(rename = "type")]
  pub account_type: String,
}

impl Account {
  pub fn new(name: impl Into<String>, account_type: impl Into<String>) -> Self {
    Self { name: name.into(), account_type: account_type.into() }
  }
}

/// A full snapshot of the device's account list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsEvent {
  #[serde(default)]
  pub accounts: Vec<Account>,
}

// ─── Location ────────────────────────────────────────────────────────────────

/// A single location fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationEvent {
  pub latitude:  f64,
  pub longitude: f64,
  /// Degrees east of true north.
  pub bearing:   f32,
  /// Metres per second.
  pub speed:     f32,
  /// Metres above the WGS84 ellipsoid.
  pub altitude:  f64,
  /// Estimated horizontal accuracy radius in metres.
  pub accuracy:  f32,
}

// ─── Network ─────────────────────────────────────────────────────────────────

/// Details of the active network as reported on a connectivity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
  pub type_name:    String,
  pub subtype_name: String,
  /// Detailed state, e.g. `CONNECTED` or `DISCONNECTED`.
  pub state:        String,
  /// The platform may report no reason at all.
  #[serde(default)]
  pub reason:       Option<String>,
}

/// A connectivity transition. `info` is absent when the device lost its
/// active network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEvent {
  #[serde(default)]
  pub info: Option<NetworkInfo>,
}

impl NetworkEvent {
  pub fn connected(info: NetworkInfo) -> Self { Self { info: Some(info) } }

  pub fn disconnected() -> Self { Self { info: None } }
}

// ─── WiFi ────────────────────────────────────────────────────────────────────

/// Snapshot of the current WiFi connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiConnectionEvent {
  /// IPv4 address as the platform's packed 32-bit integer.
  pub ip_address:  i32,
  pub mac_address: String,
  /// `None` when not associated with an access point.
  #[serde(default)]
  pub bssid:       Option<String>,
  pub ssid:        String,
  #[serde(default)]
  pub hidden_ssid: bool,
}

/// One access point seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
  pub bssid:        String,
  pub ssid:         String,
  /// Authentication, key management and encryption schemes, e.g.
  /// `[WPA2-PSK-CCMP][ESS]`.
  pub capabilities: String,
}

/// The full result list of one WiFi scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiScanEvent {
  #[serde(default)]
  pub results: Vec<ScanResult>,
}

// ─── Tagged union ────────────────────────────────────────────────────────────

/// Discriminant of [`TelemetryEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
  Accounts,
  Location,
  Network,
  WifiConnection,
  WifiScan,
}

impl EventKind {
  pub const ALL: [EventKind; 5] = [
    EventKind::Accounts,
    EventKind::Location,
    EventKind::Network,
    EventKind::WifiConnection,
    EventKind::WifiScan,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      EventKind::Accounts => "accounts",
      EventKind::Location => "location",
      EventKind::Network => "network",
      EventKind::WifiConnection => "wifi_connection",
      EventKind::WifiScan => "wifi_scan",
    }
  }

  pub fn from_name(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|k| k.as_str() == s)
  }
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Everything an event source can deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryEvent {
  Accounts(AccountsEvent),
  Location(LocationEvent),
  Network(NetworkEvent),
  WifiConnection(WifiConnectionEvent),
  WifiScan(WifiScanEvent),
}

impl TelemetryEvent {
  pub fn kind(&self) -> EventKind {
    match self {
      TelemetryEvent::Accounts(_) => EventKind::Accounts,
      TelemetryEvent::Location(_) => EventKind::Location,
      TelemetryEvent::Network(_) => EventKind::Network,
      TelemetryEvent::WifiConnection(_) => EventKind::WifiConnection,
      TelemetryEvent::WifiScan(_) => EventKind::WifiScan,
    }
  }
}

// ─── Observations ────────────────────────────────────────────────────────────

/// One line of the event feed: an event plus the moment it was observed.
///
/// ```json
/// {"kind":"network","at":"2015-06-01T12:30:45Z","info":null}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
  /// `None` means "observed when read".
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub at:    Option<DateTime<Utc>>,
  #[serde(flatten)]
  pub event: TelemetryEvent,
}

impl Observation {
  /// The observation time, falling back to `now`.
  pub fn observed_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    self.at.unwrap_or(now)
  }
}

/// Parse one JSON line of the event feed.
///
/// The `kind` tag is checked before decoding so an unrecognised kind is
/// reported as such rather than as a generic serde error. A line without a
/// `kind` may instead carry the broadcast `action` it came from (see
/// [`WifiAction`]). When both are present, a recognised action must agree
/// with the kind; an unrecognised one is ignored.
pub fn parse_observation(line: &str) -> Result<Observation> {
  let line = line.trim();
  if line.is_empty() {
    return Err(Error::EmptyLine);
  }

  let mut value: serde_json::Value = serde_json::from_str(line)?;
  let serde_json::Value::Object(map) = &mut value else {
    return Err(Error::UnknownEventKind(String::new()));
  };

  let action = map.get("action").and_then(serde_json::Value::as_str);
  let kind = match map.get("kind").and_then(serde_json::Value::as_str) {
    Some(name) => {
      let kind =
        EventKind::from_name(name).ok_or_else(|| Error::UnknownEventKind(name.to_owned()))?;
      if let Some(action) = action.and_then(|a| a.parse::<WifiAction>().ok())
        && action.event_kind() != kind
      {
        return Err(Error::KindMismatch { kind, action: action.as_str() });
      }
      kind
    }
    // Raw broadcasts name the platform action instead of the event kind.
    None => match action {
      Some(action) => action.parse::<WifiAction>()?.event_kind(),
      None => return Err(Error::UnknownEventKind(String::new())),
    },
  };
  map.insert("kind".into(), kind.as_str().into());

  Ok(serde_json::from_value(value)?)
}
