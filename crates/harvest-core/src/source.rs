//! Descriptors for the platform event sources.
//!
//! The sources themselves live outside this workspace. These types describe
//! what the collector asks of them and how their broadcasts map onto
//! [`EventKind`]s.

use std::{str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Error, event::EventKind};

// ─── Location ────────────────────────────────────────────────────────────────

/// Minimum interval between location fixes.
pub const LOCATION_UPDATE_INTERVAL: Duration = Duration::from_secs(3 * 60);

/// Power/accuracy tradeoff requested from the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
  #[default]
  HighAccuracy,
  BalancedPowerAccuracy,
  LowPower,
  NoPower,
}

/// Subscription parameters handed to the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRequest {
  pub interval: Duration,
  pub priority: Priority,
}

impl Default for LocationRequest {
  fn default() -> Self {
    Self { interval: LOCATION_UPDATE_INTERVAL, priority: Priority::HighAccuracy }
  }
}

// ─── Broadcast actions ───────────────────────────────────────────────────────

/// A platform broadcast the network receiver listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiAction {
  /// Cellular or WiFi connectivity changed; read the active network info.
  ConnectivityChange,
  /// A WiFi scan completed; read the scan result list.
  ScanResultsAvailable,
  /// The WiFi connection changed; read the connection info.
  NetworkStateChanged,
}

impl WifiAction {
  pub const ALL: [WifiAction; 3] = [
    WifiAction::ConnectivityChange,
    WifiAction::ScanResultsAvailable,
    WifiAction::NetworkStateChanged,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      WifiAction::ConnectivityChange => "android.net.conn.CONNECTIVITY_CHANGE",
      WifiAction::ScanResultsAvailable => "android.net.wifi.SCAN_RESULTS",
      WifiAction::NetworkStateChanged => "android.net.wifi.STATE_CHANGE",
    }
  }

  /// The kind of event the receiver produces for this broadcast.
  pub fn event_kind(self) -> EventKind {
    match self {
      WifiAction::ConnectivityChange => EventKind::Network,
      WifiAction::ScanResultsAvailable => EventKind::WifiScan,
      WifiAction::NetworkStateChanged => EventKind::WifiConnection,
    }
  }
}

impl FromStr for WifiAction {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    WifiAction::ALL
      .into_iter()
      .find(|a| a.as_str() == s)
      .ok_or_else(|| Error::UnknownAction(s.to_owned()))
  }
}
