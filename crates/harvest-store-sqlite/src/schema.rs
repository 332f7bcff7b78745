//! Schema catalog for the DataHarvest SQLite store.
//!
//! Five independent, append-only tables. Each has an autoincrementing `_id`
//! and a textual `time` column; nothing references anything else. Tables are
//! created once when the database is first opened and never altered.

use std::fmt;

/// File name of the on-device database. Exports keep the same name.
pub const DATABASE_NAME: &str = "DataHarvest.db";

/// Value stored in `PRAGMA user_version` after first creation.
pub const SCHEMA_VERSION: i64 = 3;

pub const ID_COLUMN: &str = "_id";
pub const TIME_COLUMN: &str = "time";

// ─── Catalog types ───────────────────────────────────────────────────────────

/// SQLite storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Text,
  /// Doubles and floats alike.
  Real,
  /// Integers and booleans (0/1).
  Integer,
}

impl ColumnType {
  pub fn sql(self) -> &'static str {
    match self {
      ColumnType::Text => "TEXT",
      ColumnType::Real => "REAL",
      ColumnType::Integer => "INTEGER",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub name: &'static str,
  pub ty:   ColumnType,
}

const fn col(name: &'static str, ty: ColumnType) -> Column { Column { name, ty } }

/// A fixed-schema table. `columns` excludes the implicit `_id` key.
#[derive(Debug, PartialEq, Eq)]
pub struct Table {
  pub name:    &'static str,
  pub columns: &'static [Column],
}

impl Table {
  pub fn column(&self, name: &str) -> Option<&Column> {
    self.columns.iter().find(|c| c.name == name)
  }

  pub fn create_sql(&self) -> String {
    let mut defs = vec![format!("{ID_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT")];
    defs.extend(self.columns.iter().map(|c| format!("{} {}", c.name, c.ty.sql())));
    format!("CREATE TABLE IF NOT EXISTS {} ({})", self.name, defs.join(", "))
  }

  /// Parameterised insert naming exactly `columns`, in order.
  pub fn insert_sql(&self, columns: &[&str]) -> String {
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    format!(
      "INSERT INTO {} ({}) VALUES ({})",
      self.name,
      columns.join(", "),
      placeholders.join(", ")
    )
  }
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name) }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

use ColumnType::{Integer, Real, Text};

pub static ACCOUNTS: Table = Table {
  name:    "accounts",
  columns: &[col(TIME_COLUMN, Text), col("name", Text), col("type", Text)],
};

pub static LOCATION: Table = Table {
  name:    "location",
  columns: &[
    col(TIME_COLUMN, Text),
    col("latitude", Real),
    col("longitude", Real),
    col("bearing", Real),
    col("speed", Real),
    col("altitude", Real),
    col("accuracy", Real),
  ],
};

/// `reason` is "disconnection" when the event carried no network object.
pub static NETWORK: Table = Table {
  name:    "network",
  columns: &[
    col(TIME_COLUMN, Text),
    col("type", Text),
    col("subtype", Text),
    col("state", Text),
    col("reason", Text),
  ],
};

pub static WIFI_CONNECTION: Table = Table {
  name:    "wifi_connection",
  columns: &[
    col(TIME_COLUMN, Text),
    col("ip_address", Integer),
    col("mac_address", Text),
    col("bssid", Text),
    col("ssid", Text),
    col("hidden", Integer),
  ],
};

pub static WIFI_SCAN: Table = Table {
  name:    "wifi_scan",
  columns: &[
    col(TIME_COLUMN, Text),
    col("bssid", Text),
    col("ssid", Text),
    col("capabilities", Text),
  ],
};

pub static ALL_TABLES: [&Table; 5] =
  [&ACCOUNTS, &LOCATION, &NETWORK, &WIFI_CONNECTION, &WIFI_SCAN];

// ─── Creation ────────────────────────────────────────────────────────────────

/// Which tables a creation pass managed to create.
#[derive(Debug, Default)]
pub struct SchemaReport {
  pub created: Vec<&'static str>,
  pub failed:  Vec<(&'static str, rusqlite::Error)>,
}

impl SchemaReport {
  pub fn is_complete(&self) -> bool { self.failed.is_empty() }
}

/// Create every catalog table, one statement each.
///
/// A failing table does not stop the others; there is no transaction around
/// the pass. Existing tables and their rows are left alone.
pub fn create_tables(conn: &rusqlite::Connection) -> SchemaReport {
  let mut report = SchemaReport::default();
  for table in ALL_TABLES {
    match conn.execute(&table.create_sql(), []) {
      Ok(_) => report.created.push(table.name),
      Err(e) => report.failed.push((table.name, e)),
    }
  }
  report
}

/// What happened when the schema was checked on open.
#[derive(Debug)]
pub enum SchemaInit {
  /// Fresh database; the catalog was created.
  Created(SchemaReport),
  /// Older schema version. Upgrades are not supported and leave the tables
  /// as they are.
  Upgraded { from: i64 },
  Current,
  /// Written by a newer build; used as is.
  Newer { version: i64 },
}

/// Create the catalog on a fresh database and stamp the schema version.
pub fn initialize(conn: &rusqlite::Connection) -> rusqlite::Result<SchemaInit> {
  let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

  let init = match version {
    0 => SchemaInit::Created(create_tables(conn)),
    v if v < SCHEMA_VERSION => SchemaInit::Upgraded { from: v },
    v if v == SCHEMA_VERSION => return Ok(SchemaInit::Current),
    v => return Ok(SchemaInit::Newer { version: v }),
  };

  conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
  Ok(init)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn create_sql_lists_columns_in_order() {
    assert_eq!(
      ACCOUNTS.create_sql(),
      "CREATE TABLE IF NOT EXISTS accounts \
       (_id INTEGER PRIMARY KEY AUTOINCREMENT, time TEXT, name TEXT, type TEXT)"
    );
    assert_eq!(
      WIFI_CONNECTION.create_sql(),
      "CREATE TABLE IF NOT EXISTS wifi_connection \
       (_id INTEGER PRIMARY KEY AUTOINCREMENT, time TEXT, ip_address INTEGER, \
       mac_address TEXT, bssid TEXT, ssid TEXT, hidden INTEGER)"
    );
  }

  #[test]
  fn insert_sql_numbers_placeholders() {
    assert_eq!(
      WIFI_SCAN.insert_sql(&["time", "bssid", "ssid", "capabilities"]),
      "INSERT INTO wifi_scan (time, bssid, ssid, capabilities) VALUES (?1, ?2, ?3, ?4)"
    );
  }

  #[test]
  fn every_table_has_a_time_column_first() {
    for table in ALL_TABLES {
      assert_eq!(table.columns[0].name, TIME_COLUMN, "{table}");
      assert_eq!(table.columns[0].ty, ColumnType::Text);
    }
  }

  #[test]
  fn location_columns_are_real() {
    assert!(LOCATION.columns[1..].iter().all(|c| c.ty == ColumnType::Real));
  }

  #[test]
  fn creation_is_idempotent() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(create_tables(&conn).is_complete());

    conn
      .execute(
        "INSERT INTO accounts (time, name, type) VALUES ('t', 'a@x.com', 'com.google')",
        [],
      )
      .unwrap();

    let again = create_tables(&conn);
    assert!(again.is_complete());
    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))
      .unwrap();
    assert_eq!(count, 1);
  }

  #[test]
  fn failed_table_does_not_stop_the_rest() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    // An index squatting on a table name makes that one CREATE fail.
    conn
      .execute_batch("CREATE TABLE other (x); CREATE INDEX network ON other (x);")
      .unwrap();

    let report = create_tables(&conn);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "network");
    assert_eq!(report.created, vec!["accounts", "location", "wifi_connection", "wifi_scan"]);
  }

  #[test]
  fn initialize_stamps_version_once() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(matches!(initialize(&conn).unwrap(), SchemaInit::Created(r) if r.is_complete()));
    assert!(matches!(initialize(&conn).unwrap(), SchemaInit::Current));

    let version: i64 = conn
      .pragma_query_value(None, "user_version", |r| r.get(0))
      .unwrap();
    assert_eq!(version, SCHEMA_VERSION);
  }

  #[test]
  fn newer_version_is_used_as_is() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 7;").unwrap();

    assert!(matches!(initialize(&conn).unwrap(), SchemaInit::Newer { version: 7 }));

    let version: i64 = conn
      .pragma_query_value(None, "user_version", |r| r.get(0))
      .unwrap();
    assert_eq!(version, 7);
    let tables: i64 = conn
      .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'", [], |r| r.get(0))
      .unwrap();
    assert_eq!(tables, 0);
  }

  #[test]
  fn older_version_is_left_alone() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    conn
      .execute_batch(
        "CREATE TABLE accounts (_id INTEGER PRIMARY KEY, time TEXT);
         PRAGMA user_version = 1;",
      )
      .unwrap();

    assert!(matches!(initialize(&conn).unwrap(), SchemaInit::Upgraded { from: 1 }));

    // No migration: the old table keeps its shape and nothing else appears.
    let tables: i64 = conn
      .query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'location'",
        [],
        |r| r.get(0),
      )
      .unwrap();
    assert_eq!(tables, 0);
  }
}
