//! Runtime settings, read from an optional TOML file and `HARVEST_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use harvest_store_sqlite::{OpenRetry, StoreConfig, encode::StampZone, schema::DATABASE_NAME};
use serde::Deserialize;

/// Shape of `harvest.toml`.
///
/// ```toml
/// database_path = "~/.local/share/harvest/DataHarvest.db"
/// export_dir    = "~/Downloads"
/// time_zone     = "local"
///
/// [open_retry]
/// max_times = 10
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub database_path: PathBuf,
  pub export_dir:    PathBuf,
  pub time_zone:     StampZone,
  pub open_retry:    OpenRetry,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      database_path: PathBuf::from(DATABASE_NAME),
      export_dir:    PathBuf::from("export"),
      time_zone:     StampZone::default(),
      open_retry:    OpenRetry::default(),
    }
  }
}

impl Settings {
  /// Layer the file at `path` (if it exists) under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("HARVEST")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise Settings")?;
    settings.database_path = expand_tilde(&settings.database_path);
    settings.export_dir = expand_tilde(&settings.export_dir);
    Ok(settings)
  }

  pub fn store_config(&self) -> StoreConfig {
    StoreConfig { time_zone: self.time_zone, open_retry: self.open_retry }
  }
}

/// Create the directory that will hold the database file.
pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
  if let Some(parent) = db_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.database_path, PathBuf::from("DataHarvest.db"));
    assert_eq!(settings.time_zone, StampZone::Utc);
    assert_eq!(settings.open_retry, OpenRetry::default());
  }

  #[test]
  fn file_values_are_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("harvest.toml");
    std::fs::write(
      &path,
      r#"
database_path = "/var/lib/harvest/DataHarvest.db"
export_dir = "/tmp/out"
time_zone = "local"

[open_retry]
max_times = 9
"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.database_path, PathBuf::from("/var/lib/harvest/DataHarvest.db"));
    assert_eq!(settings.export_dir, PathBuf::from("/tmp/out"));
    assert_eq!(settings.time_zone, StampZone::Local);
    assert_eq!(settings.open_retry.max_times, 9);
    assert_eq!(settings.open_retry.min_delay_ms, OpenRetry::default().min_delay_ms);
  }

  #[test]
  fn bad_time_zone_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("harvest.toml");
    std::fs::write(&path, "time_zone = \"mars\"\n").unwrap();
    assert!(Settings::load(&path).is_err());
  }

  #[test]
  fn ensure_db_dir_creates_parents() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("a/b/DataHarvest.db");
    ensure_db_dir(&db).unwrap();
    assert!(dir.path().join("a/b").is_dir());
    ensure_db_dir(Path::new("DataHarvest.db")).unwrap();
  }

  #[test]
  fn tilde_only_expands_as_prefix() {
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
    assert_eq!(expand_tilde(Path::new("rel/~/x.db")), PathBuf::from("rel/~/x.db"));
  }
}
