//! Verbatim copy of the database file to a user-visible directory.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Copy `src` into `dest_dir` under the same file name.
///
/// The directory and file are created when missing; an existing file is
/// overwritten. Returns the destination path.
pub async fn copy_database(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
  let file_name = src.file_name().ok_or(Error::NoDatabaseFile)?;
  let dest = dest_dir.join(file_name);
  let io_err = |source| Error::Export { dest: dest.clone(), source };

  tokio::fs::create_dir_all(dest_dir).await.map_err(io_err)?;

  // Copying a file onto itself would truncate it first.
  let same_file = match (
    tokio::fs::canonicalize(src).await,
    tokio::fs::canonicalize(&dest).await,
  ) {
    (Ok(a), Ok(b)) => a == b,
    _ => false,
  };
  if same_file {
    return Err(Error::ExportOntoSelf(dest));
  }

  tokio::fs::copy(src, &dest).await.map_err(io_err)?;
  Ok(dest)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn copies_bytes_under_same_name() {
    let src_dir = tempfile::tempdir().unwrap();
    let dest_dir = tempfile::tempdir().unwrap();
    let src = src_dir.path().join("DataHarvest.db");
    std::fs::write(&src, b"SQLite format 3\0payload").unwrap();

    let dest = copy_database(&src, dest_dir.path()).await.unwrap();
    assert_eq!(dest, dest_dir.path().join("DataHarvest.db"));
    assert_eq!(std::fs::read(&dest).unwrap(), std::fs::read(&src).unwrap());
  }

  #[tokio::test]
  async fn creates_missing_directory_and_overwrites() {
    let src_dir = tempfile::tempdir().unwrap();
    let dest_root = tempfile::tempdir().unwrap();
    let dest_dir = dest_root.path().join("nested/exports");
    let src = src_dir.path().join("DataHarvest.db");

    std::fs::write(&src, b"first").unwrap();
    copy_database(&src, &dest_dir).await.unwrap();
    std::fs::write(&src, b"second").unwrap();
    let dest = copy_database(&src, &dest_dir).await.unwrap();

    assert_eq!(std::fs::read(dest).unwrap(), b"second");
  }

  #[tokio::test]
  async fn refuses_to_copy_onto_itself() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("DataHarvest.db");
    std::fs::write(&src, b"live").unwrap();

    let err = copy_database(&src, dir.path()).await.unwrap_err();
    assert!(matches!(err, Error::ExportOntoSelf(_)));
    assert_eq!(std::fs::read(&src).unwrap(), b"live");
  }

  #[tokio::test]
  async fn missing_source_is_an_export_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = copy_database(&dir.path().join("absent.db"), &dir.path().join("out"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Export { .. }));
  }
}
