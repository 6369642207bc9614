//! Local filesystem backend.

use super::{FileStat, Storage, VersionToken};
use crate::common::{Error, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Spreadsheets on the local filesystem, addressed by path.
///
/// Writes are atomic: the new contents go to a temporary file in the same
/// directory, are synced, then renamed over the destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

fn parent_dir_or_dot(path: &Path) -> &Path {
    // `Path::parent` returns `Some("")` for bare file names.
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

impl Storage for LocalStorage {
    type Locator = PathBuf;

    fn open_read(&self, locator: &PathBuf) -> Result<Box<dyn Read + '_>> {
        let file = File::open(locator).map_err(|e| Error::from_io(e, locator))?;
        Ok(Box::new(file))
    }

    fn stat(&self, locator: &PathBuf) -> Result<FileStat> {
        let metadata = fs::metadata(locator).map_err(|e| Error::from_io(e, locator))?;
        let modified = metadata.modified().map_err(|e| Error::from_io(e, locator))?;
        Ok(FileStat {
            modified: DateTime::<Utc>::from(modified),
            size: metadata.len(),
        })
    }

    fn write_full(&self, locator: &PathBuf, bytes: &[u8]) -> Result<VersionToken> {
        let dir = parent_dir_or_dot(locator);
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::from_io(e, dir))?;
        tmp.write_all(bytes)?;
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all()?;

        // Keep the mode of the file being replaced.
        if let Ok(metadata) = fs::metadata(locator) {
            tmp.as_file().set_permissions(metadata.permissions())?;
        }

        tmp.persist(locator).map_err(|e| Error::from_io(e.error, locator))?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), locator.display());

        let stat = self.stat(locator)?;
        Ok(VersionToken(stat.modified.to_rfc3339()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_stat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.ods");
        let storage = LocalStorage::new();

        storage.write_full(&path, b"first").unwrap();
        storage.write_full(&path, b"second!").unwrap();

        let mut data = Vec::new();
        storage.open_read(&path).unwrap().read_to_end(&mut data).unwrap();
        assert_eq!(data, b"second!");
        assert_eq!(storage.stat(&path).unwrap().size, 7);

        // No temporary files left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ods");
        assert!(matches!(
            LocalStorage.open_read(&path),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(LocalStorage.stat(&path), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_parent_dir_of_bare_name() {
        assert_eq!(parent_dir_or_dot(Path::new("form.ods")), Path::new("."));
        assert_eq!(parent_dir_or_dot(Path::new("a/form.ods")), Path::new("a"));
    }
}
