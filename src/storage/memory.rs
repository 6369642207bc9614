//! In-memory backend.

use super::{FileStat, Storage, VersionToken};
use crate::common::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{Cursor, Read};

#[derive(Debug, Clone)]
struct MemoryFile {
    data: Vec<u8>,
    version: u64,
}

#[derive(Debug, Default)]
struct Inner {
    files: HashMap<String, MemoryFile>,
    clock: u64,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// Files kept in memory, addressed by name.
///
/// Every write advances a store-wide clock by one second, so modification
/// times are deterministic and two writes never share a timestamp. The
/// store is `Sync` and can be shared between several documents through `&`
/// or `Arc`.
///
/// # Examples
///
/// ```
/// use seafform::storage::{MemoryStorage, Storage};
///
/// let storage = MemoryStorage::new();
/// storage.insert("form.ods", b"bytes".to_vec());
/// let before = storage.stat(&"form.ods".to_string()).unwrap();
///
/// storage.touch("form.ods");
/// let after = storage.stat(&"form.ods".to_string()).unwrap();
/// assert!(after.modified > before.modified);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file.
    pub fn insert(&self, name: impl Into<String>, data: Vec<u8>) {
        let mut inner = self.inner.lock();
        let version = inner.tick();
        inner.files.insert(name.into(), MemoryFile { data, version });
    }

    /// Current contents of a file.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.inner.lock().files.get(name).map(|file| file.data.clone())
    }

    /// Bump the modification time without changing the contents, as an
    /// outside editor saving the file would.
    pub fn touch(&self, name: &str) -> bool {
        let mut inner = self.inner.lock();
        let version = inner.tick();
        match inner.files.get_mut(name) {
            Some(file) => {
                file.version = version;
                true
            },
            None => false,
        }
    }

    fn modified_at(version: u64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(version as i64)
    }
}

impl Storage for MemoryStorage {
    type Locator = String;

    fn open_read(&self, locator: &String) -> Result<Box<dyn Read + '_>> {
        let data = self
            .get(locator)
            .ok_or_else(|| Error::NotFound(locator.clone()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn stat(&self, locator: &String) -> Result<FileStat> {
        let inner = self.inner.lock();
        let file = inner
            .files
            .get(locator)
            .ok_or_else(|| Error::NotFound(locator.clone()))?;
        Ok(FileStat {
            modified: Self::modified_at(file.version),
            size: file.data.len() as u64,
        })
    }

    fn write_full(&self, locator: &String, bytes: &[u8]) -> Result<VersionToken> {
        if locator.is_empty() {
            return Err(Error::InvalidPath(locator.clone()));
        }
        let mut inner = self.inner.lock();
        let version = inner.tick();
        inner.files.insert(
            locator.clone(),
            MemoryFile {
                data: bytes.to_vec(),
                version,
            },
        );
        log::debug!("Wrote {} bytes to memory file {}", bytes.len(), locator);
        Ok(VersionToken(version.to_string()))
    }
}
