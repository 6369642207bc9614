//! Storage backends holding form spreadsheets.
//!
//! A form only needs three things from wherever its spreadsheet lives: read
//! the whole file, learn when it last changed, and replace it wholesale.
//! [`Storage`] captures exactly that; each backend picks its own way of
//! addressing files through [`Storage::Locator`].
//!
//! | Backend | Locator |
//! |---------|---------|
//! | [`LocalStorage`] | [`std::path::PathBuf`] |
//! | [`MemoryStorage`] | [`String`] |
//! | `SeafileStorage` (feature `seafile`) | `SeafilePath` |

mod local;
mod memory;
#[cfg(feature = "seafile")]
mod seafile;

pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "seafile")]
pub use seafile::{SeafilePath, SeafileStorage};

use crate::common::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// What a backend knows about a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Last modification time
    pub modified: DateTime<Utc>,
    /// Size in bytes
    pub size: u64,
}

/// Backend-specific identifier of the version produced by a write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken(pub String);

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for spreadsheet storage backends.
///
/// Errors use the crate taxonomy: a missing file is
/// [`Error::NotFound`](crate::Error::NotFound), a refused access
/// [`Error::PermissionDenied`](crate::Error::PermissionDenied), a malformed
/// locator [`Error::InvalidPath`](crate::Error::InvalidPath).
pub trait Storage {
    /// How a file is addressed in this backend.
    type Locator: Clone + fmt::Debug;

    /// Open the whole file for reading.
    fn open_read(&self, locator: &Self::Locator) -> Result<Box<dyn Read + '_>>;

    /// Modification time and size of the file.
    fn stat(&self, locator: &Self::Locator) -> Result<FileStat>;

    /// Replace the whole file with `bytes`.
    fn write_full(&self, locator: &Self::Locator, bytes: &[u8]) -> Result<VersionToken>;
}

impl<S: Storage + ?Sized> Storage for &S {
    type Locator = S::Locator;

    fn open_read(&self, locator: &Self::Locator) -> Result<Box<dyn Read + '_>> {
        (**self).open_read(locator)
    }

    fn stat(&self, locator: &Self::Locator) -> Result<FileStat> {
        (**self).stat(locator)
    }

    fn write_full(&self, locator: &Self::Locator, bytes: &[u8]) -> Result<VersionToken> {
        (**self).write_full(locator, bytes)
    }
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    type Locator = S::Locator;

    fn open_read(&self, locator: &Self::Locator) -> Result<Box<dyn Read + '_>> {
        (**self).open_read(locator)
    }

    fn stat(&self, locator: &Self::Locator) -> Result<FileStat> {
        (**self).stat(locator)
    }

    fn write_full(&self, locator: &Self::Locator, bytes: &[u8]) -> Result<VersionToken> {
        (**self).write_full(locator, bytes)
    }
}
