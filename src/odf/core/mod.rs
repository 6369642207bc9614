//! Core ODF package functionality.
//!
//! Reading an ODF file as an in-memory ZIP package and writing packages back,
//! either from scratch (new form templates) or by re-packing an existing
//! package with some members replaced.
//!
//! # References
//! - ODF Specification: §2 (Documents), Part 3 (Packages)
//! - ZIP format: PKZIP Application Note

/// ODF package handling
mod package;
/// ODF package writing
mod writer;

pub use package::{Package, PackageEntry};
pub use writer::PackageWriter;
