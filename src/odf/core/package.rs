//! ODF package (ZIP archive) handling functionality.
//!
//! A package is read fully into memory: spreadsheets behind a form are small,
//! and keeping every member lets a save re-pack the untouched parts (styles,
//! settings, thumbnails, manifest, ...) byte for byte.

use super::writer::PackageWriter;
use crate::common::{Error, Result};
use std::io::{Cursor, Read};
use zip::CompressionMethod;

/// One member of an ODF package.
#[derive(Debug, Clone)]
pub struct PackageEntry {
    /// Path inside the archive
    pub name: String,
    /// Uncompressed contents
    pub data: Vec<u8>,
    /// Whether the member was stored without compression
    pub stored: bool,
    /// Whether the member is a directory entry
    pub is_dir: bool,
}

/// An ODF package (ZIP file containing XML documents)
pub struct Package {
    entries: Vec<PackageEntry>,
    mimetype: String,
}

impl Package {
    /// Open an ODF package from its raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|_| Error::InvalidFormat("Invalid ZIP archive".to_string()))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let stored = file.compression() == CompressionMethod::Stored;
            let is_dir = file.is_dir();

            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name,
                data,
                stored,
                is_dir,
            });
        }

        let mimetype = entries
            .iter()
            .find(|entry| entry.name == "mimetype")
            .map(|entry| String::from_utf8_lossy(&entry.data).trim().to_string())
            .ok_or_else(|| {
                Error::InvalidFormat("No mimetype file found in ODF package".to_string())
            })?;

        Ok(Self { entries, mimetype })
    }

    /// Get the MIME type from the mimetype file
    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// Get a file from the package by path
    pub fn get_file(&self, path: &str) -> Result<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.name == path)
            .map(|entry| entry.data.as_slice())
            .ok_or_else(|| Error::InvalidFormat(format!("File not found: {}", path)))
    }

    /// Check if a file exists in the package
    pub fn has_file(&self, path: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == path)
    }

    /// List all files in the package, in archive order
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Re-pack the package, substituting the contents of the members named in
    /// `replacements`. Every other member is copied unchanged, with its
    /// original compression mode.
    pub fn to_bytes_with(&self, replacements: &[(&str, &[u8])]) -> Result<Vec<u8>> {
        let mut writer = PackageWriter::new();
        writer.set_mimetype(&self.mimetype)?;

        for entry in self.entries.iter().filter(|entry| entry.name != "mimetype") {
            match replacements.iter().find(|(name, _)| *name == entry.name) {
                Some((_, data)) => writer.copy_entry(&PackageEntry {
                    name: entry.name.clone(),
                    data: data.to_vec(),
                    stored: entry.stored,
                    is_dir: false,
                })?,
                None => writer.copy_entry(entry)?,
            }
        }

        writer.finish_to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_package() -> Vec<u8> {
        let mut writer = PackageWriter::new();
        writer
            .set_mimetype("application/vnd.oasis.opendocument.spreadsheet")
            .unwrap();
        writer.add_file("content.xml", b"<a/>").unwrap();
        writer.add_file("Thumbnails/thumbnail.png", &[1, 2, 3]).unwrap();
        writer.finish_to_bytes().unwrap()
    }

    #[test]
    fn test_reads_members_and_mimetype() {
        let package = Package::from_bytes(&sample_package()).unwrap();
        assert_eq!(
            package.mimetype(),
            "application/vnd.oasis.opendocument.spreadsheet"
        );
        assert_eq!(package.get_file("content.xml").unwrap(), b"<a/>");
        assert!(package.has_file("META-INF/manifest.xml"));
        assert_eq!(package.files().next(), Some("mimetype"));
    }

    #[test]
    fn test_repack_replaces_only_named_member() {
        let package = Package::from_bytes(&sample_package()).unwrap();
        let bytes = package.to_bytes_with(&[("content.xml", &b"<b/>"[..])]).unwrap();

        let repacked = Package::from_bytes(&bytes).unwrap();
        assert_eq!(repacked.get_file("content.xml").unwrap(), b"<b/>");
        assert_eq!(
            repacked.get_file("Thumbnails/thumbnail.png").unwrap(),
            &[1, 2, 3]
        );
        assert_eq!(
            repacked.get_file("META-INF/manifest.xml").unwrap(),
            package.get_file("META-INF/manifest.xml").unwrap()
        );
    }

    #[test]
    fn test_rejects_non_zip() {
        assert!(matches!(
            Package::from_bytes(b"not a zip"),
            Err(Error::InvalidFormat(_))
        ));
    }
}
