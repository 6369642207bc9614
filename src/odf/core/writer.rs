//! ODF package writing functionality.
//!
//! This module provides utilities for creating and writing ODF files as ZIP archives,
//! including generating manifests and proper file structure.

use super::package::PackageEntry;
use crate::common::xml::escape_xml;
use crate::common::{Error, Result};
use std::io::{Cursor, Seek, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

/// Builder for creating ODF packages (ZIP archives)
///
/// The `mimetype` member is written first and uncompressed, as ODF readers
/// require. Files added with [`PackageWriter::add_file`] get a manifest entry
/// generated at [`PackageWriter::finish`]; an existing package copied with
/// [`PackageWriter::copy_entry`] keeps its own manifest.
///
/// # Examples
///
/// ```no_run
/// # use seafform::odf::PackageWriter;
/// # fn example() -> seafform::Result<()> {
/// let mut writer = PackageWriter::new();
/// writer.set_mimetype("application/vnd.oasis.opendocument.spreadsheet")?;
/// writer.add_file("content.xml", b"<office:document-content>...</office:document-content>")?;
///
/// let bytes = writer.finish_to_bytes()?;
/// std::fs::write("form.ods", bytes)?;
/// # Ok(())
/// # }
/// ```
pub struct PackageWriter<W: Write + Seek> {
    zip_writer: ZipWriter<W>,
    mimetype: Option<String>,
    manifest_entries: Vec<ManifestEntry>,
    has_manifest: bool,
}

/// Entry in the ODF manifest
#[derive(Debug, Clone)]
struct ManifestEntry {
    full_path: String,
    media_type: String,
}

impl PackageWriter<Cursor<Vec<u8>>> {
    /// Create a new package writer that writes to memory
    pub fn new() -> Self {
        Self::with_writer(Cursor::new(Vec::new()))
    }

    /// Finish writing and return the bytes
    pub fn finish_to_bytes(self) -> Result<Vec<u8>> {
        let cursor = self.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for PackageWriter<Cursor<Vec<u8>>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Seek> PackageWriter<W> {
    /// Create a new package writer with a custom writer
    pub fn with_writer(writer: W) -> Self {
        Self {
            zip_writer: ZipWriter::new(writer),
            mimetype: None,
            manifest_entries: Vec::new(),
            has_manifest: false,
        }
    }

    /// Set the MIME type for the document and write the `mimetype` member.
    ///
    /// Must be called before any other member is added.
    pub fn set_mimetype(&mut self, mimetype: &str) -> Result<()> {
        if self.mimetype.is_some() {
            return Err(Error::InvalidFormat("MIME type already set".to_string()));
        }

        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        self.zip_writer.start_file("mimetype", options)?;
        self.zip_writer.write_all(mimetype.as_bytes())?;

        self.mimetype = Some(mimetype.to_string());
        self.manifest_entries.push(ManifestEntry {
            full_path: "/".to_string(),
            media_type: mimetype.to_string(),
        });

        Ok(())
    }

    /// Add a file to the package and record it in the generated manifest.
    ///
    /// # Arguments
    ///
    /// * `path` - Path within the ZIP archive (e.g., "content.xml", "Pictures/image1.png")
    /// * `content` - File content as bytes
    pub fn add_file(&mut self, path: &str, content: &[u8]) -> Result<()> {
        self.require_mimetype()?;

        self.manifest_entries.push(ManifestEntry {
            full_path: path.to_string(),
            media_type: Self::guess_media_type(path).to_string(),
        });

        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        self.zip_writer.start_file(path, options)?;
        self.zip_writer.write_all(content)?;

        Ok(())
    }

    /// Copy a member from an existing package, keeping its compression mode.
    ///
    /// No manifest entry is generated; copying `META-INF/manifest.xml` itself
    /// suppresses manifest generation at [`PackageWriter::finish`].
    pub fn copy_entry(&mut self, entry: &PackageEntry) -> Result<()> {
        self.require_mimetype()?;

        let method = if entry.stored {
            zip::CompressionMethod::Stored
        } else {
            zip::CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default().compression_method(method);

        if entry.is_dir {
            self.zip_writer.add_directory(entry.name.as_str(), options)?;
        } else {
            self.zip_writer.start_file(entry.name.as_str(), options)?;
            self.zip_writer.write_all(&entry.data)?;
        }

        if entry.name == "META-INF/manifest.xml" {
            self.has_manifest = true;
        }
        Ok(())
    }

    /// Finish writing the package and return the underlying writer.
    ///
    /// Writes a generated `META-INF/manifest.xml` unless one was copied in.
    pub fn finish(mut self) -> Result<W> {
        self.require_mimetype()?;

        if !self.has_manifest {
            let manifest_content = self.generate_manifest();
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            self.zip_writer.start_file("META-INF/manifest.xml", options)?;
            self.zip_writer.write_all(manifest_content.as_bytes())?;
        }

        let writer = self.zip_writer.finish()?;
        Ok(writer)
    }

    fn require_mimetype(&self) -> Result<()> {
        match self.mimetype {
            Some(_) => Ok(()),
            None => Err(Error::InvalidFormat("MIME type not set".to_string())),
        }
    }

    /// Generate the manifest.xml content
    fn generate_manifest(&self) -> String {
        let mut manifest = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.3">
"#,
        );

        for entry in &self.manifest_entries {
            manifest.push_str(&format!(
                r#"  <manifest:file-entry manifest:full-path="{}" manifest:media-type="{}"/>
"#,
                escape_xml(&entry.full_path),
                escape_xml(&entry.media_type)
            ));
        }

        manifest.push_str("</manifest:manifest>\n");
        manifest
    }

    /// Guess media type from file path
    fn guess_media_type(path: &str) -> &'static str {
        if path.ends_with(".xml") {
            "text/xml"
        } else if path.ends_with(".png") {
            "image/png"
        } else if path.ends_with(".jpg") || path.ends_with(".jpeg") {
            "image/jpeg"
        } else if path.ends_with('/') {
            ""
        } else {
            "application/octet-stream"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_before_mimetype_are_rejected() {
        let mut writer = PackageWriter::new();
        assert!(writer.add_file("content.xml", b"").is_err());
    }

    #[test]
    fn test_generated_manifest_lists_added_files() {
        let mut writer = PackageWriter::new();
        writer
            .set_mimetype("application/vnd.oasis.opendocument.spreadsheet")
            .unwrap();
        writer.add_file("content.xml", b"<x/>").unwrap();
        let manifest = writer.generate_manifest();
        assert!(manifest.contains(r#"manifest:full-path="/""#));
        assert!(manifest.contains(
            r#"manifest:full-path="content.xml" manifest:media-type="text/xml""#
        ));
    }
}
