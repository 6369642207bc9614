//! seafform - Publish OpenDocument spreadsheets as forms
//!
//! A form is an ODS spreadsheet: the header of its `Data` sheet declares the
//! fields, every row below it is one submission. This crate reads such a
//! spreadsheet into a typed schema plus rows, appends or replaces rows, and
//! writes the file back without disturbing anything it did not change
//! (other sheets, styles, annotation columns).
//!
//! # Features
//!
//! - **Form engine**: schema parsing, row decoding, freshness check and
//!   commit ([`form::FormDocument`])
//! - **Input validation**: raw strings to typed values with per-field errors
//!   ([`form::validate`])
//! - **Templates**: new, correctly laid out form spreadsheets
//!   ([`form::FormTemplate`])
//! - **ODS grid**: structure-preserving spreadsheet editing ([`odf`])
//! - **Storage backends**: local files, memory, and Seafile libraries with
//!   the `seafile` feature ([`storage`])
//!
//! # Example - Posting to a local form
//!
//! ```no_run
//! use seafform::form::{FormDocument, FormValue, Values};
//! use seafform::storage::LocalStorage;
//!
//! # fn main() -> seafform::Result<()> {
//! let mut form = FormDocument::open(LocalStorage, "party.ods".into())?;
//! for field in form.fields()? {
//!     println!("{} ({})", field.label, field.kind.token());
//! }
//!
//! let mut values = Values::new();
//! values.insert("Name".to_string(), FormValue::from("Alice"));
//! let row = form.post(&values, None)?;
//! println!("written to row {}", row + 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - A form in memory
//!
//! ```
//! use seafform::form::{FieldKind, FormDocument, FormTemplate, FormValue, Values};
//! use seafform::storage::MemoryStorage;
//!
//! # fn main() -> seafform::Result<()> {
//! let bytes = FormTemplate::new("Party")
//!     .field("Name", FieldKind::Text, true, None, None)
//!     .field("Agree", FieldKind::Boolean, false, None, None)
//!     .to_bytes()?;
//! let storage = MemoryStorage::new();
//! storage.insert("party.ods", bytes);
//!
//! let mut form = FormDocument::open(&storage, "party.ods".to_string())?;
//! let mut values = Values::new();
//! values.insert("Name".to_string(), FormValue::from("Alice"));
//! let row = form.post(&values, None)?;
//!
//! let stored = form.get_row_as_mapping(row)?;
//! assert_eq!(stored["Name"], FormValue::from("Alice"));
//! assert_eq!(stored["Agree"], FormValue::Bool(false));
//! # Ok(())
//! # }
//! ```

/// Common types shared by every module
pub mod common;

/// Configuration file
pub mod config;

/// Spreadsheet-backed forms
pub mod form;

/// OpenDocument package and spreadsheet grid
pub mod odf;

/// Where form spreadsheets are stored
pub mod storage;

pub use common::{Error, Result};
pub use form::{FormDocument, FormValue, Values};
pub use storage::Storage;
