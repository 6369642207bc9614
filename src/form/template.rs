//! Blank form spreadsheets.

use super::document::{DATA_SHEET, HEADER_ROWS};
use super::{FieldKind, ViewMode, parse_choices};
use crate::common::xml::escape_xml;
use crate::common::{Error, Result};
use crate::odf::ods::write_rows;
use crate::odf::{CellValue, ODS_MIME_TYPE, PackageWriter, Sheet};
use std::collections::HashSet;
use std::path::Path;

const HEADER_LABELS: [&str; HEADER_ROWS] = ["Field", "Type", "Parameters", "Description"];

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" office:version="1.3"><office:styles><style:default-style style:family="table-cell"><style:paragraph-properties fo:text-align="start"/></style:default-style><style:style style:name="Default" style:family="table-cell"/></office:styles></office:document-styles>"#;

#[derive(Debug, Clone)]
struct TemplateField {
    label: String,
    kind: FieldKind,
    required: bool,
    params: Option<String>,
    description: Option<String>,
}

/// Builder for a new, empty form spreadsheet.
///
/// # Examples
///
/// ```no_run
/// use seafform::form::{FieldKind, FormTemplate, ViewMode};
///
/// # fn main() -> seafform::Result<()> {
/// FormTemplate::new("Summer party")
///     .description("Tell us if you come")
///     .view_mode(ViewMode::Table)
///     .field("Name", FieldKind::Text, true, None, None)
///     .field("Dish", FieldKind::List, false, Some("salad, cake, drinks"), None)
///     .field("Coming", FieldKind::BooleanDefaultTrue, false, None, None)
///     .save("party.ods")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FormTemplate {
    title: String,
    description: String,
    view_mode: ViewMode,
    allow_edit: bool,
    fields: Vec<TemplateField>,
}

impl FormTemplate {
    /// A form with no fields, shown as a table, without editing.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            view_mode: ViewMode::Table,
            allow_edit: false,
            fields: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn view_mode(mut self, view_mode: ViewMode) -> Self {
        self.view_mode = view_mode;
        self
    }

    pub fn allow_edit(mut self, allow_edit: bool) -> Self {
        self.allow_edit = allow_edit;
        self
    }

    /// Append a field column.
    pub fn field(
        mut self,
        label: impl Into<String>,
        kind: FieldKind,
        required: bool,
        params: Option<&str>,
        description: Option<&str>,
    ) -> Self {
        self.fields.push(TemplateField {
            label: label.into(),
            kind,
            required,
            params: params.map(str::to_string),
            description: description.map(str::to_string),
        });
        self
    }

    fn check(&self) -> Result<()> {
        let mut labels = HashSet::new();
        for field in &self.fields {
            let label = field.label.trim();
            if label.is_empty() {
                return Err(Error::InvalidSchema("field without a name".to_string()));
            }
            if !labels.insert(label) {
                return Err(Error::InvalidSchema(format!("duplicate field {:?}", label)));
            }
            if field.kind == FieldKind::List
                && parse_choices(field.params.as_deref().unwrap_or_default()).is_empty()
            {
                return Err(Error::InvalidSchema(format!(
                    "list field {:?} has no choices",
                    label
                )));
            }
        }
        Ok(())
    }

    fn data_sheet(&self) -> Result<Sheet> {
        let mut sheet = Sheet::new(DATA_SHEET);
        for (row, label) in HEADER_LABELS.into_iter().enumerate() {
            put(&mut sheet, row, 0, label)?;
        }
        put(&mut sheet, 5, 0, "Title")?;
        put(&mut sheet, 6, 0, &self.title)?;
        put(&mut sheet, 7, 0, "Description")?;
        put(&mut sheet, 8, 0, &self.description)?;
        put(&mut sheet, 9, 0, "View")?;
        put(&mut sheet, 10, 0, self.view_mode.token())?;
        put(&mut sheet, 11, 0, "Edit")?;
        put(&mut sheet, 12, 0, if self.allow_edit { "yes" } else { "no" })?;

        for (i, field) in self.fields.iter().enumerate() {
            let col = i + 1;
            let required = field.required && field.kind != FieldKind::Static;
            let kind = format!("{}{}", field.kind.token(), if required { "*" } else { "" });
            put(&mut sheet, 0, col, field.label.trim())?;
            put(&mut sheet, 1, col, &kind)?;
            put(&mut sheet, 2, col, field.params.as_deref().unwrap_or_default())?;
            put(&mut sheet, 3, col, field.description.as_deref().unwrap_or_default())?;
        }
        Ok(sheet)
    }

    fn content_xml(&self) -> Result<String> {
        let sheet = self.data_sheet()?;
        let mut out = String::with_capacity(2048);
        out.push_str(
            r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" office:version="1.3"><office:font-face-decls/><office:automatic-styles/><office:body><office:spreadsheet>"#,
        );
        out.push_str(&format!(
            r#"<table:table table:name="{}"><table:table-column table:number-columns-repeated="{}"/>"#,
            escape_xml(DATA_SHEET),
            self.fields.len() + 1
        ));
        write_rows(&mut out, &sheet);
        out.push_str("</table:table></office:spreadsheet></office:body></office:document-content>");
        Ok(out)
    }

    fn meta_xml(&self) -> String {
        let now = chrono::Utc::now().to_rfc3339();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><office:document-meta xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:meta="urn:oasis:names:tc:opendocument:xmlns:meta:1.0" office:version="1.3"><office:meta><meta:generator>seafform/{}</meta:generator><meta:creation-date>{}</meta:creation-date><dc:date>{}</dc:date><dc:title>{}</dc:title></office:meta></office:document-meta>"#,
            env!("CARGO_PKG_VERSION"),
            now,
            now,
            escape_xml(&self.title)
        )
    }

    /// Build the spreadsheet.
    ///
    /// Fails with [`Error::InvalidSchema`] for a field without a name, two
    /// fields with the same name, or a `list` field without choices.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.check()?;

        let mut writer = PackageWriter::new();
        writer.set_mimetype(ODS_MIME_TYPE)?;
        writer.add_file("content.xml", self.content_xml()?.as_bytes())?;
        writer.add_file("styles.xml", STYLES_XML.as_bytes())?;
        writer.add_file("meta.xml", self.meta_xml().as_bytes())?;
        writer.finish_to_bytes()
    }

    /// Build the spreadsheet and write it to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Write a string cell; empty strings leave the cell empty.
fn put(sheet: &mut Sheet, row: usize, col: usize, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    sheet.set_value(row, col, CellValue::Text(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odf::Spreadsheet;

    #[test]
    fn test_layout() {
        let bytes = FormTemplate::new("Party & co")
            .allow_edit(true)
            .field("Name", FieldKind::Text, true, None, Some("Your name"))
            .field("Fee", FieldKind::Static, true, Some("10"), None)
            .to_bytes()
            .unwrap();

        let spreadsheet = Spreadsheet::from_bytes(&bytes).unwrap();
        let sheet = spreadsheet.sheet_by_name(DATA_SHEET).unwrap();
        assert_eq!(sheet.text(6, 0), "Party & co");
        assert_eq!(sheet.text(10, 0), "table");
        assert_eq!(sheet.text(12, 0), "yes");
        assert_eq!(sheet.text(0, 1), "Name");
        assert_eq!(sheet.text(1, 1), "text*");
        assert_eq!(sheet.text(3, 1), "Your name");
        assert_eq!(sheet.text(1, 2), "static");
        assert_eq!(sheet.text(2, 2), "10");
        assert!(sheet.is_empty_at(HEADER_ROWS, 1));
    }

    #[test]
    fn test_rejects_bad_fields() {
        let duplicate = FormTemplate::new("x")
            .field("A", FieldKind::Text, false, None, None)
            .field(" A", FieldKind::Number, false, None, None);
        assert!(matches!(duplicate.to_bytes(), Err(Error::InvalidSchema(_))));

        let no_choices = FormTemplate::new("x").field("C", FieldKind::List, false, Some(","), None);
        assert!(no_choices.to_bytes().is_err());

        let unnamed = FormTemplate::new("x").field("  ", FieldKind::Text, false, None, None);
        assert!(unnamed.to_bytes().is_err());
    }
}
