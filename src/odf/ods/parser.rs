//! ODS-specific parsing utilities.

use super::sheet::{MAX_COLUMNS, MAX_ROWS};
use super::{Cell, CellValue, Row, Sheet};
use crate::common::xml::{resolve_reference, unescape_xml};
use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parser for ODS-specific structures.
///
/// Parses every `table:table` of a `content.xml` into a [`Sheet`] and records
/// the byte range its row elements occupy, so a modified sheet can later be
/// spliced back into the untouched document.
pub(crate) struct OdsParser;

impl OdsParser {
    /// Parse all sheets from ODS content.xml
    pub fn parse_sheets(xml_content: &str) -> Result<Vec<Sheet>> {
        let mut reader = Reader::from_str(xml_content);
        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        // Parser state
        let mut current_sheet: Option<SheetBuilder> = None;
        let mut current_row: Option<RowBuilder> = None;
        let mut current_cell: Option<CellBuilder> = None;

        loop {
            let before = reader.buffer_position() as usize;
            let event = reader.read_event_into(&mut buf)?;
            let after = reader.buffer_position() as usize;

            // Everything inside a cell belongs to the cell, nested tables included.
            if let Some(cell) = current_cell.as_mut() {
                match event {
                    Event::End(ref e)
                        if cell.depth == 0
                            && matches!(
                                e.name().as_ref(),
                                b"table:table-cell" | b"table:covered-table-cell"
                            ) =>
                    {
                        if let Some(cell) = current_cell.take() {
                            let inner = &xml_content[cell.inner_start..before];
                            let (cell, repeated) = cell.build(Some(inner))?;
                            if let Some(row) = current_row.as_mut() {
                                row.add_cell(cell, repeated)?;
                            }
                        }
                    },
                    Event::Start(ref e) => cell.start_child(e),
                    Event::End(ref e) => cell.end_child(e.name().as_ref()),
                    Event::Empty(ref e) => cell.empty_child(e)?,
                    Event::Text(ref t) => cell.push_text(&String::from_utf8_lossy(t)),
                    Event::CData(ref t) => cell.push_text(&String::from_utf8_lossy(t)),
                    Event::GeneralRef(ref r) => {
                        let name = String::from_utf8_lossy(r);
                        match resolve_reference(&name) {
                            Some(ch) => cell.push_text(ch.encode_utf8(&mut [0; 4])),
                            None => cell.push_text(&format!("&{};", name)),
                        }
                    },
                    Event::Eof => {
                        return Err(Error::InvalidFormat(
                            "Unexpected end of content.xml inside a cell".to_string(),
                        ));
                    },
                    _ => {},
                }
                buf.clear();
                continue;
            }

            match event {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"table:table" => {
                        let name = Self::extract_table_name(e)?;
                        current_sheet = Some(SheetBuilder::new(name));
                    },
                    b"table:table-row" => {
                        if let Some(sheet) = current_sheet.as_mut() {
                            sheet.mark_rows(before, after);
                            current_row = Some(RowBuilder::from_start(e)?);
                        }
                    },
                    b"table:table-header-rows" | b"table:table-rows" | b"table:table-row-group" => {
                        if let Some(sheet) = current_sheet.as_mut() {
                            sheet.mark_rows(before, after);
                        }
                    },
                    b"table:table-cell" | b"table:covered-table-cell" => {
                        if current_row.is_some() {
                            let covered = e.name().as_ref() == b"table:covered-table-cell";
                            current_cell = Some(CellBuilder::from_start(e, covered, after)?);
                        }
                    },
                    _ => {},
                },
                Event::Empty(ref e) => match e.name().as_ref() {
                    b"table:table" => {
                        // A self-closing table has nowhere to splice rows into.
                        let name = Self::extract_table_name(e)?;
                        sheets.push(Sheet::new(name));
                    },
                    b"table:table-row" => {
                        if let Some(sheet) = current_sheet.as_mut() {
                            sheet.mark_rows(before, after);
                            let (row, repeated) = RowBuilder::from_start(e)?.build();
                            sheet.add_row(row, repeated)?;
                        }
                    },
                    b"table:table-cell" | b"table:covered-table-cell" => {
                        if let Some(row) = current_row.as_mut() {
                            let covered = e.name().as_ref() == b"table:covered-table-cell";
                            let (cell, repeated) =
                                CellBuilder::from_start(e, covered, after)?.build(None)?;
                            row.add_cell(cell, repeated)?;
                        }
                    },
                    _ => {},
                },
                Event::End(ref e) => match e.name().as_ref() {
                    b"table:table-row" => {
                        if let (Some(row), Some(sheet)) = (current_row.take(), current_sheet.as_mut()) {
                            let (row, repeated) = row.build();
                            sheet.add_row(row, repeated)?;
                            sheet.mark_rows(before, after);
                        }
                    },
                    b"table:table-header-rows" | b"table:table-rows" | b"table:table-row-group" => {
                        if let Some(sheet) = current_sheet.as_mut() {
                            sheet.mark_rows(before, after);
                        }
                    },
                    b"table:table" => {
                        if let Some(sheet) = current_sheet.take() {
                            sheets.push(sheet.build(before));
                        }
                    },
                    _ => {},
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Extract table name from table:table element
    fn extract_table_name(e: &BytesStart) -> Result<String> {
        for attr in e.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == b"table:name" {
                return Ok(unescape_xml(&String::from_utf8_lossy(&attr.value)));
            }
        }
        Ok("Sheet1".to_string()) // Default name
    }
}

/// Raw attributes of an element, minus the repeat attribute, which is
/// returned separately.
fn split_attributes(e: &BytesStart, repeat_key: &[u8]) -> Result<(Vec<(String, String)>, usize)> {
    let mut attributes = Vec::new();
    let mut repeated = 1;
    for attr in e.attributes() {
        let attr = attr?;
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        if attr.key.as_ref() == repeat_key {
            repeated = value.trim().parse::<usize>().unwrap_or(1).max(1);
        } else {
            attributes.push((String::from_utf8_lossy(attr.key.as_ref()).into_owned(), value));
        }
    }
    Ok((attributes, repeated))
}

/// Builder for constructing Sheet during parsing
struct SheetBuilder {
    name: String,
    rows: Vec<Row>,
    pending_blank: Option<(Row, usize)>,
    rows_start: Option<usize>,
    rows_end: Option<usize>,
}

impl SheetBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            rows: Vec::new(),
            pending_blank: None,
            rows_start: None,
            rows_end: None,
        }
    }

    /// Extend the recorded row span with an element at `start..end`.
    fn mark_rows(&mut self, start: usize, end: usize) {
        self.rows_start.get_or_insert(start);
        self.rows_end = Some(end);
    }

    /// Blank rows are held back: only a run that turns out to be trailing
    /// stays unexpanded.
    fn add_row(&mut self, row: Row, repeated: usize) -> Result<()> {
        if let Some((blank, count)) = self.pending_blank.take() {
            self.expand(blank, count)?;
        }
        if row.is_blank() {
            self.pending_blank = Some((row, repeated));
            Ok(())
        } else {
            self.expand(row, repeated)
        }
    }

    fn expand(&mut self, row: Row, repeated: usize) -> Result<()> {
        if self.rows.len() + repeated > MAX_ROWS {
            return Err(Error::InvalidFormat(format!(
                "Sheet '{}' has more than {} rows",
                self.name, MAX_ROWS
            )));
        }
        for _ in 1..repeated {
            self.rows.push(row.clone());
        }
        self.rows.push(row);
        Ok(())
    }

    /// `table_end` is the offset of `</table:table>`; a table without rows
    /// gets an empty span there.
    fn build(self, table_end: usize) -> Sheet {
        let span = match (self.rows_start, self.rows_end) {
            (Some(start), Some(end)) => start..end,
            _ => table_end..table_end,
        };
        Sheet {
            name: self.name,
            rows: self.rows,
            padding: self.pending_blank,
            span: Some(span),
            modified: false,
        }
    }
}

/// Builder for constructing Row during parsing
struct RowBuilder {
    cells: Vec<Cell>,
    attributes: Vec<(String, String)>,
    repeated: usize,
    pending_blank: Option<(Cell, usize)>,
}

impl RowBuilder {
    fn from_start(e: &BytesStart) -> Result<Self> {
        let (attributes, repeated) = split_attributes(e, b"table:number-rows-repeated")?;
        Ok(Self {
            cells: Vec::new(),
            attributes,
            repeated,
            pending_blank: None,
        })
    }

    fn add_cell(&mut self, cell: Cell, repeated: usize) -> Result<()> {
        if let Some((blank, count)) = self.pending_blank.take() {
            self.expand(blank, count)?;
        }
        if cell.is_blank() {
            self.pending_blank = Some((cell, repeated));
            Ok(())
        } else {
            self.expand(cell, repeated)
        }
    }

    fn expand(&mut self, cell: Cell, repeated: usize) -> Result<()> {
        if self.cells.len() + repeated > MAX_COLUMNS {
            return Err(Error::InvalidFormat(format!(
                "Row has more than {} columns",
                MAX_COLUMNS
            )));
        }
        for _ in 1..repeated {
            self.cells.push(cell.clone());
        }
        self.cells.push(cell);
        Ok(())
    }

    fn build(self) -> (Row, usize) {
        let row = Row {
            cells: self.cells,
            attributes: self.attributes,
            padding: self.pending_blank,
        };
        (row, self.repeated)
    }
}

/// Builder for constructing Cell during parsing
struct CellBuilder {
    attributes: Vec<(String, String)>,
    repeated: usize,
    covered: bool,
    /// Offset of the first byte after the start tag
    inner_start: usize,
    /// Nesting depth of open child elements
    depth: usize,
    /// Depth of the enclosing `office:annotation`, 0 outside of one
    annotation_depth: usize,
    in_paragraph: bool,
    paragraphs: Vec<String>,
}

impl CellBuilder {
    fn from_start(e: &BytesStart, covered: bool, inner_start: usize) -> Result<Self> {
        let (attributes, repeated) = split_attributes(e, b"table:number-columns-repeated")?;
        Ok(Self {
            attributes,
            repeated,
            covered,
            inner_start,
            depth: 0,
            annotation_depth: 0,
            in_paragraph: false,
            paragraphs: Vec::new(),
        })
    }

    fn in_visible_text(&self) -> bool {
        self.in_paragraph && self.annotation_depth == 0
    }

    fn start_child(&mut self, e: &BytesStart) {
        self.depth += 1;
        match e.name().as_ref() {
            b"office:annotation" if self.annotation_depth == 0 => {
                self.annotation_depth = self.depth;
            },
            b"text:p" | b"text:h" if self.annotation_depth == 0 => {
                self.paragraphs.push(String::new());
                self.in_paragraph = true;
            },
            _ => {},
        }
    }

    fn end_child(&mut self, name: &[u8]) {
        if self.depth == self.annotation_depth {
            self.annotation_depth = 0;
        } else if matches!(name, b"text:p" | b"text:h") && self.annotation_depth == 0 {
            self.in_paragraph = false;
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn empty_child(&mut self, e: &BytesStart) -> Result<()> {
        match e.name().as_ref() {
            b"text:p" | b"text:h" if self.annotation_depth == 0 => {
                self.paragraphs.push(String::new());
            },
            b"text:s" if self.in_visible_text() => {
                let mut count = 1;
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.as_ref() == b"text:c" {
                        count = String::from_utf8_lossy(&attr.value)
                            .trim()
                            .parse::<usize>()
                            .unwrap_or(1);
                    }
                }
                let spaces = " ".repeat(count);
                self.push_text(&spaces);
            },
            b"text:tab" => self.push_text("\t"),
            b"text:line-break" => self.push_text("\n"),
            _ => {},
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        if !self.in_visible_text() {
            return;
        }
        if let Some(paragraph) = self.paragraphs.last_mut() {
            paragraph.push_str(text);
        }
    }

    fn attribute(&self, key: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| unescape_xml(v))
    }

    fn build(self, inner: Option<&str>) -> Result<(Cell, usize)> {
        let text = self.paragraphs.join("\n");
        let value = self.parse_value(&text);
        let formula = self.attribute("table:formula");
        let inner_xml = inner.filter(|xml| !xml.is_empty()).map(str::to_string);

        let cell = Cell {
            value,
            text,
            formula,
            attributes: self.attributes,
            inner_xml,
            covered: self.covered,
        };
        Ok((cell, self.repeated))
    }

    fn parse_value(&self, text_content: &str) -> CellValue {
        let value_type = self
            .attribute("office:value-type")
            .or_else(|| self.attribute("calcext:value-type"));
        let number = || {
            self.attribute("office:value")
                .and_then(|v| v.trim().parse::<f64>().ok())
        };
        let fallback = || {
            if text_content.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(text_content.to_string())
            }
        };

        match value_type.as_deref() {
            Some("float") => number().map_or_else(fallback, CellValue::Number),
            Some("percentage") => number().map_or_else(fallback, CellValue::Percentage),
            Some("currency") => match number() {
                Some(n) => CellValue::Currency(n, self.attribute("office:currency").unwrap_or_default()),
                None => fallback(),
            },
            Some("boolean") => match self.attribute("office:boolean-value").as_deref() {
                Some("true") => CellValue::Boolean(true),
                Some("false") => CellValue::Boolean(false),
                _ => fallback(),
            },
            Some("date") => self
                .attribute("office:date-value")
                .map_or_else(fallback, CellValue::Date),
            Some("time") => self
                .attribute("office:time-value")
                .map_or_else(fallback, CellValue::Time),
            Some("string") => CellValue::Text(
                self.attribute("office:string-value")
                    .unwrap_or_else(|| text_content.to_string()),
            ),
            _ => fallback(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"><office:body><office:spreadsheet><table:table table:name="Data"><table:table-column table:number-columns-repeated="3"/><table:table-row table:style-name="ro1"><table:table-cell office:value-type="string"><text:p>Name &amp; title</text:p></table:table-cell><table:table-cell office:value-type="float" office:value="42"><text:p>42</text:p></table:table-cell><table:table-cell table:number-columns-repeated="1022"/></table:table-row><table:table-row><table:table-cell><office:annotation><text:p>note</text:p></office:annotation></table:table-cell><table:table-cell office:value-type="date" office:date-value="2015-09-20"><text:p>20/09/15</text:p></table:table-cell><table:covered-table-cell/><table:table-cell office:value-type="string"><text:p>a<text:s text:c="2"/>b</text:p><text:p>c</text:p></table:table-cell></table:table-row><table:table-row table:number-rows-repeated="1048574"><table:table-cell table:number-columns-repeated="1024"/></table:table-row></table:table><table:table table:name="Empty"/></office:spreadsheet></office:body></office:document-content>"#;

    #[test]
    fn test_parse_values_and_text() {
        let sheets = OdsParser::parse_sheets(CONTENT).unwrap();
        assert_eq!(sheets.len(), 2);

        let data = &sheets[0];
        assert_eq!(data.name(), "Data");
        assert_eq!(data.text(0, 0), "Name & title");
        assert_eq!(data.value(0, 1), &CellValue::Number(42.0));
        assert_eq!(data.value(1, 1), &CellValue::Date("2015-09-20".to_string()));
        assert_eq!(data.text(1, 3), "a  b\nc");
        assert!(data.cell(1, 2).unwrap().covered);
    }

    #[test]
    fn test_annotations_are_not_cell_text() {
        let sheets = OdsParser::parse_sheets(CONTENT).unwrap();
        let cell = sheets[0].cell(1, 0).unwrap();
        assert_eq!(cell.text(), "");
        assert!(cell.is_empty());
        assert!(cell.inner_xml.as_deref().unwrap().contains("office:annotation"));
    }

    #[test]
    fn test_trailing_repeats_stay_compact() {
        let sheets = OdsParser::parse_sheets(CONTENT).unwrap();
        let data = &sheets[0];
        assert_eq!(data.row_count(), 2);
        assert_eq!(data.column_count(), 4);
        assert_eq!(data.padding.as_ref().map(|(_, n)| *n), Some(1_048_574));
        assert_eq!(data.rows[0].width(), 1024);
    }

    #[test]
    fn test_row_span_covers_rows_only() {
        let sheets = OdsParser::parse_sheets(CONTENT).unwrap();
        let span = sheets[0].span.clone().unwrap();
        let rows_xml = &CONTENT[span];
        assert!(rows_xml.starts_with("<table:table-row table:style-name=\"ro1\">"));
        assert!(rows_xml.ends_with("</table:table-row>"));
        assert!(sheets[1].span.is_none());
    }

    #[test]
    fn test_too_many_rows() {
        let xml = r#"<table:table table:name="Big"><table:table-row table:number-rows-repeated="2000000"><table:table-cell office:value-type="float" office:value="1"/></table:table-row></table:table>"#;
        assert!(matches!(
            OdsParser::parse_sheets(xml),
            Err(Error::InvalidFormat(_))
        ));
    }
}
