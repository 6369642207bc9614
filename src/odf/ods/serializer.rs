//! Writing modified sheets back into `content.xml`.
//!
//! Only the row elements of a modified sheet are regenerated; the bytes
//! before and after them (column definitions, other sheets, styles,
//! named ranges) are copied from the original document unchanged.

use super::{Cell, Row, Sheet};
use crate::common::{Error, Result};
use std::fmt::Write as _;

/// Rebuild `content` with the row elements of every modified sheet replaced.
pub(crate) fn splice_sheets(content: &str, sheets: &[Sheet]) -> Result<String> {
    let mut modified = Vec::new();
    for sheet in sheets.iter().filter(|sheet| sheet.modified) {
        let span = sheet.span.clone().ok_or_else(|| {
            Error::InvalidFormat(format!(
                "Sheet '{}' has no row container to write into",
                sheet.name
            ))
        })?;
        modified.push((span, sheet));
    }
    modified.sort_by_key(|(span, _)| span.start);

    let mut out = String::with_capacity(content.len() + 1024);
    let mut last = 0;
    for (span, sheet) in modified {
        out.push_str(&content[last..span.start]);
        write_rows(&mut out, sheet);
        last = span.end;
    }
    out.push_str(&content[last..]);
    Ok(out)
}

/// Serialize the rows of a sheet, merging identical neighbours back into
/// repeated elements.
pub(crate) fn write_rows(out: &mut String, sheet: &Sheet) {
    for (row, count) in runs(&sheet.rows) {
        write_row(out, row, count);
    }
    if let Some((template, count)) = &sheet.padding {
        write_row(out, template, *count);
    }
}

fn write_row(out: &mut String, row: &Row, repeated: usize) {
    out.push_str("<table:table-row");
    write_attributes(out, &row.attributes);
    if repeated > 1 {
        let _ = write!(out, r#" table:number-rows-repeated="{}""#, repeated);
    }
    out.push('>');

    if row.cells.is_empty() && row.padding.is_none() {
        // A row needs at least one cell.
        out.push_str("<table:table-cell/>");
    }
    for (cell, count) in runs(&row.cells) {
        write_cell(out, cell, count);
    }
    if let Some((template, count)) = &row.padding {
        write_cell(out, template, *count);
    }

    out.push_str("</table:table-row>");
}

fn write_cell(out: &mut String, cell: &Cell, repeated: usize) {
    let tag = if cell.covered {
        "table:covered-table-cell"
    } else {
        "table:table-cell"
    };
    out.push('<');
    out.push_str(tag);
    write_attributes(out, &cell.attributes);
    if repeated > 1 {
        let _ = write!(out, r#" table:number-columns-repeated="{}""#, repeated);
    }

    match cell.inner_xml.as_deref() {
        Some(inner) if !inner.is_empty() => {
            out.push('>');
            out.push_str(inner);
            let _ = write!(out, "</{}>", tag);
        },
        _ => out.push_str("/>"),
    }
}

/// Attribute values are kept escaped; only a quote needs care since the
/// source may have used single quotes.
fn write_attributes(out: &mut String, attributes: &[(String, String)]) {
    for (key, value) in attributes {
        let _ = write!(out, r#" {}="{}""#, key, value.replace('"', "&quot;"));
    }
}

/// Group consecutive equal items into `(item, count)` runs.
fn runs<T: PartialEq>(items: &[T]) -> Vec<(&T, usize)> {
    let mut runs: Vec<(&T, usize)> = Vec::new();
    for item in items {
        match runs.last_mut() {
            Some((last, count)) if *last == item => *count += 1,
            _ => runs.push((item, 1)),
        }
    }
    runs
}
