//! Spreadsheets shared by the integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const ODS_MIME_TYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" office:version="1.3"><office:styles><style:style style:name="Default" style:family="table-cell"/><style:style style:name="Heading" style:family="table-cell"/></office:styles></office:document-styles>"#;

const MANIFEST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.3">
 <manifest:file-entry manifest:full-path="/" manifest:version="1.3" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>
 <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
 <manifest:file-entry manifest:full-path="styles.xml" manifest:media-type="text/xml"/>
</manifest:manifest>"#;

/// Sheet row with a string in column A and nothing else, padded the way
/// LibreOffice pads rows.
fn label_row(text: &str) -> String {
    format!(
        r#"<table:table-row table:style-name="ro1"><table:table-cell office:value-type="string" calcext:value-type="string"><text:p>{}</text:p></table:table-cell><table:table-cell table:number-columns-repeated="1023"/></table:table-row>"#,
        text
    )
}

fn blank_row() -> &'static str {
    r#"<table:table-row table:style-name="ro1"><table:table-cell table:number-columns-repeated="1024"/></table:table-row>"#
}

fn string_cell(text: &str) -> String {
    format!(
        r#"<table:table-cell office:value-type="string" calcext:value-type="string"><text:p>{}</text:p></table:table-cell>"#,
        text
    )
}

/// `content.xml` of a party form, as saved by LibreOffice.
///
/// | col | B | C | D | E | F |
/// |-----|---|---|---|---|---|
/// | name | Name | Agree | Notes | When | Guests |
/// | kind | text* | check | comment | date | number |
///
/// Column D is an annotation column. Rows 5 and 6 (0-based 4 and 5) hold
/// two submissions; the metadata cells are in column A as usual.
pub fn party_content(view: &str, edit: &str) -> String {
    let mut rows = String::new();
    let header = [
        ("Field", ["Name", "Agree", "Notes", "When", "Guests"]),
        ("Type", ["text*", "check", "comment", "date", "number"]),
    ];
    for (label, cells) in header {
        rows.push_str(r#"<table:table-row table:style-name="ro1">"#);
        rows.push_str(&string_cell(label));
        for cell in cells {
            rows.push_str(&string_cell(cell));
        }
        rows.push_str(r#"<table:table-cell table:number-columns-repeated="1018"/></table:table-row>"#);
    }
    rows.push_str(&label_row("Parameters"));
    rows.push_str(r#"<table:table-row table:style-name="ro1"><table:table-cell office:value-type="string" calcext:value-type="string"><text:p>Description</text:p></table:table-cell><table:table-cell office:value-type="string" calcext:value-type="string"><text:p>Your name</text:p></table:table-cell><table:table-cell table:number-columns-repeated="1022"/></table:table-row>"#);

    // Bob: checked, staff note, a date, three guests.
    rows.push_str(r#"<table:table-row table:style-name="ro2"><table:table-cell/><table:table-cell table:style-name="ce1" office:value-type="string" calcext:value-type="string"><text:p>Bob</text:p></table:table-cell><table:table-cell office:value-type="float" office:value="1" calcext:value-type="float"><text:p>1</text:p></table:table-cell><table:table-cell office:value-type="string" calcext:value-type="string"><text:p>staff note</text:p><office:annotation><dc:creator>Admin</dc:creator><text:p>checked by phone</text:p></office:annotation></table:table-cell><table:table-cell office:value-type="date" office:date-value="2015-09-20" calcext:value-type="date"><text:p>09/20/15</text:p></table:table-cell><table:table-cell office:value-type="float" office:value="3" calcext:value-type="float"><text:p>3</text:p></table:table-cell><table:table-cell table:number-columns-repeated="1018"/></table:table-row>"#);
    // Carol: unchecked, a date typed as text.
    rows.push_str(r#"<table:table-row table:style-name="ro2"><table:table-cell/><table:table-cell table:style-name="ce1" office:value-type="string" calcext:value-type="string"><text:p>Carol</text:p></table:table-cell><table:table-cell table:number-columns-repeated="2"/><table:table-cell office:value-type="string" calcext:value-type="string"><text:p>next tuesday</text:p></table:table-cell><table:table-cell table:number-columns-repeated="1019"/></table:table-row>"#);

    rows.push_str(&label_row("Party"));
    rows.push_str(blank_row());
    rows.push_str(&label_row("Bring something to eat"));
    rows.push_str(blank_row());
    rows.push_str(&label_row(view));
    rows.push_str(blank_row());
    rows.push_str(&label_row(edit));
    rows.push_str(r#"<table:table-row table:style-name="ro1" table:number-rows-repeated="1048563"><table:table-cell table:number-columns-repeated="1024"/></table:table-row>"#);

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:calcext="urn:org:documentfoundation:names:experimental:calc:xmlns:calcext:1.0" office:version="1.3"><office:automatic-styles><style:style style:name="co1" style:family="table-column"><style:table-column-properties style:column-width="0.889in"/></style:style><style:style style:name="ro1" style:family="table-row"><style:table-row-properties style:row-height="0.178in"/></style:style><style:style style:name="ro2" style:family="table-row"><style:table-row-properties style:row-height="0.25in"/></style:style><style:style style:name="ce1" style:family="table-cell" style:parent-style-name="Default"><style:text-properties fo:font-weight="bold"/></style:style></office:automatic-styles><office:body><office:spreadsheet><table:calculation-settings table:automatic-find-labels="false"/><table:table table:name="Data" table:style-name="ta1"><table:table-column table:style-name="co1" table:number-columns-repeated="1024" table:default-cell-style-name="Default"/>{rows}</table:table><table:table table:name="Summary" table:style-name="ta1"><table:table-column table:style-name="co1" table:default-cell-style-name="Default"/><table:table-row table:style-name="ro1"><table:table-cell table:formula="of:=COUNTA([Data.B5:.B1000])" office:value-type="float" office:value="2" calcext:value-type="float"><text:p>2</text:p></table:table-cell></table:table-row></table:table><table:named-expressions/></office:spreadsheet></office:body></office:document-content>"#,
        rows = rows
    )
}

/// The party form with canonical tokens, editing allowed.
pub fn party_form() -> Vec<u8> {
    package(&party_content("table", "yes"))
}

/// Pack a `content.xml` into an ODS package next to fixed styles.
pub fn package(content: &str) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(ODS_MIME_TYPE.as_bytes()).unwrap();
    zip.start_file("content.xml", deflated).unwrap();
    zip.write_all(content.as_bytes()).unwrap();
    zip.start_file("styles.xml", deflated).unwrap();
    zip.write_all(STYLES_XML.as_bytes()).unwrap();
    zip.start_file("META-INF/manifest.xml", deflated).unwrap();
    zip.write_all(MANIFEST_XML.as_bytes()).unwrap();

    zip.finish().unwrap().into_inner()
}

/// Read one member of a stored package.
pub fn member(bytes: &[u8], name: &str) -> String {
    use std::io::Read;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}
