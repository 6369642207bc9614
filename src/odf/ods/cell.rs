//! Cell data structures for ODS spreadsheets.

use crate::common::xml::{escape_xml, xml_text};

/// Cell data types supported by ODF spreadsheets.
///
/// One variant per ODF `office:value-type`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// Text string
    Text(String),
    /// Numeric value
    Number(f64),
    /// Boolean value
    Boolean(bool),
    /// Date/time value (stored as ISO 8601 string)
    Date(String),
    /// Currency value with currency code
    Currency(f64, String),
    /// Percentage value
    Percentage(f64),
    /// Time duration
    Time(String),
}

impl CellValue {
    /// Check if the value is `Empty`.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric payload for Number, Currency and Percentage values.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) | CellValue::Currency(n, _) | CellValue::Percentage(n) => Some(*n),
            _ => None,
        }
    }

    /// The text a spreadsheet application would display for this value.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Date(d) => d.clone(),
            CellValue::Currency(n, currency) => format!("{} {}", format_number(*n), currency),
            CellValue::Percentage(n) => format!("{}%", format_number(n * 100.0)),
            CellValue::Time(t) => t.clone(),
        }
    }

    /// `office:*` attributes encoding this value, already escaped.
    pub(crate) fn value_attributes(&self) -> Vec<(String, String)> {
        let attr = |key: &str, value: String| (key.to_string(), value);
        match self {
            CellValue::Empty => Vec::new(),
            CellValue::Text(_) => vec![attr("office:value-type", "string".into())],
            CellValue::Number(n) => vec![
                attr("office:value-type", "float".into()),
                attr("office:value", format_number(*n)),
            ],
            CellValue::Boolean(b) => vec![
                attr("office:value-type", "boolean".into()),
                attr("office:boolean-value", b.to_string()),
            ],
            CellValue::Date(d) => vec![
                attr("office:value-type", "date".into()),
                attr("office:date-value", escape_xml(d)),
            ],
            CellValue::Currency(n, currency) => vec![
                attr("office:value-type", "currency".into()),
                attr("office:currency", escape_xml(currency)),
                attr("office:value", format_number(*n)),
            ],
            CellValue::Percentage(n) => vec![
                attr("office:value-type", "percentage".into()),
                attr("office:value", format_number(*n)),
            ],
            CellValue::Time(t) => vec![
                attr("office:value-type", "time".into()),
                attr("office:time-value", escape_xml(t)),
            ],
        }
    }
}

/// Format a float the way ODF writes `office:value`: integral values without
/// a fractional part, everything else in shortest round-trip form.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        let mut buffer = itoa::Buffer::new();
        buffer.format(n as i64).to_string()
    } else {
        let mut buffer = ryu::Buffer::new();
        buffer.format(n).to_string()
    }
}

/// Attributes describing a cell's value; dropped and regenerated whenever the
/// value is replaced.
const VALUE_ATTRIBUTES: &[&str] = &[
    "office:value-type",
    "calcext:value-type",
    "office:value",
    "office:date-value",
    "office:time-value",
    "office:boolean-value",
    "office:string-value",
    "office:currency",
    "table:formula",
];

/// A cell in an ODS spreadsheet.
///
/// Besides the typed value, a cell keeps its original XML attributes and
/// children verbatim so that untouched cells are written back exactly as they
/// were read (styles, annotations, rich text).
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// The cell value
    pub value: CellValue,
    /// The raw text content of the cell
    pub text: String,
    /// The formula in the cell (if any), in ODF format
    pub formula: Option<String>,
    /// Raw (still escaped) attributes, without `table:number-columns-repeated`
    pub(crate) attributes: Vec<(String, String)>,
    /// Raw children XML
    pub(crate) inner_xml: Option<String>,
    /// Whether this is a `table:covered-table-cell` (hidden by a merge)
    pub(crate) covered: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

impl Cell {
    /// A blank cell without style.
    pub fn empty() -> Self {
        Self {
            value: CellValue::Empty,
            text: String::new(),
            formula: None,
            attributes: Vec::new(),
            inner_xml: None,
            covered: false,
        }
    }

    /// A fresh cell holding `value`.
    pub fn new(value: CellValue) -> Self {
        let mut cell = Self::empty();
        cell.set_value(value);
        cell
    }

    /// Get the text content of the cell.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the cell value.
    pub fn value(&self) -> &CellValue {
        &self.value
    }

    /// Get the formula in the cell.
    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    /// Name of the cell style, if any.
    pub fn style_name(&self) -> Option<&str> {
        self.attribute("table:style-name")
    }

    /// Raw value of an attribute.
    pub(crate) fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check if the cell holds no value. An empty string counts as empty.
    pub fn is_empty(&self) -> bool {
        match &self.value {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Nothing but (possibly) a style: no value, text, formula or children.
    pub(crate) fn is_blank(&self) -> bool {
        self.value.is_empty()
            && self.text.is_empty()
            && self.formula.is_none()
            && self.inner_xml.as_deref().is_none_or(|xml| xml.trim().is_empty())
    }

    /// Replace the value, keeping the cell style.
    ///
    /// Formula, annotations and rich text of the previous content are dropped.
    /// Text is stored the way [`xml_text`] cleans it.
    pub fn set_value(&mut self, value: CellValue) {
        let value = match value {
            CellValue::Text(s) => CellValue::Text(xml_text(&s).into_owned()),
            other => other,
        };
        self.attributes
            .retain(|(key, _)| !VALUE_ATTRIBUTES.contains(&key.as_str()));
        self.attributes.extend(value.value_attributes());
        self.text = value.display_text();
        self.inner_xml = paragraphs_xml(&self.text);
        self.formula = None;
        self.value = value;
    }
}

/// Render text as `text:p` paragraphs, one per line, encoding runs of spaces
/// and tabs the ODF way.
pub(crate) fn paragraphs_xml(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    let mut xml = String::with_capacity(text.len() + 16);
    for line in text.split('\n') {
        xml.push_str("<text:p>");
        let mut spaces = 0usize;
        let mut at_start = true;
        for ch in line.chars() {
            if ch == ' ' {
                spaces += 1;
                continue;
            }
            flush_spaces(&mut xml, spaces, at_start);
            spaces = 0;
            at_start = false;
            match ch {
                '\t' => xml.push_str("<text:tab/>"),
                '&' => xml.push_str("&amp;"),
                '<' => xml.push_str("&lt;"),
                '>' => xml.push_str("&gt;"),
                _ => xml.push(ch),
            }
        }
        flush_spaces(&mut xml, spaces, true);
        xml.push_str("</text:p>");
    }
    Some(xml)
}

/// A single space between words is literal; leading, trailing and repeated
/// spaces need `text:s` or readers collapse them.
fn flush_spaces(xml: &mut String, count: usize, protect_all: bool) {
    if count == 0 {
        return;
    }
    let (literal, protected) = if protect_all { (0, count) } else { (1, count - 1) };
    if literal == 1 {
        xml.push(' ');
    }
    match protected {
        0 => {},
        1 => xml.push_str("<text:s/>"),
        n => xml.push_str(&format!(r#"<text:s text:c="{}"/>"#, n)),
    }
}
