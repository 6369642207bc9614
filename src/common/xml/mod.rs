//! XML text helpers shared by the package and grid code.

mod escape;

pub use escape::{escape_xml, resolve_reference, unescape_xml, xml_text};
