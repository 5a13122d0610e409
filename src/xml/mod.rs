//! XML utilities and raw element preservation for round-trip support

mod namespace;
mod raw;

pub use namespace::*;
pub use raw::{RawXmlElement, RawXmlNode};

use quick_xml::events::BytesStart;
use quick_xml::Reader;
use std::io::BufRead;

use crate::error::Result;

/// Helper to get attribute value from BytesStart
pub fn get_attr(element: &BytesStart, name: &str) -> Option<String> {
    element
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name.as_bytes())
        .map(|a| match a.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&a.value).to_string(),
        })
}

/// Helper to get a `w:`-prefixed attribute, accepting the unprefixed form too
pub fn get_w_attr(element: &BytesStart, local: &str) -> Option<String> {
    get_attr(element, &format!("w:{}", local)).or_else(|| get_attr(element, local))
}

/// Helper to get w:val attribute (common in OOXML)
pub fn get_w_val(element: &BytesStart) -> Option<String> {
    get_w_attr(element, "val")
}

/// Collect all attributes of an element as owned (name, value) pairs
pub fn collect_attrs(element: &BytesStart) -> Vec<(String, String)> {
    element
        .attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            let value = match a.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&a.value).to_string(),
            };
            (String::from_utf8_lossy(a.key.as_ref()).to_string(), value)
        })
        .collect()
}

/// Read the element that `start` opened, or wrap an empty tag, as a raw node
pub fn read_raw<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<RawXmlNode> {
    let elem = if empty {
        RawXmlElement::from_empty(start)
    } else {
        RawXmlElement::from_reader(reader, start)?
    };
    Ok(RawXmlNode::Element(elem))
}
