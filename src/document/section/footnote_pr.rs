//! Footnote properties block (w:footnotePr)

use super::types::{
    parse_start_value, EffectiveFootnoteProperties, FootnotePosition, FootnoteProperty,
    NumberFormat, RestartLocation,
};
use crate::error::Result;
use crate::xml::{collect_attrs, read_raw, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// A property slot as found in the XML.
///
/// `Foreign` keeps an element whose value is outside the legal set (written by
/// another tool) so it can be written back untouched; it counts as unset when
/// resolving effective values.
#[derive(Clone, Debug, PartialEq)]
pub enum Stored<T> {
    Value(T),
    Foreign(RawXmlElement),
}

impl<T: Copy> Stored<T> {
    fn value(&self) -> Option<T> {
        match self {
            Stored::Value(v) => Some(*v),
            Stored::Foreign(_) => None,
        }
    }
}

/// Footnote properties of one section, or the document-wide defaults.
///
/// Every property is optional: `None` means "inherit".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FootnoteProperties {
    pub position: Option<Stored<FootnotePosition>>,
    pub number_format: Option<Stored<NumberFormat>>,
    pub start_value: Option<Stored<u32>>,
    pub restart: Option<Stored<RestartLocation>>,
    /// Attributes on w:footnotePr itself
    pub attrs: Vec<(String, String)>,
    /// Other children (e.g. the w:footnote list in settings), preserved
    pub unknown_children: Vec<RawXmlNode>,
}

impl FootnoteProperties {
    /// Create an empty block (everything inherited)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from reader (after the w:footnotePr start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut props = FootnoteProperties {
            attrs: collect_attrs(start),
            ..Default::default()
        };
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match FootnoteProperty::from_element(e.name().local_name().as_ref()) {
                    Some(property) => {
                        props.read_property(property, RawXmlElement::from_reader(reader, &e)?)
                    }
                    None => props.unknown_children.push(read_raw(reader, &e, false)?),
                },
                Event::Empty(e) => match FootnoteProperty::from_element(e.name().local_name().as_ref()) {
                    Some(property) => props.read_property(property, RawXmlElement::from_empty(&e)),
                    None => props.unknown_children.push(read_raw(reader, &e, true)?),
                },
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"footnotePr" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(props)
    }

    /// Create from an empty w:footnotePr tag
    pub fn from_empty(start: &BytesStart) -> Self {
        FootnoteProperties {
            attrs: collect_attrs(start),
            ..Default::default()
        }
    }

    /// Accepts `<w:numFmt w:val=".."/>` and its start/end form; anything with
    /// extra attributes or content is kept as [`Stored::Foreign`].
    fn read_property(&mut self, property: FootnoteProperty, raw: RawXmlElement) {
        let val = match raw.attributes.as_slice() {
            [(key, val)] if key == "w:val" || key == "val" => Some(val.as_str()),
            _ => None,
        };
        let has_content = raw
            .children
            .iter()
            .any(|c| !matches!(c, RawXmlNode::Text(t) if t.trim().is_empty()));
        let parsed = match val {
            Some(val) if !has_content => self.parse_into(property, val),
            _ => Err(crate::error::Error::invalid_value(property.as_str(), "")),
        };
        if parsed.is_err() {
            log::warn!(
                "keeping unrecognized footnote {} element <{}> as-is",
                property,
                raw.name
            );
            match property {
                FootnoteProperty::Position => self.position = Some(Stored::Foreign(raw)),
                FootnoteProperty::NumberFormat => self.number_format = Some(Stored::Foreign(raw)),
                FootnoteProperty::StartValue => self.start_value = Some(Stored::Foreign(raw)),
                FootnoteProperty::RestartLocation => self.restart = Some(Stored::Foreign(raw)),
            }
        }
    }

    /// Validate `value` for `property` and store it. Nothing changes on error.
    fn parse_into(&mut self, property: FootnoteProperty, value: &str) -> Result<()> {
        match property {
            FootnoteProperty::Position => {
                self.position = Some(Stored::Value(value.parse()?));
            }
            FootnoteProperty::NumberFormat => {
                self.number_format = Some(Stored::Value(value.parse()?));
            }
            FootnoteProperty::StartValue => {
                self.start_value = Some(Stored::Value(parse_start_value(value)?));
            }
            FootnoteProperty::RestartLocation => {
                self.restart = Some(Stored::Value(value.parse()?));
            }
        }
        Ok(())
    }

    /// Set a property from its XML token (`"lowerRoman"`, `"eachPage"`, `"3"`, ...).
    ///
    /// Fails with [`Error::InvalidValue`](crate::Error::InvalidValue) when the
    /// value is outside the property's legal set; the block is left unchanged.
    pub fn set(&mut self, property: FootnoteProperty, value: &str) -> Result<()> {
        self.parse_into(property, value)
    }

    /// Remove an explicit value so the property is inherited again
    pub fn clear(&mut self, property: FootnoteProperty) {
        match property {
            FootnoteProperty::Position => self.position = None,
            FootnoteProperty::NumberFormat => self.number_format = None,
            FootnoteProperty::StartValue => self.start_value = None,
            FootnoteProperty::RestartLocation => self.restart = None,
        }
    }

    pub fn set_position(&mut self, position: FootnotePosition) {
        self.position = Some(Stored::Value(position));
    }

    pub fn set_number_format(&mut self, format: NumberFormat) {
        self.number_format = Some(Stored::Value(format));
    }

    /// Set the first footnote number; must be at least 1
    pub fn set_start_value(&mut self, start: u32) -> Result<()> {
        self.parse_into(FootnoteProperty::StartValue, &start.to_string())
    }

    pub fn set_restart(&mut self, restart: RestartLocation) {
        self.restart = Some(Stored::Value(restart));
    }

    /// Explicitly set position, if any
    pub fn position(&self) -> Option<FootnotePosition> {
        self.position.as_ref()?.value()
    }

    /// Explicitly set number format, if any
    pub fn number_format(&self) -> Option<NumberFormat> {
        self.number_format.as_ref()?.value()
    }

    /// Explicitly set start value, if any
    pub fn start_value(&self) -> Option<u32> {
        self.start_value.as_ref()?.value()
    }

    /// Explicitly set restart location, if any
    pub fn restart(&self) -> Option<RestartLocation> {
        self.restart.as_ref()?.value()
    }

    /// Whether any of the four properties is present (valid or not)
    pub fn has_properties(&self) -> bool {
        self.position.is_some()
            || self.number_format.is_some()
            || self.start_value.is_some()
            || self.restart.is_some()
    }

    /// Whether writing this block would produce an empty element
    pub fn is_empty(&self) -> bool {
        !self.has_properties() && self.attrs.is_empty() && self.unknown_children.is_empty()
    }

    /// Resolve effective values, one property at a time: the section's own
    /// value, else the document default, else the built-in default.
    pub fn resolve(
        section: Option<&FootnoteProperties>,
        defaults: Option<&FootnoteProperties>,
    ) -> EffectiveFootnoteProperties {
        let builtin = EffectiveFootnoteProperties::default();
        EffectiveFootnoteProperties {
            position: section
                .and_then(FootnoteProperties::position)
                .or_else(|| defaults.and_then(FootnoteProperties::position))
                .unwrap_or(builtin.position),
            number_format: section
                .and_then(FootnoteProperties::number_format)
                .or_else(|| defaults.and_then(FootnoteProperties::number_format))
                .unwrap_or(builtin.number_format),
            start_value: section
                .and_then(FootnoteProperties::start_value)
                .or_else(|| defaults.and_then(FootnoteProperties::start_value))
                .unwrap_or(builtin.start_value),
            restart: section
                .and_then(FootnoteProperties::restart)
                .or_else(|| defaults.and_then(FootnoteProperties::restart))
                .unwrap_or(builtin.restart),
        }
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:footnotePr");
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if !self.has_properties() && self.unknown_children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;

        write_slot(writer, "w:pos", self.position.as_ref(), |v| v.as_str().to_string())?;
        write_slot(writer, "w:numFmt", self.number_format.as_ref(), |v| {
            v.as_str().to_string()
        })?;
        write_slot(writer, "w:numStart", self.start_value.as_ref(), |v| v.to_string())?;
        write_slot(writer, "w:numRestart", self.restart.as_ref(), |v| {
            v.as_str().to_string()
        })?;

        for child in &self.unknown_children {
            child.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:footnotePr")))?;
        Ok(())
    }
}

fn write_slot<W: std::io::Write, T>(
    writer: &mut Writer<W>,
    name: &str,
    slot: Option<&Stored<T>>,
    token: impl Fn(&T) -> String,
) -> Result<()> {
    match slot {
        Some(Stored::Value(v)) => {
            let mut elem = BytesStart::new(name);
            elem.push_attribute(("w:val", token(v).as_str()));
            writer.write_event(Event::Empty(elem))?;
        }
        Some(Stored::Foreign(raw)) => raw.write_to(writer)?,
        None => {}
    }
    Ok(())
}
