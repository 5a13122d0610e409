//! Section properties (w:sectPr) and their footnote formatting block
//!
//! A section may override each of the four footnote properties on its own;
//! anything it leaves out is inherited from the document-wide defaults in
//! settings.xml and, failing that, from the built-in defaults.

mod footnote_pr;
mod types;

pub use footnote_pr::{FootnoteProperties, Stored};
pub use types::{
    EffectiveFootnoteProperties, FootnotePosition, FootnoteProperty, NumberFormat,
    RestartLocation,
};

use crate::error::Result;
use crate::xml::{collect_attrs, read_raw, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Child of w:sectPr, kept in source order
#[derive(Clone, Debug, PartialEq)]
enum SectionChild {
    Footnotes(FootnoteProperties),
    Other(RawXmlNode),
}

/// Section properties (w:sectPr)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionProperties {
    /// Attributes on w:sectPr (rsids etc.)
    pub attrs: Vec<(String, String)>,
    children: Vec<SectionChild>,
}

/// sectPr children that precede w:footnotePr in the schema
const BEFORE_FOOTNOTE_PR: &[&str] = &["headerReference", "footerReference"];

impl SectionProperties {
    /// Create empty section properties
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from reader (after the w:sectPr start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut section = SectionProperties {
            attrs: collect_attrs(start),
            children: Vec::new(),
        };
        let mut buf = Vec::new();

        loop {
            let child = match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.name().local_name().as_ref() {
                    b"footnotePr" => {
                        SectionChild::Footnotes(FootnoteProperties::from_reader(reader, &e)?)
                    }
                    _ => SectionChild::Other(read_raw(reader, &e, false)?),
                },
                Event::Empty(e) => match e.name().local_name().as_ref() {
                    b"footnotePr" => SectionChild::Footnotes(FootnoteProperties::from_empty(&e)),
                    _ => SectionChild::Other(read_raw(reader, &e, true)?),
                },
                Event::End(e) if e.name().local_name().as_ref() == b"sectPr" => break,
                Event::Eof => break,
                _ => {
                    buf.clear();
                    continue;
                }
            };
            section.children.push(child);
            buf.clear();
        }

        Ok(section)
    }

    /// Create from an empty w:sectPr tag
    pub fn from_empty(start: &BytesStart) -> Self {
        SectionProperties {
            attrs: collect_attrs(start),
            children: Vec::new(),
        }
    }

    /// The section's own footnote properties block, if present
    pub fn footnote_properties(&self) -> Option<&FootnoteProperties> {
        self.children.iter().find_map(|c| match c {
            SectionChild::Footnotes(f) => Some(f),
            SectionChild::Other(_) => None,
        })
    }

    fn footnote_properties_mut(&mut self) -> Option<&mut FootnoteProperties> {
        self.children.iter_mut().find_map(|c| match c {
            SectionChild::Footnotes(f) => Some(f),
            SectionChild::Other(_) => None,
        })
    }

    /// Where a new w:footnotePr belongs: after any header/footer references
    fn footnote_properties_slot(&self) -> usize {
        self.children
            .iter()
            .rposition(|c| match c {
                SectionChild::Other(node) => node
                    .as_element()
                    .is_some_and(|e| BEFORE_FOOTNOTE_PR.contains(&e.local_name())),
                SectionChild::Footnotes(_) => false,
            })
            .map_or(0, |i| i + 1)
    }

    /// Override one footnote property for this section.
    ///
    /// The value is validated first; on error the section is left unchanged.
    pub fn set_footnote_property(&mut self, property: FootnoteProperty, value: &str) -> Result<()> {
        let mut updated = self.footnote_properties().cloned().unwrap_or_default();
        updated.set(property, value)?;

        match self.footnote_properties_mut() {
            Some(existing) => *existing = updated,
            None => {
                let slot = self.footnote_properties_slot();
                self.children.insert(slot, SectionChild::Footnotes(updated));
            }
        }
        Ok(())
    }

    /// Drop this section's override of one property. An emptied block is removed.
    pub fn clear_footnote_property(&mut self, property: FootnoteProperty) {
        if let Some(props) = self.footnote_properties_mut() {
            props.clear(property);
            if props.is_empty() {
                self.children
                    .retain(|c| !matches!(c, SectionChild::Footnotes(_)));
            }
        }
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:sectPr");
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            match child {
                SectionChild::Footnotes(f) => f.write_to(writer)?,
                SectionChild::Other(node) => node.write_to(writer)?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new("w:sectPr")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(xml: &str) -> SectionProperties {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) => {
                    return SectionProperties::from_reader(&mut reader, &e.into_owned()).unwrap()
                }
                Event::Empty(e) => return SectionProperties::from_empty(&e),
                Event::Eof => panic!("no sectPr in fixture"),
                _ => {}
            }
            buf.clear();
        }
    }

    fn write(section: &SectionProperties) -> String {
        let mut out = Vec::new();
        section.write_to(&mut Writer::new(&mut out)).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_roundtrip_untouched() {
        let xml = r#"<w:sectPr w:rsidR="00A1"><w:headerReference w:type="default" r:id="rId8"/><w:footnotePr><w:pos w:val="beneathText"/></w:footnotePr><w:pgSz w:w="11906" w:h="16838"/><w:cols w:space="708"/></w:sectPr>"#;
        let section = parse(xml);
        assert_eq!(
            section.footnote_properties().and_then(|f| f.position()),
            Some(FootnotePosition::BeneathText)
        );
        assert_eq!(write(&section), xml);
    }

    #[test]
    fn test_new_block_goes_after_header_references() {
        let mut section = parse(
            r#"<w:sectPr><w:headerReference w:type="default" r:id="rId8"/><w:footerReference w:type="default" r:id="rId9"/><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#,
        );
        section
            .set_footnote_property(FootnoteProperty::NumberFormat, "upperLetter")
            .unwrap();

        assert_eq!(
            write(&section),
            r#"<w:sectPr><w:headerReference w:type="default" r:id="rId8"/><w:footerReference w:type="default" r:id="rId9"/><w:footnotePr><w:numFmt w:val="upperLetter"/></w:footnotePr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#
        );
    }

    #[test]
    fn test_new_block_first_without_references() {
        let mut section = parse(r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#);
        section
            .set_footnote_property(FootnoteProperty::StartValue, "5")
            .unwrap();
        assert_eq!(
            write(&section),
            r#"<w:sectPr><w:footnotePr><w:numStart w:val="5"/></w:footnotePr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#
        );
    }

    #[test]
    fn test_invalid_value_does_not_create_block() {
        let mut section = SectionProperties::new();
        assert!(section
            .set_footnote_property(FootnoteProperty::NumberFormat, "romanNumeralsXYZ")
            .is_err());
        assert!(section.footnote_properties().is_none());
        assert_eq!(write(&section), "<w:sectPr/>");
    }

    #[test]
    fn test_clear_removes_emptied_block() {
        let mut section = SectionProperties::new();
        section
            .set_footnote_property(FootnoteProperty::RestartLocation, "eachPage")
            .unwrap();
        section.clear_footnote_property(FootnoteProperty::RestartLocation);
        assert!(section.footnote_properties().is_none());
    }
}
