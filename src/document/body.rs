//! Document body and block-level content

use crate::document::{FootnoteId, Paragraph, SectionProperties};
use crate::document::paragraph::{preserved_elements, raw_references};
use crate::error::{Error, Result};
use crate::xml::{collect_attrs, read_raw, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Block-level content in a document body or a footnote
#[derive(Clone, Debug, PartialEq)]
pub enum BlockContent {
    /// Paragraph
    Paragraph(Paragraph),
    /// Unknown element, tables included (preserved for round-trip)
    Unknown(RawXmlNode),
}

/// Document body (w:body)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Body {
    /// Block-level content
    pub content: Vec<BlockContent>,
    /// Section properties of the last section (trailing sectPr in body)
    pub section_properties: Option<SectionProperties>,
    /// Attributes on w:body
    pub attrs: Vec<(String, String)>,
}

impl Body {
    /// Parse body from XML reader (after w:body start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut body = Body {
            attrs: collect_attrs(start),
            ..Default::default()
        };
        body.content = read_blocks(reader, b"body", Some(&mut body.section_properties))?;
        Ok(body)
    }

    /// Get all paragraphs
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(|c| match c {
            BlockContent::Paragraph(p) => Some(p),
            BlockContent::Unknown(_) => None,
        })
    }

    /// Get all paragraphs mutably
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.content.iter_mut().filter_map(|c| match c {
            BlockContent::Paragraph(p) => Some(p),
            BlockContent::Unknown(_) => None,
        })
    }

    /// Add a paragraph and return it
    pub fn add_paragraph(&mut self, para: Paragraph) -> &mut Paragraph {
        self.content.push(BlockContent::Paragraph(para));
        match self.content.last_mut() {
            Some(BlockContent::Paragraph(p)) => p,
            _ => unreachable!("a paragraph was just pushed"),
        }
    }

    /// Every footnote reference in the body, in document order, including
    /// markers inside preserved content such as tables
    pub fn footnote_references(&self) -> Vec<FootnoteId> {
        self.content
            .iter()
            .flat_map(|block| match block {
                BlockContent::Paragraph(p) => p.footnote_references().collect::<Vec<_>>(),
                BlockContent::Unknown(RawXmlNode::Element(e)) => raw_references(e),
                BlockContent::Unknown(_) => Vec::new(),
            })
            .collect()
    }

    /// Fail with `Malformed` if a preserved w:footnoteReference has no usable id
    pub(crate) fn check_preserved_references(&self) -> Result<()> {
        let mut preserved: Vec<&RawXmlElement> = Vec::new();
        for block in &self.content {
            match block {
                BlockContent::Paragraph(p) => preserved_elements(&p.content, &mut preserved),
                BlockContent::Unknown(node) => preserved.extend(node.as_element()),
            }
        }

        let mut bad = None;
        for elem in preserved {
            let mut visit = |e: &RawXmlElement| {
                if e.local_name() == "footnoteReference"
                    && e.attr("w:id").and_then(|v| v.trim().parse::<FootnoteId>().ok()).is_none()
                {
                    bad.get_or_insert_with(|| e.attr("w:id").unwrap_or_default().to_string());
                }
            };
            visit(elem);
            elem.for_each_descendant(&mut visit);
        }

        match bad {
            Some(value) => Err(Error::Malformed(format!(
                "footnote reference with invalid id '{}'",
                value
            ))),
            None => Ok(()),
        }
    }

    /// Write body to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:body");
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;

        for content in &self.content {
            content.write_to(writer)?;
        }

        if let Some(sect_pr) = &self.section_properties {
            sect_pr.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:body")))?;
        Ok(())
    }
}

impl BlockContent {
    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            BlockContent::Paragraph(para) => para.write_to(writer),
            BlockContent::Unknown(node) => node.write_to(writer),
        }
    }
}

/// Read block-level content until the end tag `end`.
///
/// When `section` is given, a w:sectPr child is parsed into it instead of
/// being kept as unknown content.
pub(crate) fn read_blocks<R: BufRead>(
    reader: &mut Reader<R>,
    end: &[u8],
    mut section: Option<&mut Option<SectionProperties>>,
) -> Result<Vec<BlockContent>> {
    let mut content = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().local_name().as_ref() {
                b"p" => content.push(BlockContent::Paragraph(Paragraph::from_reader(reader, &e)?)),
                b"sectPr" if section.is_some() => {
                    if let Some(slot) = section.as_deref_mut() {
                        *slot = Some(SectionProperties::from_reader(reader, &e)?);
                    }
                }
                _ => content.push(BlockContent::Unknown(read_raw(reader, &e, false)?)),
            },
            Event::Empty(e) => match e.name().local_name().as_ref() {
                b"p" => content.push(BlockContent::Paragraph(Paragraph::from_empty(&e))),
                b"sectPr" if section.is_some() => {
                    if let Some(slot) = section.as_deref_mut() {
                        *slot = Some(SectionProperties::from_empty(&e));
                    }
                }
                _ => content.push(BlockContent::Unknown(read_raw(reader, &e, true)?)),
            },
            Event::End(e) => {
                if e.name().local_name().as_ref() == end {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(content)
}
