//! Run element (w:r) - a contiguous run of content with uniform formatting

use crate::document::FootnoteId;
use crate::error::{Error, Result};
use crate::xml::{collect_attrs, get_w_attr, get_w_val, read_raw, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Run element (w:r)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Run {
    /// Run properties
    pub properties: Option<RunProperties>,
    /// Run content
    pub content: Vec<RunContent>,
    /// Unknown attributes (preserved)
    pub unknown_attrs: Vec<(String, String)>,
}

/// Content within a run
#[derive(Clone, Debug, PartialEq)]
pub enum RunContent {
    /// Text (w:t)
    Text(String),
    /// Tab (w:tab)
    Tab,
    /// Line break (w:br without a type)
    LineBreak,
    /// In-text footnote reference marker (w:footnoteReference)
    FootnoteReference(FootnoteId),
    /// Footnote number mark inside a footnote body (w:footnoteRef)
    FootnoteRef,
    /// Separator line of the reserved separator footnote (w:separator)
    Separator,
    /// Separator line of the continuation separator footnote (w:continuationSeparator)
    ContinuationSeparator,
    /// Unknown (preserved)
    Unknown(RawXmlNode),
}

/// Run properties (w:rPr)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunProperties {
    /// Style ID
    pub style: Option<String>,
    /// Vertical alignment (superscript/subscript)
    pub vertical_align: Option<String>,
    /// Unknown children (preserved)
    pub unknown_children: Vec<RawXmlNode>,
}

/// rPr children the schema places after w:vertAlign
const AFTER_VERT_ALIGN: &[&str] = &[
    "rtl",
    "cs",
    "em",
    "lang",
    "eastAsianLayout",
    "specVanish",
    "oMath",
    "rPrChange",
];

impl Run {
    /// Parse from reader (after w:r start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut run = Run {
            unknown_attrs: collect_attrs(start),
            ..Default::default()
        };

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.name().local_name().as_ref() {
                    b"rPr" => {
                        run.properties = Some(RunProperties::from_reader(reader)?);
                    }
                    b"t" => {
                        let text = read_text_content(reader)?;
                        run.content.push(RunContent::Text(text));
                    }
                    _ => {
                        let raw = read_raw(reader, &e, false)?;
                        run.content.push(RunContent::Unknown(raw));
                    }
                },
                Event::Empty(e) => {
                    let content = match e.name().local_name().as_ref() {
                        b"t" => RunContent::Text(String::new()),
                        b"tab" => RunContent::Tab,
                        b"br" if get_w_attr(&e, "type").is_none() => RunContent::LineBreak,
                        b"footnoteReference" => {
                            RunContent::FootnoteReference(parse_reference_id(&e)?)
                        }
                        b"footnoteRef" => RunContent::FootnoteRef,
                        b"separator" => RunContent::Separator,
                        b"continuationSeparator" => RunContent::ContinuationSeparator,
                        _ => RunContent::Unknown(read_raw(reader, &e, true)?),
                    };
                    // Keep the original element if it carried attributes we would drop
                    let content = match content {
                        RunContent::FootnoteReference(_) if collect_attrs(&e).len() > 1 => {
                            RunContent::Unknown(read_raw(reader, &e, true)?)
                        }
                        other => other,
                    };
                    run.content.push(content);
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"r" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(run)
    }

    /// Create from empty element
    pub fn from_empty(start: &BytesStart) -> Self {
        Run {
            unknown_attrs: collect_attrs(start),
            ..Default::default()
        }
    }

    /// Create a new run with text
    pub fn new(text: impl Into<String>) -> Self {
        Run {
            content: vec![RunContent::Text(text.into())],
            ..Default::default()
        }
    }

    /// Create a superscript run holding only `content`, optionally styled
    pub(crate) fn mark(content: RunContent, style: Option<&str>) -> Self {
        Run {
            properties: Some(RunProperties {
                style: style.map(str::to_string),
                vertical_align: Some("superscript".into()),
                unknown_children: Vec::new(),
            }),
            content: vec![content],
            ..Default::default()
        }
    }

    /// Get all text in this run
    pub fn text(&self) -> String {
        let mut result = String::new();
        for content in &self.content {
            match content {
                RunContent::Text(t) => result.push_str(t),
                RunContent::Tab => result.push('\t'),
                RunContent::LineBreak => result.push('\n'),
                _ => {}
            }
        }
        result
    }

    /// Footnote ids referenced by markers in this run, in order
    pub fn footnote_references(&self) -> impl Iterator<Item = FootnoteId> + Clone + '_ {
        self.content.iter().filter_map(|c| match c {
            RunContent::FootnoteReference(id) => Some(*id),
            RunContent::Unknown(RawXmlNode::Element(e)) => raw_reference_id(e),
            _ => None,
        })
    }

    /// Drop every marker targeting `id`, modelled or preserved raw.
    /// Returns how many were dropped.
    pub fn remove_footnote_references(&mut self, id: FootnoteId) -> usize {
        let before = self.content.len();
        self.content.retain(|c| match c {
            RunContent::FootnoteReference(target) => *target != id,
            RunContent::Unknown(RawXmlNode::Element(e)) => raw_reference_id(e) != Some(id),
            _ => true,
        });
        before - self.content.len()
    }

    /// Get style ID
    pub fn style(&self) -> Option<&str> {
        self.properties.as_ref()?.style.as_deref()
    }

    /// Get vertical alignment (e.g. "superscript")
    pub fn vertical_align(&self) -> Option<&str> {
        self.properties.as_ref()?.vertical_align.as_deref()
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:r");
        for (key, value) in &self.unknown_attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.properties.is_none() && self.content.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;

        if let Some(props) = &self.properties {
            props.write_to(writer)?;
        }

        for content in &self.content {
            content.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:r")))?;
        Ok(())
    }
}

impl RunContent {
    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            RunContent::Text(text) => {
                let mut start = BytesStart::new("w:t");
                // Preserve space if text has leading/trailing whitespace
                if text.starts_with(' ') || text.ends_with(' ') || text.contains("  ") {
                    start.push_attribute(("xml:space", "preserve"));
                }
                writer.write_event(Event::Start(start))?;
                writer.write_event(Event::Text(BytesText::new(text)))?;
                writer.write_event(Event::End(BytesEnd::new("w:t")))?;
            }
            RunContent::Tab => {
                writer.write_event(Event::Empty(BytesStart::new("w:tab")))?;
            }
            RunContent::LineBreak => {
                writer.write_event(Event::Empty(BytesStart::new("w:br")))?;
            }
            RunContent::FootnoteReference(id) => {
                let mut elem = BytesStart::new("w:footnoteReference");
                elem.push_attribute(("w:id", id.to_string().as_str()));
                writer.write_event(Event::Empty(elem))?;
            }
            RunContent::FootnoteRef => {
                writer.write_event(Event::Empty(BytesStart::new("w:footnoteRef")))?;
            }
            RunContent::Separator => {
                writer.write_event(Event::Empty(BytesStart::new("w:separator")))?;
            }
            RunContent::ContinuationSeparator => {
                writer.write_event(Event::Empty(BytesStart::new("w:continuationSeparator")))?;
            }
            RunContent::Unknown(node) => {
                node.write_to(writer)?;
            }
        }
        Ok(())
    }
}

impl RunProperties {
    /// Parse from reader (after w:rPr start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut props = RunProperties::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    props.unknown_children.push(read_raw(reader, &e, false)?);
                }
                Event::Empty(e) => match e.name().local_name().as_ref() {
                    b"rStyle" if collect_attrs(&e).len() == 1 => {
                        props.style = get_w_val(&e);
                    }
                    b"vertAlign" if collect_attrs(&e).len() == 1 => {
                        props.vertical_align = get_w_val(&e);
                    }
                    _ => {
                        props.unknown_children.push(read_raw(reader, &e, true)?);
                    }
                },
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"rPr" {
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

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;

        if let Some(style) = &self.style {
            let mut elem = BytesStart::new("w:rStyle");
            elem.push_attribute(("w:val", style.as_str()));
            writer.write_event(Event::Empty(elem))?;
        }

        let (after, before): (Vec<&RawXmlNode>, Vec<&RawXmlNode>) =
            self.unknown_children.iter().partition(|child| {
                child
                    .as_element()
                    .is_some_and(|e| AFTER_VERT_ALIGN.contains(&e.local_name()))
            });

        for child in before {
            child.write_to(writer)?;
        }

        if let Some(valign) = &self.vertical_align {
            let mut elem = BytesStart::new("w:vertAlign");
            elem.push_attribute(("w:val", valign.as_str()));
            writer.write_event(Event::Empty(elem))?;
        }

        for child in after {
            child.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
        Ok(())
    }
}

/// Target id of a preserved w:footnoteReference element
pub(crate) fn raw_reference_id(e: &RawXmlElement) -> Option<FootnoteId> {
    if e.local_name() != "footnoteReference" {
        return None;
    }
    e.attr("w:id").or_else(|| e.attr("id"))?.trim().parse().ok()
}

/// Parse the w:id of a w:footnoteReference
fn parse_reference_id(e: &BytesStart) -> Result<FootnoteId> {
    let raw = get_w_attr(e, "id").ok_or_else(|| {
        Error::Malformed("footnote reference without a w:id attribute".into())
    })?;
    raw.trim()
        .parse()
        .map_err(|_| Error::Malformed(format!("footnote reference with invalid id '{}'", raw)))
}

/// Read text content from w:t element
fn read_text_content<R: BufRead>(reader: &mut Reader<R>) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(t) => {
                text.push_str(&t.unescape()?);
            }
            Event::End(e) => {
                if e.name().local_name().as_ref() == b"t" {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
