//! Paragraph element (w:p)

use crate::document::run::raw_reference_id;
use crate::document::{FootnoteId, Run, RunContent, SectionProperties};
use crate::error::Result;
use crate::xml::{collect_attrs, get_w_val, read_raw, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Paragraph element (w:p)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Paragraph {
    /// Paragraph properties
    pub properties: Option<ParagraphProperties>,
    /// Paragraph content (runs, hyperlinks, etc.)
    pub content: Vec<ParagraphContent>,
    /// Unknown attributes (preserved for round-trip)
    pub unknown_attrs: Vec<(String, String)>,
}

/// Content within a paragraph
#[derive(Clone, Debug, PartialEq)]
pub enum ParagraphContent {
    /// Text run
    Run(Run),
    /// Hyperlink
    Hyperlink(Hyperlink),
    /// Unknown element (preserved)
    Unknown(RawXmlNode),
}

/// Hyperlink element (w:hyperlink)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hyperlink {
    /// Attributes (r:id, w:anchor, ...) in source order
    pub attrs: Vec<(String, String)>,
    /// Runs and preserved unknown content, in order
    pub content: Vec<ParagraphContent>,
}

/// Paragraph properties (w:pPr)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphProperties {
    /// Style ID
    pub style: Option<String>,
    /// Section break carried by this paragraph (w:sectPr)
    pub section: Option<SectionProperties>,
    /// Unknown children (preserved)
    pub unknown_children: Vec<RawXmlNode>,
}

impl Paragraph {
    /// Parse paragraph from reader (after w:p start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut para = Paragraph {
            unknown_attrs: collect_attrs(start),
            ..Default::default()
        };
        para.content = read_inline_content(reader, b"p", Some(&mut para.properties))?;
        Ok(para)
    }

    /// Create from empty element
    pub fn from_empty(start: &BytesStart) -> Self {
        Paragraph {
            unknown_attrs: collect_attrs(start),
            ..Default::default()
        }
    }

    /// Create a new paragraph with text
    pub fn new(text: impl Into<String>) -> Self {
        Paragraph {
            content: vec![ParagraphContent::Run(Run::new(text))],
            ..Default::default()
        }
    }

    /// Get all text in this paragraph
    pub fn text(&self) -> String {
        let mut result = String::new();
        for content in &self.content {
            match content {
                ParagraphContent::Run(run) => result.push_str(&run.text()),
                ParagraphContent::Hyperlink(link) => {
                    for run in link.runs() {
                        result.push_str(&run.text());
                    }
                }
                ParagraphContent::Unknown(_) => {}
            }
        }
        result
    }

    /// Get style ID
    pub fn style(&self) -> Option<&str> {
        self.properties.as_ref()?.style.as_deref()
    }

    /// Set style
    pub fn set_style(&mut self, style: impl Into<String>) {
        self.properties.get_or_insert_with(Default::default).style = Some(style.into());
    }

    /// Get the section break this paragraph carries, if any
    pub fn section(&self) -> Option<&SectionProperties> {
        self.properties.as_ref()?.section.as_ref()
    }

    /// Mutable access to the section break this paragraph carries, if any
    pub fn section_mut(&mut self) -> Option<&mut SectionProperties> {
        self.properties.as_mut()?.section.as_mut()
    }

    /// Get all direct runs
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|c| match c {
            ParagraphContent::Run(r) => Some(r),
            _ => None,
        })
    }

    /// Add a run to this paragraph
    pub fn add_run(&mut self, run: Run) {
        self.content.push(ParagraphContent::Run(run));
    }

    /// Ids targeted by footnote reference markers in this paragraph, in document order.
    ///
    /// Includes markers inside hyperlinks and inside preserved unknown content
    /// (for example smart tags or content controls). The iterator borrows the
    /// paragraph and can be cloned to restart it.
    pub fn footnote_references(&self) -> impl Iterator<Item = FootnoteId> + Clone + '_ {
        self.content.iter().flat_map(content_references)
    }

    /// Remove every reference marker that targets `id`.
    ///
    /// Covers the same markers [`footnote_references`](Self::footnote_references)
    /// reports, including preserved ones. Runs left empty by the removal are
    /// dropped. Returns the number of markers removed. The footnote itself is
    /// not touched.
    pub fn remove_footnote_references(&mut self, id: FootnoteId) -> usize {
        remove_content_references(&mut self.content, id)
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:p");
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

        writer.write_event(Event::End(BytesEnd::new("w:p")))?;
        Ok(())
    }
}

/// Footnote ids referenced from one piece of paragraph content
fn content_references(content: &ParagraphContent) -> std::vec::IntoIter<FootnoteId> {
    let ids: Vec<FootnoteId> = match content {
        ParagraphContent::Run(run) => run.footnote_references().collect(),
        ParagraphContent::Hyperlink(link) => {
            link.content.iter().flat_map(content_references).collect()
        }
        ParagraphContent::Unknown(RawXmlNode::Element(elem)) => raw_references(elem),
        ParagraphContent::Unknown(_) => Vec::new(),
    };
    ids.into_iter()
}

fn remove_content_references(content: &mut Vec<ParagraphContent>, id: FootnoteId) -> usize {
    let mut removed = 0;
    content.retain_mut(|item| match item {
        ParagraphContent::Run(run) => {
            let n = run.remove_footnote_references(id);
            removed += n;
            n == 0 || !run.content.is_empty()
        }
        ParagraphContent::Hyperlink(link) => {
            removed += remove_content_references(&mut link.content, id);
            true
        }
        ParagraphContent::Unknown(node) => keep_raw_node(node, id, &mut removed),
    });
    removed
}

/// Strip markers for `id` below a preserved node; false when the node itself
/// should go (it is such a marker, or a raw w:r emptied by the removal)
fn keep_raw_node(node: &mut RawXmlNode, id: FootnoteId, removed: &mut usize) -> bool {
    let RawXmlNode::Element(elem) = node else {
        return true;
    };
    if raw_reference_id(elem) == Some(id) {
        *removed += 1;
        return false;
    }

    let before = *removed;
    elem.children
        .retain_mut(|child| keep_raw_node(child, id, removed));
    *removed == before || elem.local_name() != "r" || has_run_content(elem)
}

fn has_run_content(run: &RawXmlElement) -> bool {
    run.children.iter().any(|c| match c {
        RawXmlNode::Element(e) => e.local_name() != "rPr",
        RawXmlNode::Text(t) => !t.trim().is_empty(),
        RawXmlNode::Comment(_) => false,
    })
}

/// Raw elements preserved anywhere in a run of paragraph content
pub(crate) fn preserved_elements<'a>(content: &'a [ParagraphContent], out: &mut Vec<&'a RawXmlElement>) {
    for item in content {
        match item {
            ParagraphContent::Run(run) => out.extend(run.content.iter().filter_map(|c| match c {
                RunContent::Unknown(node) => node.as_element(),
                _ => None,
            })),
            ParagraphContent::Hyperlink(link) => preserved_elements(&link.content, out),
            ParagraphContent::Unknown(node) => out.extend(node.as_element()),
        }
    }
}

/// Footnote reference ids inside a preserved raw element
pub(crate) fn raw_references(elem: &RawXmlElement) -> Vec<FootnoteId> {
    let mut ids = Vec::new();
    let mut visit = |e: &RawXmlElement| ids.extend(raw_reference_id(e));
    visit(elem);
    elem.for_each_descendant(&mut visit);
    ids
}

impl ParagraphContent {
    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            ParagraphContent::Run(run) => run.write_to(writer),
            ParagraphContent::Hyperlink(link) => link.write_to(writer),
            ParagraphContent::Unknown(node) => node.write_to(writer),
        }
    }
}

impl Hyperlink {
    /// Parse from reader (after w:hyperlink start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        Ok(Hyperlink {
            attrs: collect_attrs(start),
            content: read_inline_content(reader, b"hyperlink", None)?,
        })
    }

    /// Runs directly inside the hyperlink
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|c| match c {
            ParagraphContent::Run(r) => Some(r),
            _ => None,
        })
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:hyperlink");
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.content.is_empty() {
            writer.write_event(Event::Empty(start))?;
        } else {
            writer.write_event(Event::Start(start))?;
            for content in &self.content {
                content.write_to(writer)?;
            }
            writer.write_event(Event::End(BytesEnd::new("w:hyperlink")))?;
        }

        Ok(())
    }
}

impl ParagraphProperties {
    /// Parse from reader (after w:pPr start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut props = ParagraphProperties::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.name().local_name().as_ref() {
                    b"sectPr" => {
                        props.section = Some(SectionProperties::from_reader(reader, &e)?);
                    }
                    _ => props.unknown_children.push(read_raw(reader, &e, false)?),
                },
                Event::Empty(e) => match e.name().local_name().as_ref() {
                    b"pStyle" if collect_attrs(&e).len() == 1 => {
                        props.style = get_w_val(&e);
                    }
                    b"sectPr" => {
                        props.section = Some(SectionProperties::from_empty(&e));
                    }
                    _ => props.unknown_children.push(read_raw(reader, &e, true)?),
                },
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"pPr" {
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
        writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;

        if let Some(style) = &self.style {
            let mut elem = BytesStart::new("w:pStyle");
            elem.push_attribute(("w:val", style.as_str()));
            writer.write_event(Event::Empty(elem))?;
        }

        // w:sectPr sits after everything except tracked property changes
        let (changes, rest): (Vec<&RawXmlNode>, Vec<&RawXmlNode>) = self
            .unknown_children
            .iter()
            .partition(|c| c.as_element().is_some_and(|e| e.local_name() == "pPrChange"));

        for child in rest {
            child.write_to(writer)?;
        }

        if let Some(section) = &self.section {
            section.write_to(writer)?;
        }

        for child in changes {
            child.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
        Ok(())
    }
}

/// Read runs, hyperlinks and preserved content until the end tag `end`.
///
/// When `properties` is given, a w:pPr child is parsed into it.
fn read_inline_content<R: BufRead>(
    reader: &mut Reader<R>,
    end: &[u8],
    mut properties: Option<&mut Option<ParagraphProperties>>,
) -> Result<Vec<ParagraphContent>> {
    let mut content = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().local_name().as_ref() {
                b"pPr" if properties.is_some() => {
                    if let Some(slot) = properties.as_deref_mut() {
                        *slot = Some(ParagraphProperties::from_reader(reader)?);
                    }
                }
                b"r" => content.push(ParagraphContent::Run(Run::from_reader(reader, &e)?)),
                b"hyperlink" => {
                    content.push(ParagraphContent::Hyperlink(Hyperlink::from_reader(reader, &e)?))
                }
                _ => content.push(ParagraphContent::Unknown(read_raw(reader, &e, false)?)),
            },
            Event::Empty(e) => match e.name().local_name().as_ref() {
                b"r" => content.push(ParagraphContent::Run(Run::from_empty(&e))),
                b"hyperlink" => content.push(ParagraphContent::Hyperlink(Hyperlink {
                    attrs: collect_attrs(&e),
                    content: Vec::new(),
                })),
                _ => content.push(ParagraphContent::Unknown(read_raw(reader, &e, true)?)),
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
