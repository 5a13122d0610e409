//! Footnotes part (footnotes.xml)
//!
//! Holds every `w:footnote` of the document keyed by id, allocates ids for new
//! footnotes and keeps the part and its relationship from the main document in
//! step.

use crate::document::body::read_blocks;
use crate::document::{BlockContent, FootnoteOptions, Paragraph, Run, RunContent};
use crate::error::{Error, Result};
use crate::opc::{rel_types, well_known, PartStore, PartUri, TargetMode, FOOTNOTES};
use crate::xml::{self, collect_attrs, get_w_attr, read_raw, RawXmlNode};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

/// Footnote identifier (`w:id`)
pub type FootnoteId = i32;

/// Id of the separator footnote in parts created here
pub const SEPARATOR_ID: FootnoteId = 0;
/// Id of the continuation separator footnote in parts created here
pub const CONTINUATION_SEPARATOR_ID: FootnoteId = 1;
/// Lowest id handed out to user footnotes
pub const FIRST_USER_ID: FootnoteId = 2;

/// Footnote type (`w:type`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FootnoteKind {
    /// Regular footnote with user content
    #[default]
    Normal,
    /// Line drawn between body text and footnotes
    Separator,
    /// Line drawn above footnotes continued from a previous page
    ContinuationSeparator,
    /// Notice shown when a footnote continues on the next page
    ContinuationNotice,
}

impl FootnoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FootnoteKind::Normal => "normal",
            FootnoteKind::Separator => "separator",
            FootnoteKind::ContinuationSeparator => "continuationSeparator",
            FootnoteKind::ContinuationNotice => "continuationNotice",
        }
    }
}

impl FromStr for FootnoteKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(FootnoteKind::Normal),
            "separator" => Ok(FootnoteKind::Separator),
            "continuationSeparator" => Ok(FootnoteKind::ContinuationSeparator),
            "continuationNotice" => Ok(FootnoteKind::ContinuationNotice),
            other => Err(Error::invalid_value("footnote type", other)),
        }
    }
}

impl fmt::Display for FootnoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single footnote (w:footnote)
#[derive(Clone, Debug, PartialEq)]
pub struct Footnote {
    id: FootnoteId,
    kind: FootnoteKind,
    /// Attributes in source order, w:id and w:type included
    attrs: Vec<(String, String)>,
    /// Block content (paragraphs and preserved elements)
    pub content: Vec<BlockContent>,
}

impl Footnote {
    fn new(id: FootnoteId, kind: FootnoteKind) -> Self {
        let mut attrs = Vec::new();
        if kind != FootnoteKind::Normal {
            attrs.push(("w:type".to_string(), kind.as_str().to_string()));
        }
        attrs.push(("w:id".to_string(), id.to_string()));
        Footnote {
            id,
            kind,
            attrs,
            content: Vec::new(),
        }
    }

    /// A separator-type footnote holding one paragraph with `mark`
    fn separator(id: FootnoteId, kind: FootnoteKind, mark: RunContent) -> Self {
        let mut footnote = Footnote::new(id, kind);
        let mut para = Paragraph::default();
        para.add_run(Run {
            content: vec![mark],
            ..Default::default()
        });
        footnote.content.push(BlockContent::Paragraph(para));
        footnote
    }

    fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut footnote = Self::from_start(start)?;
        footnote.content = read_blocks(reader, b"footnote", None)?;
        Ok(footnote)
    }

    fn from_start(start: &BytesStart) -> Result<Self> {
        let id = get_w_attr(start, "id")
            .ok_or_else(|| Error::Malformed("footnote without w:id".into()))?;
        let id = id
            .trim()
            .parse()
            .map_err(|_| Error::Malformed(format!("footnote id '{}' is not an integer", id)))?;
        let kind = match get_w_attr(start, "type") {
            Some(value) => value.parse().unwrap_or_else(|_| {
                log::warn!("footnote {} has unknown type '{}', treating as normal", id, value);
                FootnoteKind::Normal
            }),
            None => FootnoteKind::Normal,
        };
        Ok(Footnote {
            id,
            kind,
            attrs: collect_attrs(start),
            content: Vec::new(),
        })
    }

    /// Footnote id
    pub fn id(&self) -> FootnoteId {
        self.id
    }

    /// Footnote type
    pub fn kind(&self) -> FootnoteKind {
        self.kind
    }

    /// Whether `w:type` marks this as a separator or notice entry
    pub fn is_special(&self) -> bool {
        self.kind != FootnoteKind::Normal
    }

    /// Paragraphs of the footnote body
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(|c| match c {
            BlockContent::Paragraph(p) => Some(p),
            BlockContent::Unknown(_) => None,
        })
    }

    /// Paragraph texts joined with newlines
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn has_number_mark(&self) -> bool {
        self.paragraphs()
            .flat_map(|p| p.runs())
            .any(|r| r.content.contains(&RunContent::FootnoteRef))
    }

    /// A body made of one empty paragraph is a placeholder
    fn is_placeholder(&self) -> bool {
        matches!(self.content.as_slice(), [BlockContent::Paragraph(p)] if *p == Paragraph::default())
    }

    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:footnote");
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;

        if self.content.is_empty() {
            // A footnote needs at least one paragraph
            Paragraph::default().write_to(writer)?;
        }
        for content in &self.content {
            content.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:footnote")))?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Entry {
    Footnote(Footnote),
    Other(RawXmlNode),
}

/// The footnotes part: every footnote of the document in part order
#[derive(Clone, Debug)]
pub struct Footnotes {
    uri: PartUri,
    /// Attributes of w:footnotes (namespace declarations, mc:Ignorable)
    root_attrs: Vec<(String, String)>,
    entries: Vec<Entry>,
    /// `None` once the highest id is `FootnoteId::MAX`
    next_id: Option<FootnoteId>,
    modified: bool,
}

impl PartialEq for Footnotes {
    fn eq(&self, other: &Self) -> bool {
        self.root_attrs == other.root_attrs && self.entries == other.entries
    }
}

impl Footnotes {
    /// A fresh part holding only the separator and continuation separator
    pub fn new_part(uri: PartUri) -> Self {
        Footnotes {
            uri,
            root_attrs: xml::wordml_namespaces(),
            entries: vec![
                Entry::Footnote(Footnote::separator(
                    SEPARATOR_ID,
                    FootnoteKind::Separator,
                    RunContent::Separator,
                )),
                Entry::Footnote(Footnote::separator(
                    CONTINUATION_SEPARATOR_ID,
                    FootnoteKind::ContinuationSeparator,
                    RunContent::ContinuationSeparator,
                )),
            ],
            next_id: Some(FIRST_USER_ID),
            modified: true,
        }
    }

    /// Parse footnotes.xml content
    pub fn from_xml(uri: PartUri, xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut footnotes = Footnotes {
            uri,
            root_attrs: Vec::new(),
            entries: Vec::new(),
            next_id: Some(FIRST_USER_ID),
            modified: false,
        };
        let mut seen = HashSet::new();
        let mut in_root = false;
        let mut found_root = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if !in_root => {
                    if e.name().local_name().as_ref() != b"footnotes" {
                        return Err(Error::Malformed(format!(
                            "footnotes part root is <{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        )));
                    }
                    footnotes.root_attrs = collect_attrs(&e);
                    in_root = true;
                    found_root = true;
                }
                Event::Empty(e) if !in_root && !found_root => {
                    footnotes.root_attrs = collect_attrs(&e);
                    found_root = true;
                }
                Event::Start(e) => {
                    let entry = match e.name().local_name().as_ref() {
                        b"footnote" => Entry::Footnote(Footnote::from_reader(&mut reader, &e)?),
                        _ => Entry::Other(read_raw(&mut reader, &e, false)?),
                    };
                    footnotes.insert_entry(entry, &mut seen)?;
                }
                Event::Empty(e) => {
                    let entry = match e.name().local_name().as_ref() {
                        b"footnote" => Entry::Footnote(Footnote::from_start(&e)?),
                        _ => Entry::Other(read_raw(&mut reader, &e, true)?),
                    };
                    footnotes.insert_entry(entry, &mut seen)?;
                }
                Event::End(e) if e.name().local_name().as_ref() == b"footnotes" => {
                    in_root = false;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !found_root {
            return Err(Error::Malformed("footnotes part has no w:footnotes root".into()));
        }
        Ok(footnotes)
    }

    fn insert_entry(&mut self, entry: Entry, seen: &mut HashSet<FootnoteId>) -> Result<()> {
        if let Entry::Footnote(footnote) = &entry {
            if !seen.insert(footnote.id) {
                return Err(Error::Malformed(format!("duplicate footnote id {}", footnote.id)));
            }
            self.next_id = match (self.next_id, footnote.id.checked_add(1)) {
                (Some(next), Some(after)) => Some(next.max(after)),
                _ => None,
            };
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Serialize to XML
    pub fn to_xml(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let mut writer = Writer::new(&mut buffer);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut start = BytesStart::new("w:footnotes");
        for (key, value) in &self.root_attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;

        for entry in &self.entries {
            match entry {
                Entry::Footnote(footnote) => footnote.write_to(&mut writer)?,
                Entry::Other(node) => node.write_to(&mut writer)?,
            }
        }

        writer.write_event(Event::End(BytesEnd::new("w:footnotes")))?;

        String::from_utf8(buffer).map_err(|e| Error::InvalidDocument(e.to_string()))
    }

    /// URI of the part
    pub fn uri(&self) -> &PartUri {
        &self.uri
    }

    /// Id the next created footnote will get, `None` when ids are exhausted
    pub fn next_id(&self) -> Option<FootnoteId> {
        self.next_id
    }

    /// Whether the model changed since load
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Allocate an id and add an empty footnote under it
    pub fn create(&mut self) -> Result<FootnoteId> {
        let id = self.next_id.ok_or(Error::IdsExhausted(FootnoteId::MAX))?;
        self.next_id = id.checked_add(1);
        self.entries
            .push(Entry::Footnote(Footnote::new(id, FootnoteKind::Normal)));
        self.modified = true;
        log::debug!("created footnote {}", id);
        Ok(id)
    }

    /// Whether a footnote with this id exists
    pub fn contains(&self, id: FootnoteId) -> bool {
        self.iter().any(|f| f.id == id)
    }

    /// Get a footnote by id, reserved ones included
    pub fn get(&self, id: FootnoteId) -> Result<&Footnote> {
        self.iter()
            .find(|f| f.id == id)
            .ok_or_else(|| not_found(id))
    }

    fn get_mut(&mut self, id: FootnoteId) -> Result<&mut Footnote> {
        self.entries
            .iter_mut()
            .find_map(|e| match e {
                Entry::Footnote(f) if f.id == id => Some(f),
                _ => None,
            })
            .ok_or_else(|| not_found(id))
    }

    /// All footnotes in part order
    pub fn iter(&self) -> impl Iterator<Item = &Footnote> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Footnote(f) => Some(f),
            Entry::Other(_) => None,
        })
    }

    /// Whether `footnote` is one of the part's built-in entries rather than
    /// user content.
    ///
    /// Typed entries always are. Untyped ids 0 and 1 only count when the part
    /// has no typed entries at all; Word numbers its separators -1 and 0 and
    /// gives id 1 to the first user footnote.
    pub fn is_reserved(&self, footnote: &Footnote) -> bool {
        footnote.is_special() || (self.ids_reserved_by_number() && reserved_number(footnote.id))
    }

    fn ids_reserved_by_number(&self) -> bool {
        !self.iter().any(Footnote::is_special)
    }

    /// Footnotes in part order, hiding separators unless `include_reserved`
    pub fn list(&self, include_reserved: bool) -> impl Iterator<Item = &Footnote> {
        let by_number = self.ids_reserved_by_number();
        self.iter().filter(move |f| {
            include_reserved || !(f.is_special() || (by_number && reserved_number(f.id)))
        })
    }

    /// Append a paragraph holding `text` to a footnote.
    ///
    /// The paragraph gets the configured text style. If the footnote has no
    /// number mark yet, the paragraph starts with one.
    pub fn append_paragraph(
        &mut self,
        id: FootnoteId,
        text: &str,
        options: &FootnoteOptions,
    ) -> Result<&mut Paragraph> {
        if !self.contains(id) {
            return Err(not_found(id));
        }
        self.modified = true;
        let footnote = self.get_mut(id)?;

        let mut para = Paragraph::default();
        if let Some(style) = &options.text_style {
            para.set_style(style.clone());
        }
        if footnote.kind == FootnoteKind::Normal && !footnote.has_number_mark() {
            para.add_run(Run::mark(
                RunContent::FootnoteRef,
                options.reference_style.as_deref(),
            ));
        }
        if !text.is_empty() {
            para.add_run(Run::new(text));
        }

        if footnote.is_placeholder() {
            footnote.content.clear();
        }
        footnote.content.push(BlockContent::Paragraph(para));

        match footnote.content.last_mut() {
            Some(BlockContent::Paragraph(p)) => Ok(p),
            _ => unreachable!("a paragraph was just pushed"),
        }
    }

    /// Remove a user footnote. Marker bookkeeping is the caller's job.
    pub(crate) fn remove(&mut self, id: FootnoteId) -> Result<Footnote> {
        let index = self
            .entries
            .iter()
            .position(|e| matches!(e, Entry::Footnote(f) if f.id == id))
            .ok_or_else(|| not_found(id))?;
        match &self.entries[index] {
            Entry::Footnote(f) if self.is_reserved(f) => {
                return Err(Error::invalid_value("footnote id", id.to_string()))
            }
            _ => {}
        }
        self.modified = true;
        log::debug!("deleted footnote {}", id);
        match self.entries.remove(index) {
            Entry::Footnote(f) => Ok(f),
            Entry::Other(_) => unreachable!("position matched a footnote"),
        }
    }

    /// Load the footnotes part related to the main document, if any.
    ///
    /// Fails with `Malformed` when the part and its relationship disagree.
    pub fn load<S: PartStore + ?Sized>(store: &S, main: &PartUri) -> Result<Option<Self>> {
        let rels = store.relationships_of_type(main, rel_types::FOOTNOTES);
        if rels.len() > 1 {
            return Err(Error::Malformed(format!(
                "{} footnotes relationships from {}",
                rels.len(),
                main
            )));
        }

        let related = match rels.first() {
            Some(rel) if rel.target_mode == TargetMode::External => {
                return Err(Error::Malformed(format!(
                    "footnotes relationship {} points outside the package",
                    rel.id
                )))
            }
            Some(rel) => Some(main.resolve(&rel.target)?),
            None => None,
        };

        let mut candidates = store.part_uris_with_type(FOOTNOTES);
        let default_uri = well_known::footnotes();
        if store.has_part(&default_uri) && !candidates.contains(&default_uri) {
            candidates.push(default_uri);
        }
        if let Some(orphan) = candidates.iter().find(|c| Some(*c) != related.as_ref()) {
            return Err(Error::Malformed(format!(
                "footnotes part {} has no relationship from {}",
                orphan, main
            )));
        }

        let Some(uri) = related else {
            return Ok(None);
        };
        let data = store.get_part(&uri).map_err(|_| {
            Error::Malformed(format!("footnotes relationship targets missing part {}", uri))
        })?;
        let footnotes = Self::from_xml(uri, std::str::from_utf8(data)?)?;
        log::debug!(
            "loaded {} footnotes from {}",
            footnotes.iter().count(),
            footnotes.uri
        );
        Ok(Some(footnotes))
    }

    /// Create the footnotes part and its relationship from the main document.
    ///
    /// Both are created or neither is.
    pub fn create_part<S: PartStore + ?Sized>(store: &mut S, main: &PartUri) -> Result<Self> {
        if !store.has_part(main) {
            return Err(Error::PartNotFound(main.to_string()));
        }
        let uri = well_known::footnotes();
        if store.has_part(&uri) {
            return Err(Error::Malformed(format!("{} already exists", uri)));
        }
        let mut footnotes = Self::new_part(uri.clone());
        store.put_part(uri.clone(), FOOTNOTES, footnotes.to_xml()?.into_bytes());
        store.add_relationship(main, &uri, rel_types::FOOTNOTES)?;
        footnotes.modified = false;
        log::debug!("created footnotes part {}", uri);
        Ok(footnotes)
    }

    /// Write the model back into the store if it changed
    pub fn store<S: PartStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        if !self.modified {
            return Ok(());
        }
        let xml = self.to_xml()?;
        store.put_part(self.uri.clone(), FOOTNOTES, xml.into_bytes());
        self.modified = false;
        log::debug!("serialized footnotes part {}", self.uri);
        Ok(())
    }
}

fn reserved_number(id: FootnoteId) -> bool {
    id == SEPARATOR_ID || id == CONTINUATION_SEPARATOR_ID
}

fn not_found(id: FootnoteId) -> Error {
    Error::NotFound(format!("footnote {}", id))
}
