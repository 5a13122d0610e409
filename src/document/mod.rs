//! Document model - high-level API for DOCX documents with footnotes

mod body;
mod footnotes;
mod options;
mod paragraph;
mod reference;
mod run;
pub mod section;
mod settings;

pub use body::{BlockContent, Body};
pub use footnotes::{
    Footnote, FootnoteId, FootnoteKind, Footnotes, CONTINUATION_SEPARATOR_ID, FIRST_USER_ID,
    SEPARATOR_ID,
};
pub use options::FootnoteOptions;
pub use paragraph::{Hyperlink, Paragraph, ParagraphContent, ParagraphProperties};
pub use reference::{add_reference, FootnoteReference};
pub use run::{Run, RunContent, RunProperties};
pub use section::{
    EffectiveFootnoteProperties, FootnotePosition, FootnoteProperties, FootnoteProperty,
    NumberFormat, RestartLocation, SectionProperties,
};
pub use settings::Settings;

use crate::error::{Error, Result};
use crate::opc::{rel_types, well_known, Package, PartStore, PartUri, MAIN_DOCUMENT};
use crate::xml::{self, collect_attrs, read_raw, RawXmlNode};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::path::Path;

/// A DOCX document
#[derive(Debug)]
pub struct Document {
    /// Underlying OPC package
    package: Package,
    /// URI of the main document part
    main_uri: PartUri,
    /// w:document root and everything in it besides the body
    root: DocumentRoot,
    /// Parsed document body
    body: Body,
    /// Footnotes part, once it exists
    footnotes: Option<Footnotes>,
    /// Settings part, if the document has one
    settings: Option<Settings>,
    /// Styles applied to generated footnote content
    options: FootnoteOptions,
}

/// Parts of document.xml outside w:body
#[derive(Clone, Debug, Default, PartialEq)]
struct DocumentRoot {
    attrs: Vec<(String, String)>,
    /// Root children before the body (w:background)
    leading: Vec<RawXmlNode>,
    /// Root children after the body
    trailing: Vec<RawXmlNode>,
}

impl Document {
    /// Open a document from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let package = Package::open(path)?;
        Self::from_package(package)
    }

    /// Open a document from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package = Package::from_bytes(bytes)?;
        Self::from_package(package)
    }

    /// Create document from an OPC package.
    ///
    /// Fails with `Malformed` when the footnotes part, its relationship and the
    /// markers in the body do not agree.
    pub fn from_package(package: Package) -> Result<Self> {
        let main_uri = package
            .main_document_uri()
            .ok_or_else(|| Error::MissingPart("Main document part not found".into()))?;

        let xml = std::str::from_utf8(package.get_part(&main_uri)?)?;
        let (root, body) = parse_document_xml(xml)?;

        let footnotes = Footnotes::load(&package, &main_uri)?;
        let settings = Settings::load(&package, &main_uri)?;

        body.check_preserved_references()?;
        if let Some(id) = body
            .footnote_references()
            .into_iter()
            .find(|id| !footnotes.as_ref().is_some_and(|f| f.contains(*id)))
        {
            return Err(Error::Malformed(format!(
                "reference marker targets missing footnote {}",
                id
            )));
        }

        Ok(Self {
            package,
            main_uri,
            root,
            body,
            footnotes,
            settings,
            options: FootnoteOptions::default(),
        })
    }

    /// Create a new empty document
    pub fn new() -> Self {
        let mut package = Package::new();
        let main_uri = well_known::document();
        // Placeholder bytes; the real XML is written on save
        package.put_part(main_uri.clone(), MAIN_DOCUMENT, Vec::new());
        package.add_package_relationship(rel_types::OFFICE_DOCUMENT, main_uri.zip_path());

        Self {
            package,
            main_uri,
            root: DocumentRoot {
                attrs: xml::wordml_namespaces(),
                ..Default::default()
            },
            body: Body::default(),
            footnotes: None,
            settings: None,
            options: FootnoteOptions::default(),
        }
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.update_package()?;
        self.package.save(path)
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.update_package()?;
        self.package.to_bytes()
    }

    /// Write the models back into the package
    fn update_package(&mut self) -> Result<()> {
        let xml = serialize_document_xml(&self.root, &self.body)?;
        let content_type = self
            .package
            .content_types()
            .get(&self.main_uri)
            .unwrap_or(MAIN_DOCUMENT)
            .to_string();
        self.package
            .put_part(self.main_uri.clone(), &content_type, xml.into_bytes());

        if let Some(footnotes) = &mut self.footnotes {
            footnotes.store(&mut self.package)?;
        }
        if let Some(settings) = &mut self.settings {
            settings.store(&mut self.package)?;
        }
        Ok(())
    }

    /// Get the underlying package
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Get the body
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Styles used for generated footnote content
    pub fn footnote_options(&self) -> &FootnoteOptions {
        &self.options
    }

    /// Replace the styles used for generated footnote content
    pub fn set_footnote_options(&mut self, options: FootnoteOptions) {
        self.options = options;
    }

    // === Paragraphs ===

    /// Get all paragraphs
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.paragraphs()
    }

    /// Get paragraph count
    pub fn paragraph_count(&self) -> usize {
        self.body.paragraphs().count()
    }

    /// Get paragraph by index
    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.body.paragraphs().nth(index)
    }

    /// Get paragraph by index, mutably
    pub fn paragraph_mut(&mut self, index: usize) -> Option<&mut Paragraph> {
        self.body.paragraphs_mut().nth(index)
    }

    /// Add a paragraph with text
    pub fn add_paragraph(&mut self, text: impl Into<String>) -> &mut Paragraph {
        self.body.add_paragraph(Paragraph::new(text))
    }

    /// Add an empty paragraph
    pub fn add_empty_paragraph(&mut self) -> &mut Paragraph {
        self.body.add_paragraph(Paragraph::default())
    }

    /// Get all text in the document
    pub fn text(&self) -> String {
        self.body
            .paragraphs()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    // === Footnotes ===

    /// Whether the document has a footnotes part
    pub fn has_footnotes_part(&self) -> bool {
        self.footnotes.is_some()
    }

    /// The footnotes part, if it exists
    pub fn footnote_registry(&self) -> Option<&Footnotes> {
        self.footnotes.as_ref()
    }

    /// Create an empty footnote and return its id.
    ///
    /// The first call on a document without footnotes creates the footnotes
    /// part with its separators and the relationship to it.
    pub fn create_footnote(&mut self) -> Result<FootnoteId> {
        let footnotes = match self.footnotes.take() {
            Some(footnotes) => footnotes,
            None => Footnotes::create_part(&mut self.package, &self.main_uri)?,
        };
        self.footnotes.insert(footnotes).create()
    }

    /// Get a footnote by id, separators included
    pub fn footnote(&self, id: FootnoteId) -> Result<&Footnote> {
        match &self.footnotes {
            Some(footnotes) => footnotes.get(id),
            None => Err(Error::NotFound(format!("footnote {}", id))),
        }
    }

    /// Footnotes in part order. Separators are listed only with `include_reserved`.
    pub fn footnotes(&self, include_reserved: bool) -> impl Iterator<Item = &Footnote> {
        self.footnotes
            .iter()
            .flat_map(move |f| f.list(include_reserved))
    }

    /// Append a paragraph of text to a footnote
    pub fn append_footnote_paragraph(
        &mut self,
        id: FootnoteId,
        text: &str,
    ) -> Result<&mut Paragraph> {
        match &mut self.footnotes {
            Some(footnotes) => footnotes.append_paragraph(id, text, &self.options),
            None => Err(Error::NotFound(format!("footnote {}", id))),
        }
    }

    /// Delete a footnote that no marker targets any more
    pub fn delete_footnote(&mut self, id: FootnoteId) -> Result<Footnote> {
        let footnotes = self
            .footnotes
            .as_mut()
            .ok_or_else(|| Error::NotFound(format!("footnote {}", id)))?;
        if !footnotes.contains(id) {
            return Err(Error::NotFound(format!("footnote {}", id)));
        }

        let count = self
            .body
            .footnote_references()
            .into_iter()
            .filter(|r| *r == id)
            .count();
        if count > 0 {
            return Err(Error::Referenced { id, count });
        }

        footnotes.remove(id)
    }

    /// Append a marker for footnote `id` to the paragraph at `paragraph_index`
    pub fn add_footnote_reference(
        &mut self,
        paragraph_index: usize,
        id: FootnoteId,
    ) -> Result<FootnoteReference> {
        let paragraph = self
            .body
            .paragraphs_mut()
            .nth(paragraph_index)
            .ok_or_else(|| Error::NotFound(format!("paragraph {}", paragraph_index)))?;
        add_reference(paragraph, self.footnotes.as_ref(), id, &self.options)
    }

    /// Every marker in body paragraphs as (paragraph index, footnote id), in document order
    pub fn footnote_references(&self) -> impl Iterator<Item = (usize, FootnoteId)> + '_ {
        self.body
            .paragraphs()
            .enumerate()
            .flat_map(|(i, p)| p.footnote_references().map(move |id| (i, id)))
    }

    // === Sections ===

    /// Number of sections: one per section-break paragraph plus the final one
    pub fn section_count(&self) -> usize {
        self.body.paragraphs().filter(|p| p.section().is_some()).count() + 1
    }

    /// Section properties of section `index`; `None` when the final section
    /// has no w:sectPr yet
    pub fn section(&self, index: usize) -> Result<Option<&SectionProperties>> {
        let breaks = self.section_count() - 1;
        if index < breaks {
            Ok(self.body.paragraphs().filter_map(|p| p.section()).nth(index))
        } else if index == breaks {
            Ok(self.body.section_properties.as_ref())
        } else {
            Err(section_not_found(index))
        }
    }

    fn section_mut(&mut self, index: usize) -> Result<&mut SectionProperties> {
        let breaks = self.section_count() - 1;
        if index < breaks {
            self.body
                .paragraphs_mut()
                .filter_map(|p| p.section_mut())
                .nth(index)
                .ok_or_else(|| section_not_found(index))
        } else if index == breaks {
            Ok(self.body.section_properties.get_or_insert_with(Default::default))
        } else {
            Err(section_not_found(index))
        }
    }

    /// Effective footnote properties of a section after inheritance
    pub fn section_footnote_properties(&self, index: usize) -> Result<EffectiveFootnoteProperties> {
        let own = self.section(index)?.and_then(|s| s.footnote_properties());
        Ok(FootnoteProperties::resolve(own, self.footnote_defaults()))
    }

    /// Override one footnote property on a section
    pub fn set_section_footnote_property(
        &mut self,
        index: usize,
        property: FootnoteProperty,
        value: &str,
    ) -> Result<()> {
        self.section_mut(index)?.set_footnote_property(property, value)?;
        log::debug!("section {}: set {} = {}", index, property, value);
        Ok(())
    }

    /// Drop a section's override so the property is inherited again
    pub fn clear_section_footnote_property(
        &mut self,
        index: usize,
        property: FootnoteProperty,
    ) -> Result<()> {
        let breaks = self.section_count() - 1;
        let section = if index < breaks {
            self.body
                .paragraphs_mut()
                .filter_map(|p| p.section_mut())
                .nth(index)
        } else if index == breaks {
            // Clearing never creates the final w:sectPr
            self.body.section_properties.as_mut()
        } else {
            return Err(section_not_found(index));
        };
        if let Some(section) = section {
            section.clear_footnote_property(property);
        }
        Ok(())
    }

    fn footnote_defaults(&self) -> Option<&FootnoteProperties> {
        self.settings.as_ref()?.footnote_properties()
    }

    /// Document-wide footnote defaults after falling back to built-in values
    pub fn default_footnote_properties(&self) -> EffectiveFootnoteProperties {
        FootnoteProperties::resolve(None, self.footnote_defaults())
    }

    /// Set a document-wide footnote default, creating the settings part if needed
    pub fn set_default_footnote_property(
        &mut self,
        property: FootnoteProperty,
        value: &str,
    ) -> Result<()> {
        // Validate before the settings part may be created
        FootnoteProperties::new().set(property, value)?;

        let settings = match self.settings.take() {
            Some(settings) => settings,
            None => Settings::create_part(&mut self.package, &self.main_uri)?,
        };
        self.settings
            .insert(settings)
            .set_footnote_property(property, value)?;
        log::debug!("default footnote {} = {}", property, value);
        Ok(())
    }

    /// Remove a document-wide footnote default
    pub fn clear_default_footnote_property(&mut self, property: FootnoteProperty) {
        if let Some(settings) = &mut self.settings {
            settings.clear_footnote_property(property);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn section_not_found(index: usize) -> Error {
    Error::NotFound(format!("section {}", index))
}

/// Parse document.xml content
fn parse_document_xml(xml: &str) -> Result<(DocumentRoot, Body)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut root = DocumentRoot::default();
    let mut body = None;
    let mut in_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if !in_root => {
                root.attrs = collect_attrs(&e);
                in_root = true;
            }
            Event::Start(e) => match e.name().local_name().as_ref() {
                b"body" if body.is_none() => body = Some(Body::from_reader(&mut reader, &e)?),
                _ => {
                    let node = read_raw(&mut reader, &e, false)?;
                    root_slot(&mut root, body.is_some()).push(node);
                }
            },
            Event::Empty(e) if in_root => match e.name().local_name().as_ref() {
                b"body" if body.is_none() => {
                    body = Some(Body {
                        attrs: collect_attrs(&e),
                        ..Default::default()
                    })
                }
                _ => {
                    let node = read_raw(&mut reader, &e, true)?;
                    root_slot(&mut root, body.is_some()).push(node);
                }
            },
            Event::End(_) => in_root = false,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let body = body.ok_or_else(|| Error::InvalidDocument("Missing w:body element".into()))?;
    Ok((root, body))
}

fn root_slot(root: &mut DocumentRoot, after_body: bool) -> &mut Vec<RawXmlNode> {
    if after_body {
        &mut root.trailing
    } else {
        &mut root.leading
    }
}

/// Serialize to document.xml content
fn serialize_document_xml(root: &DocumentRoot, body: &Body) -> Result<String> {
    let mut buffer = Vec::new();
    let mut writer = Writer::new(&mut buffer);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut start = BytesStart::new("w:document");
    for (key, value) in &root.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(start))?;

    for node in &root.leading {
        node.write_to(&mut writer)?;
    }
    body.write_to(&mut writer)?;
    for node in &root.trailing {
        node.write_to(&mut writer)?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:document")))?;

    String::from_utf8(buffer).map_err(|e| Error::InvalidDocument(e.to_string()))
}
