//! Document settings part (settings.xml)
//!
//! Only the document-wide footnote defaults (`w:footnotePr`) are modelled;
//! every other setting is kept as raw XML.

use crate::document::section::{FootnoteProperties, FootnoteProperty};
use crate::error::{Error, Result};
use crate::opc::{rel_types, well_known, PartStore, PartUri, SETTINGS};
use crate::xml::{self, collect_attrs, read_raw, RawXmlNode};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

#[derive(Clone, Debug, PartialEq)]
enum SettingsChild {
    Footnotes(FootnoteProperties),
    Other(RawXmlNode),
}

/// settings children the schema places after w:footnotePr
const AFTER_FOOTNOTE_PR: &[&str] = &[
    "endnotePr",
    "compat",
    "docVars",
    "rsids",
    "mathPr",
    "attachedSchema",
    "themeFontLang",
    "clrSchemeMapping",
    "doNotIncludeSubdocsInStats",
    "doNotAutoCompressPictures",
    "forceUpgrade",
    "captions",
    "readModeInkLockDown",
    "smartTagType",
    "schemaLibrary",
    "shapeDefaults",
    "doNotEmbedSmartTags",
    "decimalSymbol",
    "listSeparator",
];

/// The settings part
#[derive(Clone, Debug)]
pub struct Settings {
    uri: PartUri,
    root_attrs: Vec<(String, String)>,
    children: Vec<SettingsChild>,
    modified: bool,
}

impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.root_attrs == other.root_attrs && self.children == other.children
    }
}

impl Settings {
    /// An empty settings part
    pub fn new_part(uri: PartUri) -> Self {
        Settings {
            uri,
            root_attrs: xml::wordml_namespaces(),
            children: Vec::new(),
            modified: true,
        }
    }

    /// Parse settings.xml content
    pub fn from_xml(uri: PartUri, xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut settings = Settings {
            uri,
            root_attrs: Vec::new(),
            children: Vec::new(),
            modified: false,
        };
        let mut depth = 0;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if depth == 0 => {
                    settings.root_attrs = collect_attrs(&e);
                    depth = 1;
                }
                Event::Empty(e) if depth == 0 => {
                    settings.root_attrs = collect_attrs(&e);
                }
                Event::Start(e) => {
                    let child = match e.name().local_name().as_ref() {
                        b"footnotePr" => {
                            SettingsChild::Footnotes(FootnoteProperties::from_reader(&mut reader, &e)?)
                        }
                        _ => SettingsChild::Other(read_raw(&mut reader, &e, false)?),
                    };
                    settings.children.push(child);
                }
                Event::Empty(e) => {
                    let child = match e.name().local_name().as_ref() {
                        b"footnotePr" => SettingsChild::Footnotes(FootnoteProperties::from_empty(&e)),
                        _ => SettingsChild::Other(read_raw(&mut reader, &e, true)?),
                    };
                    settings.children.push(child);
                }
                Event::End(_) => depth = 0,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(settings)
    }

    /// Serialize to XML
    pub fn to_xml(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let mut writer = Writer::new(&mut buffer);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut start = BytesStart::new("w:settings");
        for (key, value) in &self.root_attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;

        for child in &self.children {
            match child {
                SettingsChild::Footnotes(f) => f.write_to(&mut writer)?,
                SettingsChild::Other(node) => node.write_to(&mut writer)?,
            }
        }

        writer.write_event(Event::End(BytesEnd::new("w:settings")))?;

        String::from_utf8(buffer).map_err(|e| Error::InvalidDocument(e.to_string()))
    }

    /// Document-wide footnote defaults, if the part declares any
    pub fn footnote_properties(&self) -> Option<&FootnoteProperties> {
        self.children.iter().find_map(|c| match c {
            SettingsChild::Footnotes(f) => Some(f),
            SettingsChild::Other(_) => None,
        })
    }

    fn footnote_properties_mut(&mut self) -> Option<&mut FootnoteProperties> {
        self.children.iter_mut().find_map(|c| match c {
            SettingsChild::Footnotes(f) => Some(f),
            SettingsChild::Other(_) => None,
        })
    }

    /// Set one document-wide default. Invalid values leave the part unchanged.
    pub fn set_footnote_property(&mut self, property: FootnoteProperty, value: &str) -> Result<()> {
        let mut updated = self.footnote_properties().cloned().unwrap_or_default();
        updated.set(property, value)?;

        match self.footnote_properties_mut() {
            Some(existing) => *existing = updated,
            None => {
                let slot = self
                    .children
                    .iter()
                    .position(|c| match c {
                        SettingsChild::Other(node) => node
                            .as_element()
                            .is_some_and(|e| AFTER_FOOTNOTE_PR.contains(&e.local_name())),
                        SettingsChild::Footnotes(_) => false,
                    })
                    .unwrap_or(self.children.len());
                self.children.insert(slot, SettingsChild::Footnotes(updated));
            }
        }
        self.modified = true;
        Ok(())
    }

    /// Remove one document-wide default
    pub fn clear_footnote_property(&mut self, property: FootnoteProperty) {
        if let Some(props) = self.footnote_properties_mut() {
            props.clear(property);
            if props.is_empty() {
                self.children
                    .retain(|c| !matches!(c, SettingsChild::Footnotes(_)));
            }
            self.modified = true;
        }
    }

    /// Load the settings part related to the main document, if any
    pub fn load<S: PartStore + ?Sized>(store: &S, main: &PartUri) -> Result<Option<Self>> {
        let uri = match store.related_part_uri(main, rel_types::SETTINGS) {
            Ok(uri) => uri,
            Err(Error::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let data = store.get_part(&uri).map_err(|_| {
            Error::Malformed(format!("settings relationship targets missing part {}", uri))
        })?;
        Self::from_xml(uri, std::str::from_utf8(data)?).map(Some)
    }

    /// Create the settings part and its relationship from the main document
    pub fn create_part<S: PartStore + ?Sized>(store: &mut S, main: &PartUri) -> Result<Self> {
        if !store.has_part(main) {
            return Err(Error::PartNotFound(main.to_string()));
        }
        let uri = well_known::settings();
        if store.has_part(&uri) {
            return Err(Error::Malformed(format!("{} already exists", uri)));
        }
        let settings = Self::new_part(uri.clone());
        store.put_part(uri.clone(), SETTINGS, settings.to_xml()?.into_bytes());
        store.add_relationship(main, &uri, rel_types::SETTINGS)?;
        log::debug!("created settings part {}", uri);
        Ok(settings)
    }

    /// Write the model back into the store if it changed
    pub fn store<S: PartStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        if !self.modified {
            return Ok(());
        }
        store.put_part(self.uri.clone(), SETTINGS, self.to_xml()?.into_bytes());
        self.modified = false;
        log::debug!("serialized settings part {}", self.uri);
        Ok(())
    }
}
