//! `[Content_Types].xml`: extension defaults and per-part overrides

use crate::error::{Error, Result};
use crate::opc::PartUri;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;

const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const XML: &str = "application/xml";
pub const MAIN_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub const FOOTNOTES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footnotes+xml";
pub const SETTINGS: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";

#[derive(Clone, Debug, Default)]
pub struct ContentTypes {
    /// lowercase extension -> content type
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<PartUri, String>,
}

impl ContentTypes {
    /// Defaults for `.rels` and `.xml`, no overrides
    pub fn new() -> Self {
        let mut types = Self::default();
        types.defaults.insert("rels".into(), RELATIONSHIPS.into());
        types.defaults.insert("xml".into(), XML.into());
        types
    }

    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut types = Self::default();
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => match e.name().local_name().as_ref() {
                    b"Default" => {
                        let extension = required_attr(&e, "Extension")?.to_lowercase();
                        types
                            .defaults
                            .insert(extension, required_attr(&e, "ContentType")?);
                    }
                    b"Override" => {
                        let uri = PartUri::new(&required_attr(&e, "PartName")?)?;
                        types
                            .overrides
                            .insert(uri, required_attr(&e, "ContentType")?);
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(types)
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let mut writer = Writer::new(&mut buffer);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut root = BytesStart::new("Types");
        root.push_attribute(("xmlns", NS_CONTENT_TYPES));
        writer.write_event(Event::Start(root))?;

        for (extension, content_type) in &self.defaults {
            let mut elem = BytesStart::new("Default");
            elem.push_attribute(("Extension", extension.as_str()));
            elem.push_attribute(("ContentType", content_type.as_str()));
            writer.write_event(Event::Empty(elem))?;
        }
        for (uri, content_type) in &self.overrides {
            let mut elem = BytesStart::new("Override");
            elem.push_attribute(("PartName", uri.as_str()));
            elem.push_attribute(("ContentType", content_type.as_str()));
            writer.write_event(Event::Empty(elem))?;
        }

        writer.write_event(Event::End(BytesEnd::new("Types")))?;
        String::from_utf8(buffer).map_err(|e| Error::InvalidDocument(e.to_string()))
    }

    pub fn add_override(&mut self, uri: &PartUri, content_type: &str) {
        self.overrides.insert(uri.clone(), content_type.to_string());
    }

    /// Override for the part, else the default for its extension
    pub fn get(&self, uri: &PartUri) -> Option<&str> {
        self.overrides
            .get(uri)
            .or_else(|| {
                let extension = uri.extension()?.to_lowercase();
                self.defaults.get(&extension)
            })
            .map(String::as_str)
    }

    /// Parts with an override of exactly this content type
    pub fn parts_with_type<'a>(
        &'a self,
        content_type: &'a str,
    ) -> impl Iterator<Item = &'a PartUri> + 'a {
        self.overrides
            .iter()
            .filter(move |(_, ct)| ct.as_str() == content_type)
            .map(|(uri, _)| uri)
    }
}

fn required_attr(element: &BytesStart, name: &str) -> Result<String> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(attr.unescape_value()?.into_owned());
        }
    }
    Err(Error::MissingAttribute {
        element: String::from_utf8_lossy(element.name().as_ref()).into_owned(),
        attr: name.to_string(),
    })
}
