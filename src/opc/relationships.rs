//! `.rels` parts: the typed links between a source part and its targets

use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

const NS_PACKAGE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship types this crate follows from the main document
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const SETTINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
    pub const FOOTNOTES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footnotes";
}

/// Whether a relationship points into the package or outside it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetMode {
    #[default]
    Internal,
    External,
}

/// One `Relationship` entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    /// e.g. "rId3"
    pub id: String,
    pub rel_type: String,
    /// Relative to the source part's folder unless external
    pub target: String,
    pub target_mode: TargetMode,
}

impl Relationship {
    fn from_element(element: &BytesStart) -> Result<Self> {
        let (mut id, mut rel_type, mut target) = (None, None, None);
        let mut target_mode = TargetMode::Internal;

        for attr in element.attributes() {
            let attr = attr?;
            let value = attr.unescape_value()?.into_owned();
            match attr.key.local_name().as_ref() {
                b"Id" => id = Some(value),
                b"Type" => rel_type = Some(value),
                b"Target" => target = Some(value),
                b"TargetMode" if value == "External" => target_mode = TargetMode::External,
                _ => {}
            }
        }

        let required = |value: Option<String>, attr: &str| {
            value.ok_or_else(|| Error::MissingAttribute {
                element: "Relationship".into(),
                attr: attr.into(),
            })
        };

        Ok(Relationship {
            id: required(id, "Id")?,
            rel_type: required(rel_type, "Type")?,
            target: required(target, "Target")?,
            target_mode,
        })
    }
}

/// The relationships of one source part, in source order
#[derive(Clone, Debug, Default)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part. Duplicate ids are rejected.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut rels = Self::new();
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e)
                    if e.name().local_name().as_ref() == b"Relationship" =>
                {
                    let rel = Relationship::from_element(&e)?;
                    if rels.get(&rel.id).is_some() {
                        return Err(Error::InvalidDocument(format!(
                            "duplicate relationship id '{}'",
                            rel.id
                        )));
                    }
                    rels.items.push(rel);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(rels)
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let mut writer = Writer::new(&mut buffer);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut root = BytesStart::new("Relationships");
        root.push_attribute(("xmlns", NS_PACKAGE_RELATIONSHIPS));
        writer.write_event(Event::Start(root))?;

        for rel in &self.items {
            let mut elem = BytesStart::new("Relationship");
            elem.push_attribute(("Id", rel.id.as_str()));
            elem.push_attribute(("Type", rel.rel_type.as_str()));
            elem.push_attribute(("Target", rel.target.as_str()));
            if rel.target_mode == TargetMode::External {
                elem.push_attribute(("TargetMode", "External"));
            }
            writer.write_event(Event::Empty(elem))?;
        }

        writer.write_event(Event::End(BytesEnd::new("Relationships")))?;
        String::from_utf8(buffer).map_err(|e| Error::InvalidDocument(e.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// First relationship of the given type
    pub fn by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    pub fn all_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.items.iter().filter(|r| r.rel_type == rel_type).collect()
    }

    /// Append an internal relationship and return its new id.
    /// Ids continue after the highest existing `rIdN`.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let next = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .map_or(1, |max| max + 1);
        let id = format!("rId{}", next);
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: TargetMode::Internal,
        });
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
