//! Zip-backed [`PartStore`]: reads and writes `.docx` archives

use crate::error::{Error, Result};
use crate::opc::relationships::rel_types;
use crate::opc::{ContentTypes, Part, PartStore, PartUri, Relationship, Relationships};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::read::ZipArchive;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

const CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";
const PACKAGE_RELS_ENTRY: &str = "_rels/.rels";

/// Every part of a package held in memory, with its relationship graph
#[derive(Debug, Default)]
pub struct Package {
    parts: BTreeMap<PartUri, Part>,
    /// Relationships whose source is the package root
    relationships: Relationships,
    content_types: ContentTypes,
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

impl Package {
    pub fn new() -> Self {
        Self {
            content_types: ContentTypes::new(),
            ..Default::default()
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let content_types = read_entry(&mut archive, CONTENT_TYPES_ENTRY)?
            .ok_or_else(|| Error::MissingPart(CONTENT_TYPES_ENTRY.into()))?;
        let mut package = Package {
            parts: BTreeMap::new(),
            relationships: Relationships::new(),
            content_types: ContentTypes::from_xml(&content_types)?,
        };
        if let Some(xml) = read_entry(&mut archive, PACKAGE_RELS_ENTRY)? {
            package.relationships = Relationships::from_xml(&xml)?;
        }

        // Relationship files are attached to their source part below
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            if name.ends_with('/') || name == CONTENT_TYPES_ENTRY {
                continue;
            }
            let uri = PartUri::new(&name)?;
            if uri.is_relationships() {
                continue;
            }
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            package.parts.insert(uri, Part::new(data));
        }

        for (uri, part) in package.parts.iter_mut() {
            if let Some(xml) = read_entry(&mut archive, uri.relationships_uri().zip_path())? {
                part.set_relationships(Relationships::from_xml(&xml)?);
            }
        }

        log::debug!("opened package with {} parts", package.parts.len());
        Ok(package)
    }

    /// Write the package to a file. The archive is built in memory first,
    /// so a serialization failure leaves an existing file untouched.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(Cursor::new(&mut buf))?;
        Ok(buf)
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(CONTENT_TYPES_ENTRY, options)?;
        zip.write_all(self.content_types.to_xml()?.as_bytes())?;

        if !self.relationships.is_empty() {
            zip.start_file(PACKAGE_RELS_ENTRY, options)?;
            zip.write_all(self.relationships.to_xml()?.as_bytes())?;
        }

        for (uri, part) in &self.parts {
            zip.start_file(uri.zip_path(), options)?;
            zip.write_all(part.data())?;

            if let Some(rels) = part.relationships().filter(|r| !r.is_empty()) {
                zip.start_file(uri.relationships_uri().zip_path(), options)?;
                zip.write_all(rels.to_xml()?.as_bytes())?;
            }
        }

        zip.finish()?;
        Ok(())
    }

    pub fn part_uris(&self) -> impl Iterator<Item = &PartUri> {
        self.parts.keys()
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Target of the package-level officeDocument relationship
    pub fn main_document_uri(&self) -> Option<PartUri> {
        let rel = self.relationships.by_type(rel_types::OFFICE_DOCUMENT)?;
        PartUri::new(&rel.target).ok()
    }

    /// Add a relationship whose source is the package root
    pub fn add_package_relationship(&mut self, rel_type: &str, target: &str) -> String {
        self.relationships.add(rel_type, target)
    }

    fn part_relationships(&self, from: &PartUri) -> Option<&Relationships> {
        self.parts.get(from)?.relationships()
    }
}

impl PartStore for Package {
    fn get_part(&self, uri: &PartUri) -> Result<&[u8]> {
        self.parts
            .get(uri)
            .map(Part::data)
            .ok_or_else(|| Error::PartNotFound(uri.to_string()))
    }

    fn put_part(&mut self, uri: PartUri, content_type: &str, data: Vec<u8>) {
        self.content_types.add_override(&uri, content_type);
        match self.parts.get_mut(&uri) {
            Some(part) => part.set_data(data),
            None => {
                log::debug!("adding part {}", uri);
                self.parts.insert(uri, Part::new(data));
            }
        }
    }

    fn add_relationship(
        &mut self,
        from: &PartUri,
        to: &PartUri,
        rel_type: &str,
    ) -> Result<String> {
        let part = self
            .parts
            .get_mut(from)
            .ok_or_else(|| Error::PartNotFound(from.to_string()))?;
        let target = to.relative_to(from);
        let id = part.relationships_mut().add(rel_type, &target);
        log::debug!("added relationship {} from {} to {}", id, from, target);
        Ok(id)
    }

    fn get_relationship(&self, from: &PartUri, rel_type: &str) -> Result<&Relationship> {
        self.part_relationships(from)
            .and_then(|rels| rels.by_type(rel_type))
            .ok_or_else(|| Error::NotFound(format!("relationship {} from {}", rel_type, from)))
    }

    fn relationships_of_type(&self, from: &PartUri, rel_type: &str) -> Vec<&Relationship> {
        self.part_relationships(from)
            .map(|rels| rels.all_by_type(rel_type))
            .unwrap_or_default()
    }

    fn part_uris_with_type(&self, content_type: &str) -> Vec<PartUri> {
        self.content_types
            .parts_with_type(content_type)
            .filter(|uri| self.parts.contains_key(*uri))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::{well_known, FOOTNOTES, MAIN_DOCUMENT};
    use pretty_assertions::assert_eq;

    fn with_document() -> Package {
        let mut pkg = Package::new();
        pkg.put_part(well_known::document(), MAIN_DOCUMENT, b"<w:document/>".to_vec());
        pkg.add_package_relationship(rel_types::OFFICE_DOCUMENT, "word/document.xml");
        pkg
    }

    #[test]
    fn test_get_missing_part() {
        let pkg = Package::new();
        let err = pkg.get_part(&well_known::footnotes()).unwrap_err();
        assert!(matches!(err, Error::PartNotFound(_)));
        assert!(!pkg.has_part(&well_known::footnotes()));
    }

    #[test]
    fn test_replacing_part_keeps_relationships() {
        let mut pkg = with_document();
        let doc = well_known::document();
        pkg.put_part(well_known::footnotes(), FOOTNOTES, b"<w:footnotes/>".to_vec());
        pkg.add_relationship(&doc, &well_known::footnotes(), rel_types::FOOTNOTES)
            .unwrap();

        pkg.put_part(doc.clone(), MAIN_DOCUMENT, b"<w:document><w:body/></w:document>".to_vec());

        assert_eq!(pkg.get_part(&doc).unwrap(), b"<w:document><w:body/></w:document>");
        let rel = pkg.get_relationship(&doc, rel_types::FOOTNOTES).unwrap();
        assert_eq!(rel.target, "footnotes.xml");
        assert_eq!(
            pkg.related_part_uri(&doc, rel_types::FOOTNOTES).unwrap(),
            well_known::footnotes()
        );
    }

    #[test]
    fn test_relationship_requires_source_part() {
        let mut pkg = Package::new();
        let err = pkg
            .add_relationship(
                &well_known::document(),
                &well_known::footnotes(),
                rel_types::FOOTNOTES,
            )
            .unwrap_err();
        assert!(matches!(err, Error::PartNotFound(_)));
    }

    #[test]
    fn test_relationship_queries() {
        let mut pkg = with_document();
        let doc = well_known::document();
        assert!(matches!(
            pkg.get_relationship(&doc, rel_types::FOOTNOTES),
            Err(Error::NotFound(_))
        ));
        assert!(pkg.relationships_of_type(&doc, rel_types::FOOTNOTES).is_empty());

        let other = PartUri::new("/word/notes.xml").unwrap();
        pkg.add_relationship(&doc, &well_known::footnotes(), rel_types::FOOTNOTES)
            .unwrap();
        pkg.add_relationship(&doc, &other, rel_types::FOOTNOTES)
            .unwrap();

        let targets: Vec<_> = pkg
            .relationships_of_type(&doc, rel_types::FOOTNOTES)
            .into_iter()
            .map(|r| r.target.as_str())
            .collect();
        assert_eq!(targets, vec!["footnotes.xml", "notes.xml"]);
    }

    #[test]
    fn test_parts_by_content_type() {
        let mut pkg = with_document();
        pkg.put_part(
            PartUri::new("/word/notes.xml").unwrap(),
            FOOTNOTES,
            b"<w:footnotes/>".to_vec(),
        );
        assert_eq!(
            pkg.part_uris_with_type(FOOTNOTES),
            vec![PartUri::new("/word/notes.xml").unwrap()]
        );
        assert_eq!(pkg.part_uris_with_type(MAIN_DOCUMENT), vec![well_known::document()]);
    }

    #[test]
    fn test_empty_package_roundtrip() {
        let bytes = Package::new().to_bytes().unwrap();
        let pkg = Package::from_bytes(&bytes).unwrap();
        assert_eq!(pkg.part_uris().count(), 0);
        assert!(pkg.main_document_uri().is_none());
    }

    #[test]
    fn test_archive_roundtrip() {
        let mut pkg = with_document();
        let doc = well_known::document();
        pkg.put_part(well_known::footnotes(), FOOTNOTES, b"<w:footnotes/>".to_vec());
        pkg.add_relationship(&doc, &well_known::footnotes(), rel_types::FOOTNOTES)
            .unwrap();

        let reopened = Package::from_bytes(&pkg.to_bytes().unwrap()).unwrap();

        assert_eq!(reopened.main_document_uri(), Some(doc.clone()));
        assert_eq!(
            reopened.content_types().get(&well_known::footnotes()),
            Some(FOOTNOTES)
        );
        assert_eq!(
            reopened.get_part(&well_known::footnotes()).unwrap(),
            b"<w:footnotes/>"
        );
        assert_eq!(
            reopened.related_part_uri(&doc, rel_types::FOOTNOTES).unwrap(),
            well_known::footnotes()
        );
        // .rels files are attached to their source, not listed as parts
        assert!(reopened.part_uris().all(|u| !u.is_relationships()));
    }

    #[test]
    fn test_archive_without_content_types_rejected() {
        let mut buf = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<()> = FileOptions::default();
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(b"<w:document/>").unwrap();
            zip.finish().unwrap();
        }
        assert!(matches!(
            Package::from_bytes(&buf),
            Err(Error::MissingPart(_))
        ));
    }
}
