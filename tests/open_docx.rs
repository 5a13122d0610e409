//! Integration test: open packages written by other tools

use docx_footnotes::opc::{rel_types, well_known, FOOTNOTES, MAIN_DOCUMENT, SETTINGS};
use docx_footnotes::{
    Document, Error, FootnoteProperty, NumberFormat, Package, PartStore, RestartLocation,
};
use pretty_assertions::assert_eq;

const FOOTNOTES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:footnotes xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" mc:Ignorable="w14">
  <w:footnote w:type="separator" w:id="0"><w:p><w:pPr><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr><w:r><w:separator/></w:r></w:p></w:footnote>
  <w:footnote w:type="continuationSeparator" w:id="1"><w:p><w:r><w:continuationSeparator/></w:r></w:p></w:footnote>
  <w:footnote w:id="2"><w:p w14:paraId="0A1B2C3D"><w:pPr><w:pStyle w:val="FootnoteText"/></w:pPr><w:r><w:rPr><w:rStyle w:val="FootnoteReference"/></w:rPr><w:footnoteRef/></w:r><w:r><w:t xml:space="preserve"> First note</w:t></w:r></w:p></w:footnote>
  <w:footnote w:id="5"><w:p><w:r><w:t>Fifth note</w:t></w:r><w:commentRangeStart w:id="7"/></w:p></w:footnote>
</w:footnotes>"#;

const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
    <w:p><w:r><w:t>One</w:t></w:r><w:r><w:rPr><w:rStyle w:val="FootnoteReference"/></w:rPr><w:footnoteReference w:id="2"/></w:r></w:p>
    <w:p>
      <w:pPr><w:sectPr><w:footnotePr><w:numFmt w:val="lowerRoman"/></w:footnotePr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:pPr>
      <w:r><w:t>Two</w:t></w:r>
    </w:p>
    <w:tbl><w:tr><w:tc><w:p><w:r><w:footnoteReference w:id="5"/></w:r></w:p></w:tc></w:tr></w:tbl>
    <w:sectPr><w:headerReference w:type="default" r:id="rId8"/><w:footnotePr><w:numRestart w:val="eachPage"/><w:numStart w:val="bogus"/></w:footnotePr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr>
  </w:body>
</w:document>"#;

const SETTINGS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:settings xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:footnotePr><w:pos w:val="beneathText"/><w:numStart w:val="3"/><w:footnote w:id="0"/><w:footnote w:id="1"/></w:footnotePr><w:compat/></w:settings>"#;

struct Fixture<'a> {
    document: &'a str,
    footnotes: Option<&'a str>,
    footnotes_relationships: usize,
    settings: Option<&'a str>,
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Fixture {
            document: DOCUMENT_XML,
            footnotes: Some(FOOTNOTES_XML),
            footnotes_relationships: 1,
            settings: Some(SETTINGS_XML),
        }
    }
}

impl Fixture<'_> {
    fn build(&self) -> Vec<u8> {
        let mut pkg = Package::new();
        let doc = well_known::document();
        pkg.put_part(doc.clone(), MAIN_DOCUMENT, self.document.as_bytes().to_vec());
        pkg.add_package_relationship(rel_types::OFFICE_DOCUMENT, "word/document.xml");

        if let Some(xml) = self.footnotes {
            pkg.put_part(well_known::footnotes(), FOOTNOTES, xml.as_bytes().to_vec());
        }
        for _ in 0..self.footnotes_relationships {
            pkg.add_relationship(&doc, &well_known::footnotes(), rel_types::FOOTNOTES)
                .unwrap();
        }
        if let Some(xml) = self.settings {
            pkg.put_part(well_known::settings(), SETTINGS, xml.as_bytes().to_vec());
            pkg.add_relationship(&doc, &well_known::settings(), rel_types::SETTINGS)
                .unwrap();
        }

        pkg.to_bytes().unwrap()
    }
}

fn open(fixture: Fixture) -> docx_footnotes::Result<Document> {
    let _ = env_logger::builder().is_test(true).try_init();
    Document::from_bytes(&fixture.build())
}

#[test]
fn test_open_document_with_footnotes() {
    let doc = open(Fixture::default()).unwrap();

    let ids: Vec<_> = doc.footnotes(false).map(|f| f.id()).collect();
    assert_eq!(ids, vec![2, 5]);
    assert_eq!(doc.footnotes(true).count(), 4);
    assert_eq!(doc.footnote(2).unwrap().text(), " First note");
    assert_eq!(doc.footnote(5).unwrap().text(), "Fifth note");

    // Markers in paragraphs; the table marker is only seen by the body scan
    assert_eq!(doc.footnote_references().collect::<Vec<_>>(), vec![(0, 2)]);
    assert_eq!(doc.body().footnote_references(), vec![2, 5]);
}

#[test]
fn test_next_id_follows_highest() {
    let mut doc = open(Fixture::default()).unwrap();
    assert_eq!(doc.create_footnote().unwrap(), 6);
    assert_eq!(doc.create_footnote().unwrap(), 7);
}

#[test]
fn test_sections_resolve_through_settings() {
    let doc = open(Fixture::default()).unwrap();
    assert_eq!(doc.section_count(), 2);

    let first = doc.section_footnote_properties(0).unwrap();
    assert_eq!(first.number_format, NumberFormat::LowerRoman);
    assert_eq!(first.start_value, 3);
    assert_eq!(first.restart, RestartLocation::Continuous);

    // The unreadable numStart falls back to the document default
    let last = doc.section_footnote_properties(1).unwrap();
    assert_eq!(last.number_format, NumberFormat::Decimal);
    assert_eq!(last.start_value, 3);
    assert_eq!(last.restart, RestartLocation::EachPage);
}

#[test]
fn test_untouched_parts_are_kept_byte_for_byte() {
    let mut doc = open(Fixture::default()).unwrap();
    doc.add_paragraph("added");
    let bytes = doc.to_bytes().unwrap();

    let pkg = Package::from_bytes(&bytes).unwrap();
    assert_eq!(
        pkg.get_part(&well_known::footnotes()).unwrap(),
        FOOTNOTES_XML.as_bytes()
    );
    assert_eq!(
        pkg.get_part(&well_known::settings()).unwrap(),
        SETTINGS_XML.as_bytes()
    );
}

#[test]
fn test_roundtrip_preserves_model() {
    let mut first = open(Fixture::default()).unwrap();
    let second = Document::from_bytes(&first.to_bytes().unwrap()).unwrap();

    assert_eq!(second.footnote_registry(), first.footnote_registry());
    assert_eq!(second.body(), first.body());
    for index in 0..first.section_count() {
        assert_eq!(
            second.section_footnote_properties(index).unwrap(),
            first.section_footnote_properties(index).unwrap()
        );
    }
}

#[test]
fn test_edit_keeps_foreign_content() {
    let mut doc = open(Fixture::default()).unwrap();
    let id = doc.create_footnote().unwrap();
    doc.append_footnote_paragraph(id, "new").unwrap();
    doc.set_section_footnote_property(1, FootnoteProperty::Position, "beneathText")
        .unwrap();

    let bytes = doc.to_bytes().unwrap();
    let pkg = Package::from_bytes(&bytes).unwrap();

    let footnotes = std::str::from_utf8(pkg.get_part(&well_known::footnotes()).unwrap()).unwrap();
    assert!(footnotes.contains(r#"mc:Ignorable="w14""#));
    assert!(footnotes.contains(r#"<w:p w14:paraId="0A1B2C3D">"#));
    assert!(footnotes.contains(r#"<w:commentRangeStart w:id="7"/>"#));
    assert!(footnotes.contains(r#"<w:footnote w:id="6">"#));

    let document = std::str::from_utf8(pkg.get_part(&well_known::document()).unwrap()).unwrap();
    assert!(document.contains(
        r#"<w:headerReference w:type="default" r:id="rId8"/><w:footnotePr><w:pos w:val="beneathText"/><w:numStart w:val="bogus"/><w:numRestart w:val="eachPage"/></w:footnotePr>"#
    ));
    assert!(document.contains(r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:footnoteReference w:id="5"/></w:r></w:p></w:tc></w:tr></w:tbl>"#));
}

#[test]
fn test_delete_counts_markers_in_tables() {
    let mut doc = open(Fixture::default()).unwrap();
    assert!(matches!(
        doc.delete_footnote(5),
        Err(Error::Referenced { id: 5, count: 1 })
    ));
}

#[test]
fn test_document_without_footnotes() {
    let document = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Plain</w:t></w:r></w:p></w:body></w:document>"#;
    let mut doc = open(Fixture {
        document,
        footnotes: None,
        footnotes_relationships: 0,
        settings: None,
    })
    .unwrap();

    assert!(!doc.has_footnotes_part());
    assert_eq!(doc.footnotes(true).count(), 0);
    assert_eq!(doc.create_footnote().unwrap(), 2);
    assert!(doc.has_footnotes_part());
}

#[test]
fn test_part_without_relationship_is_malformed() {
    let result = open(Fixture {
        footnotes_relationships: 0,
        ..Default::default()
    });
    assert!(matches!(result, Err(Error::Malformed(_))));
}

#[test]
fn test_relationship_without_part_is_malformed() {
    let result = open(Fixture {
        footnotes: None,
        ..Default::default()
    });
    assert!(matches!(result, Err(Error::Malformed(_))));
}

#[test]
fn test_two_relationships_are_malformed() {
    let result = open(Fixture {
        footnotes_relationships: 2,
        ..Default::default()
    });
    assert!(matches!(result, Err(Error::Malformed(_))));
}

#[test]
fn test_duplicate_id_is_malformed() {
    let footnotes = FOOTNOTES_XML.replace(r#"w:id="5""#, r#"w:id="2""#);
    let result = open(Fixture {
        footnotes: Some(footnotes.as_str()),
        ..Default::default()
    });
    assert!(matches!(result, Err(Error::Malformed(_))));
}

#[test]
fn test_marker_to_missing_footnote_is_malformed() {
    let document = DOCUMENT_XML.replace(r#"<w:footnoteReference w:id="5"/>"#, r#"<w:footnoteReference w:id="9"/>"#);
    let result = open(Fixture {
        document: &document,
        ..Default::default()
    });
    assert!(matches!(result, Err(Error::Malformed(_))));
}

#[test]
fn test_marker_without_id_is_malformed() {
    let in_paragraph = DOCUMENT_XML.replace(r#"<w:footnoteReference w:id="2"/>"#, "<w:footnoteReference/>");
    let result = open(Fixture {
        document: &in_paragraph,
        ..Default::default()
    });
    assert!(matches!(result, Err(Error::Malformed(_))));

    let in_table = DOCUMENT_XML.replace(r#"<w:footnoteReference w:id="5"/>"#, r#"<w:footnoteReference w:id="x"/>"#);
    let result = open(Fixture {
        document: &in_table,
        ..Default::default()
    });
    assert!(matches!(result, Err(Error::Malformed(_))));
}

#[test]
fn test_custom_mark_reference_can_be_removed() {
    let document = DOCUMENT_XML.replace(
        r#"<w:footnoteReference w:id="2"/>"#,
        r#"<w:footnoteReference w:customMarkFollows="1" w:id="2"/><w:t>*</w:t>"#,
    );
    let mut doc = open(Fixture {
        document: &document,
        ..Default::default()
    })
    .unwrap();
    assert!(matches!(
        doc.delete_footnote(2),
        Err(Error::Referenced { id: 2, count: 1 })
    ));

    let removed = doc.paragraph_mut(0).unwrap().remove_footnote_references(2);
    assert_eq!(removed, 1);
    assert_eq!(doc.delete_footnote(2).unwrap().text(), " First note");
    assert_eq!(doc.paragraph(0).unwrap().text(), "One*");
}
