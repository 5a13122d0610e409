//! Integration test: footnote API on documents built in memory

use docx_footnotes::{
    Document, EffectiveFootnoteProperties, Error, FootnoteKind, FootnoteOptions,
    FootnotePosition, FootnoteProperty, NumberFormat, RestartLocation,
};
use pretty_assertions::assert_eq;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One body paragraph referencing footnote A ("alpha") and footnote B
/// ("beta-1" / "beta-2")
fn two_footnote_document() -> Document {
    let mut doc = Document::new();
    doc.add_paragraph("Body text");

    let a = doc.create_footnote().unwrap();
    doc.append_footnote_paragraph(a, "alpha").unwrap();

    let b = doc.create_footnote().unwrap();
    doc.append_footnote_paragraph(b, "beta-1").unwrap();
    doc.append_footnote_paragraph(b, "beta-2").unwrap();

    doc.add_footnote_reference(0, a).unwrap();
    doc.add_footnote_reference(0, b).unwrap();
    doc
}

#[test]
fn test_create_and_reference_footnotes() {
    init_logger();
    let doc = two_footnote_document();

    let listed: Vec<_> = doc.footnotes(false).map(|f| (f.id(), f.text())).collect();
    assert_eq!(
        listed,
        vec![
            (2, "alpha".to_string()),
            (3, "beta-1\nbeta-2".to_string())
        ]
    );

    assert_eq!(doc.paragraph_count(), 1);
    let refs: Vec<_> = doc.paragraph(0).unwrap().footnote_references().collect();
    assert_eq!(refs, vec![2, 3]);
    assert_eq!(doc.footnote_references().collect::<Vec<_>>(), vec![(0, 2), (0, 3)]);
}

#[test]
fn test_reserved_footnotes_exist_but_are_hidden() {
    let mut doc = Document::new();
    assert!(!doc.has_footnotes_part());

    let ids: Vec<_> = (0..4).map(|_| doc.create_footnote().unwrap()).collect();
    assert_eq!(ids, vec![2, 3, 4, 5]);
    assert!(doc.has_footnotes_part());

    assert_eq!(doc.footnote(0).unwrap().kind(), FootnoteKind::Separator);
    assert_eq!(
        doc.footnote(1).unwrap().kind(),
        FootnoteKind::ContinuationSeparator
    );
    assert_eq!(doc.footnotes(false).count(), 4);
    assert_eq!(doc.footnotes(true).count(), 6);
}

#[test]
fn test_footnotes_part_created_once() {
    let mut doc = Document::new();
    doc.create_footnote().unwrap();
    doc.create_footnote().unwrap();

    let bytes = doc.to_bytes().unwrap();
    let doc = Document::from_bytes(&bytes).unwrap();

    let footnote_parts = doc
        .package()
        .part_uris()
        .filter(|uri| uri.as_str().contains("footnotes"))
        .count();
    assert_eq!(footnote_parts, 1);
    assert_eq!(doc.footnotes(true).count(), 4);
}

#[test]
fn test_reference_to_unknown_footnote() {
    let mut doc = Document::new();
    doc.add_paragraph("text");
    doc.add_empty_paragraph();
    assert_eq!(doc.paragraph_count(), 2);

    // No footnotes part yet
    assert!(matches!(
        doc.add_footnote_reference(0, 2),
        Err(Error::NotFound(_))
    ));

    let id = doc.create_footnote().unwrap();
    assert!(matches!(
        doc.add_footnote_reference(0, id + 1),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        doc.add_footnote_reference(5, id),
        Err(Error::NotFound(_))
    ));
    assert_eq!(doc.footnote_references().count(), 0);
}

#[test]
fn test_footnote_lookup_errors() {
    let mut doc = Document::new();
    assert!(matches!(doc.footnote(2), Err(Error::NotFound(_))));
    assert!(matches!(
        doc.append_footnote_paragraph(2, "x"),
        Err(Error::NotFound(_))
    ));

    doc.create_footnote().unwrap();
    assert!(matches!(doc.footnote(9), Err(Error::NotFound(_))));
}

#[test]
fn test_delete_rejects_referenced_footnote() {
    let mut doc = two_footnote_document();

    let err = doc.delete_footnote(2).unwrap_err();
    assert!(matches!(err, Error::Referenced { id: 2, count: 1 }));
    assert!(doc.footnote(2).is_ok());

    let removed = doc
        .paragraph_mut(0)
        .unwrap()
        .remove_footnote_references(2);
    assert_eq!(removed, 1);
    // Removing the marker leaves the footnote alone
    assert!(doc.footnote(2).is_ok());

    let deleted = doc.delete_footnote(2).unwrap();
    assert_eq!(deleted.text(), "alpha");
    assert!(matches!(doc.footnote(2), Err(Error::NotFound(_))));
    assert!(matches!(doc.delete_footnote(2), Err(Error::NotFound(_))));
    assert!(matches!(
        doc.delete_footnote(0),
        Err(Error::InvalidValue { .. })
    ));

    // Ids are never reused
    assert_eq!(doc.create_footnote().unwrap(), 4);
}

#[test]
fn test_custom_styles() {
    let mut doc = Document::new();
    doc.set_footnote_options(
        FootnoteOptions::default()
            .with_reference_style(Some("NoteMark"))
            .with_text_style(Some("NoteText")),
    );
    assert_eq!(doc.footnote_options().text_style.as_deref(), Some("NoteText"));
    doc.add_paragraph("text");

    let id = doc.create_footnote().unwrap();
    let para = doc.append_footnote_paragraph(id, "note").unwrap();
    assert_eq!(para.style(), Some("NoteText"));
    assert_eq!(para.runs().next().unwrap().style(), Some("NoteMark"));

    doc.add_footnote_reference(0, id).unwrap();
    let marker = doc.paragraph(0).unwrap().runs().last().unwrap();
    assert_eq!(marker.style(), Some("NoteMark"));
    assert_eq!(marker.vertical_align(), Some("superscript"));
}

#[test]
fn test_section_inherits_per_property() {
    init_logger();
    let mut doc = Document::new();
    doc.add_paragraph("text");

    doc.set_default_footnote_property(FootnoteProperty::Position, "beneathText")
        .unwrap();
    doc.set_section_footnote_property(0, FootnoteProperty::NumberFormat, "lowerRoman")
        .unwrap();

    assert_eq!(
        doc.section_footnote_properties(0).unwrap(),
        EffectiveFootnoteProperties {
            position: FootnotePosition::BeneathText,
            number_format: NumberFormat::LowerRoman,
            start_value: 1,
            restart: RestartLocation::Continuous,
        }
    );
    assert_eq!(
        doc.default_footnote_properties().number_format,
        NumberFormat::Decimal
    );

    // Only the overridden property is stored on the section
    let own = doc
        .section(0)
        .unwrap()
        .and_then(|s| s.footnote_properties())
        .unwrap();
    assert_eq!(own.number_format(), Some(NumberFormat::LowerRoman));
    assert_eq!(own.position(), None);
    assert_eq!(own.start_value(), None);
    assert_eq!(own.restart(), None);
}

#[test]
fn test_invalid_section_value_changes_nothing() {
    let mut doc = Document::new();
    doc.set_section_footnote_property(0, FootnoteProperty::StartValue, "4")
        .unwrap();
    let before = doc.section(0).unwrap().cloned();

    let err = doc
        .set_section_footnote_property(0, FootnoteProperty::NumberFormat, "romanNumeralsXYZ")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));
    assert!(matches!(
        doc.set_section_footnote_property(0, FootnoteProperty::StartValue, "0"),
        Err(Error::InvalidValue { .. })
    ));
    assert_eq!(doc.section(0).unwrap().cloned(), before);
}

#[test]
fn test_invalid_default_creates_no_settings_part() {
    let mut doc = Document::new();
    let err = doc
        .set_default_footnote_property(FootnoteProperty::Position, "sectEnd")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));

    let bytes = doc.to_bytes().unwrap();
    let doc = Document::from_bytes(&bytes).unwrap();
    assert!(doc
        .package()
        .part_uris()
        .all(|uri| !uri.as_str().ends_with("settings.xml")));
}

#[test]
fn test_section_index_out_of_range() {
    let mut doc = Document::new();
    assert_eq!(doc.section_count(), 1);
    assert!(matches!(
        doc.section_footnote_properties(1),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        doc.set_section_footnote_property(3, FootnoteProperty::Position, "pageBottom"),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        doc.clear_section_footnote_property(3, FootnoteProperty::Position),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_clear_restores_inheritance() {
    let mut doc = Document::new();
    doc.set_default_footnote_property(FootnoteProperty::RestartLocation, "eachPage")
        .unwrap();
    doc.set_section_footnote_property(0, FootnoteProperty::RestartLocation, "eachSection")
        .unwrap();
    assert_eq!(
        doc.section_footnote_properties(0).unwrap().restart,
        RestartLocation::EachSection
    );

    doc.clear_section_footnote_property(0, FootnoteProperty::RestartLocation)
        .unwrap();
    assert_eq!(
        doc.section_footnote_properties(0).unwrap().restart,
        RestartLocation::EachPage
    );

    doc.clear_default_footnote_property(FootnoteProperty::RestartLocation);
    assert_eq!(
        doc.section_footnote_properties(0).unwrap(),
        EffectiveFootnoteProperties::default()
    );
}

#[test]
fn test_save_and_reopen() {
    init_logger();
    let mut doc = two_footnote_document();
    doc.set_section_footnote_property(0, FootnoteProperty::StartValue, "10")
        .unwrap();
    doc.set_default_footnote_property(FootnoteProperty::NumberFormat, "upperLetter")
        .unwrap();

    let bytes = doc.to_bytes().unwrap();
    let reopened = Document::from_bytes(&bytes).unwrap();

    assert_eq!(reopened.footnote_registry(), doc.footnote_registry());
    assert_eq!(
        reopened.section_footnote_properties(0).unwrap(),
        doc.section_footnote_properties(0).unwrap()
    );
    assert_eq!(reopened.section_footnote_properties(0).unwrap().start_value, 10);
    assert_eq!(
        reopened.default_footnote_properties().number_format,
        NumberFormat::UpperLetter
    );
    assert_eq!(
        reopened.footnote_references().collect::<Vec<_>>(),
        vec![(0, 2), (0, 3)]
    );
    assert_eq!(reopened.text(), "Body text");
}

#[test]
fn test_save_to_file() {
    let mut doc = two_footnote_document();
    let path = std::env::temp_dir().join(format!("docx-footnotes-{}.docx", std::process::id()));

    doc.save(&path).unwrap();
    let reopened = Document::open(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(reopened.footnotes(false).count(), 2);
    assert_eq!(reopened.footnote(3).unwrap().text(), "beta-1\nbeta-2");
}
