//! In-text footnote reference markers

use crate::document::{Footnote, FootnoteId, FootnoteOptions, Footnotes, Paragraph, Run, RunContent};
use crate::error::{Error, Result};

/// A marker placed in body text that points at a footnote
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FootnoteReference {
    /// Id of the targeted footnote
    pub footnote_id: FootnoteId,
}

impl FootnoteReference {
    /// Look the targeted footnote up in the registry
    pub fn resolve<'a>(&self, footnotes: &'a Footnotes) -> Result<&'a Footnote> {
        footnotes.get(self.footnote_id)
    }
}

/// Append a superscript marker for footnote `id` to the end of `paragraph`.
///
/// Fails with `NotFound` when the footnote does not exist, in which case the
/// paragraph is left untouched.
pub fn add_reference(
    paragraph: &mut Paragraph,
    footnotes: Option<&Footnotes>,
    id: FootnoteId,
    options: &FootnoteOptions,
) -> Result<FootnoteReference> {
    match footnotes {
        Some(footnotes) if footnotes.contains(id) => {}
        _ => return Err(Error::NotFound(format!("footnote {}", id))),
    }

    paragraph.add_run(Run::mark(
        RunContent::FootnoteReference(id),
        options.reference_style.as_deref(),
    ));
    log::debug!("added reference to footnote {}", id);
    Ok(FootnoteReference { footnote_id: id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::well_known;
    use pretty_assertions::assert_eq;
    use quick_xml::Writer;

    #[test]
    fn test_marker_run() {
        let mut footnotes = Footnotes::new_part(well_known::footnotes());
        let id = footnotes.create().unwrap();
        let mut para = Paragraph::new("Text");

        let reference =
            add_reference(&mut para, Some(&footnotes), id, &FootnoteOptions::default()).unwrap();
        assert_eq!(reference, FootnoteReference { footnote_id: 2 });
        assert_eq!(reference.resolve(&footnotes).unwrap().id(), 2);

        let mut out = Vec::new();
        para.write_to(&mut Writer::new(&mut out)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<w:p><w:r><w:t>Text</w:t></w:r><w:r><w:rPr><w:rStyle w:val="FootnoteReference"/><w:vertAlign w:val="superscript"/></w:rPr><w:footnoteReference w:id="2"/></w:r></w:p>"#
        );
    }

    #[test]
    fn test_unstyled_marker() {
        let mut footnotes = Footnotes::new_part(well_known::footnotes());
        let id = footnotes.create().unwrap();
        let mut para = Paragraph::default();
        let options = FootnoteOptions::default().with_reference_style(None::<String>);

        add_reference(&mut para, Some(&footnotes), id, &options).unwrap();

        let run = para.runs().next().unwrap();
        assert_eq!(run.style(), None);
        assert_eq!(run.vertical_align(), Some("superscript"));
    }

    #[test]
    fn test_unknown_id() {
        let footnotes = Footnotes::new_part(well_known::footnotes());
        let mut para = Paragraph::new("Text");
        let before = para.clone();

        let err = add_reference(&mut para, Some(&footnotes), 2, &FootnoteOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(para, before);

        let err = add_reference(&mut para, None, 2, &FootnoteOptions::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
