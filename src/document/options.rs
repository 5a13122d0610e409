//! Options controlling generated footnote content

/// Style ids applied to content the engine generates.
///
/// ```rust
/// use docx_footnotes::FootnoteOptions;
///
/// let options = FootnoteOptions::default()
///     .with_reference_style(Some("MyNoteMark"))
///     .with_text_style(None::<String>);
/// assert_eq!(options.reference_style.as_deref(), Some("MyNoteMark"));
/// assert!(options.text_style.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FootnoteOptions {
    /// Character style of in-text markers and of the number mark in the footnote body
    pub reference_style: Option<String>,
    /// Paragraph style of footnote body paragraphs
    pub text_style: Option<String>,
}

impl Default for FootnoteOptions {
    fn default() -> Self {
        Self {
            reference_style: Some("FootnoteReference".into()),
            text_style: Some("FootnoteText".into()),
        }
    }
}

impl FootnoteOptions {
    pub fn with_reference_style(mut self, style: Option<impl Into<String>>) -> Self {
        self.reference_style = style.map(Into::into);
        self
    }

    pub fn with_text_style(mut self, style: Option<impl Into<String>>) -> Self {
        self.text_style = style.map(Into::into);
        self
    }
}
