//! Error types for docx-footnotes

use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML encoding error: {0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Missing required part: {0}")]
    MissingPart(String),

    #[error("Invalid part URI: {0}")]
    InvalidPartUri(String),

    #[error("Missing attribute '{attr}' on element '{element}'")]
    MissingAttribute { element: String, attr: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// A footnote, section or relationship the caller asked for does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A property value outside its legal set; nothing was written
    #[error("Invalid value '{value}' for {property}")]
    InvalidValue { property: String, value: String },

    /// The footnote is still targeted by reference markers
    #[error("Footnote {id} is still referenced by {count} marker(s)")]
    Referenced { id: i32, count: usize },

    /// Every id above the highest existing one is taken
    #[error("No footnote id left after {0}")]
    IdsExhausted(i32),

    /// The source document is internally inconsistent
    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl Error {
    pub(crate) fn invalid_value(property: impl Into<String>, value: impl Into<String>) -> Self {
        Error::InvalidValue {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
