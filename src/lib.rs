//! # docx-footnotes
//!
//! Footnote management for DOCX documents.
//!
//! ## Features
//!
//! - Create footnotes; the footnotes part, its separators and its relationship
//!   are set up on first use
//! - Anchor superscript reference markers in body paragraphs
//! - Read and override per-section footnote formatting with inheritance from
//!   the document-wide defaults
//! - Round-trip preservation (unknown elements are kept intact, untouched
//!   parts are written back byte for byte)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docx_footnotes::{Document, FootnoteProperty};
//!
//! let mut doc = Document::new();
//! doc.add_paragraph("Rust was first released in 2015.");
//!
//! let id = doc.create_footnote()?;
//! doc.append_footnote_paragraph(id, "Version 1.0, May 2015.")?;
//! doc.add_footnote_reference(0, id)?;
//!
//! doc.set_section_footnote_property(0, FootnoteProperty::NumberFormat, "lowerRoman")?;
//! doc.save("output.docx")?;
//! ```

pub mod document;
pub mod error;
pub mod opc;
pub mod xml;

pub use document::{
    Document, EffectiveFootnoteProperties, Footnote, FootnoteId, FootnoteKind, FootnoteOptions,
    FootnotePosition, FootnoteProperty, FootnoteReference, Footnotes, NumberFormat, Paragraph,
    RestartLocation, Run,
};
pub use error::{Error, Result};
pub use opc::{Package, Part, PartStore, PartUri};
