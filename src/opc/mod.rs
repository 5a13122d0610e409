//! Open Packaging Convention (OPC) implementation
//!
//! Parts, content types and relationships of a `.docx` zip archive.

mod content_types;
mod package;
mod part;
mod part_uri;
mod relationships;
mod store;

pub use content_types::{ContentTypes, FOOTNOTES, MAIN_DOCUMENT, RELATIONSHIPS, SETTINGS, XML};
pub use package::Package;
pub use part::Part;
pub use part_uri::{well_known, PartUri};
pub use relationships::{rel_types, Relationship, Relationships, TargetMode};
pub use store::PartStore;
