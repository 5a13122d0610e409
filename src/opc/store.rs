//! The part-store contract the footnote engine is written against

use crate::error::Result;
use crate::opc::{PartUri, Relationship};

/// Named parts plus the typed relationship graph between them.
///
/// [`Package`](crate::opc::Package) is the production implementation; the
/// footnote and settings layers only talk to the package through this trait.
pub trait PartStore {
    /// Raw bytes of a part
    fn get_part(&self, uri: &PartUri) -> Result<&[u8]>;

    /// Insert or replace a part. Replacing keeps the part's own relationships.
    fn put_part(&mut self, uri: PartUri, content_type: &str, data: Vec<u8>);

    /// Add a relationship from one part to another and return its new id
    fn add_relationship(&mut self, from: &PartUri, to: &PartUri, rel_type: &str)
        -> Result<String>;

    /// First relationship of the given type leaving `from`
    fn get_relationship(&self, from: &PartUri, rel_type: &str) -> Result<&Relationship>;

    /// Every relationship of the given type leaving `from`, in source order
    fn relationships_of_type(&self, from: &PartUri, rel_type: &str) -> Vec<&Relationship>;

    /// Existing parts registered under a content type
    fn part_uris_with_type(&self, content_type: &str) -> Vec<PartUri>;

    /// Whether a part exists
    fn has_part(&self, uri: &PartUri) -> bool {
        self.get_part(uri).is_ok()
    }

    /// Resolve the part a typed relationship from `from` points at
    fn related_part_uri(&self, from: &PartUri, rel_type: &str) -> Result<PartUri> {
        let rel = self.get_relationship(from, rel_type)?;
        from.resolve(&rel.target)
    }
}
