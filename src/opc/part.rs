//! A stored part: its bytes plus the relationships it is the source of

use crate::opc::Relationships;

#[derive(Clone, Debug, Default)]
pub struct Part {
    data: Vec<u8>,
    relationships: Option<Relationships>,
}

impl Part {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            relationships: None,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replace the bytes; relationships stay attached
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    /// Relationships whose source is this part, if it has a `.rels` file
    pub fn relationships(&self) -> Option<&Relationships> {
        self.relationships.as_ref()
    }

    pub(crate) fn set_relationships(&mut self, rels: Relationships) {
        self.relationships = Some(rels);
    }

    pub(crate) fn relationships_mut(&mut self) -> &mut Relationships {
        self.relationships.get_or_insert_with(Relationships::new)
    }
}
