//! Output document assembly

use crate::render::{OutputPage, write_page};
use crate::source::{SourceDocument, SourcePage};
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

/// Output document under construction
///
/// Pages are appended strictly in order; appending is the commit point for
/// a page. The document only becomes bytes through [`OutputDocument::into_bytes`].
pub struct OutputDocument {
    doc: Document,
    pages_tree_id: ObjectId,
    page_refs: Vec<Object>,
    /// Source object id → output object id, shared by every embedded page
    xobject_cache: HashMap<ObjectId, ObjectId>,
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDocument {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_tree_id = doc.new_object_id();
        Self {
            doc,
            pages_tree_id,
            page_refs: Vec::new(),
            xobject_cache: HashMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_refs.len()
    }

    /// Write a composed page and append it after the pages already committed.
    pub fn append_page(
        &mut self,
        source: &SourceDocument,
        page: &SourcePage,
        layout: &OutputPage,
    ) -> Result<ObjectId> {
        let page_id = write_page(
            &mut self.doc,
            source,
            page,
            layout,
            self.pages_tree_id,
            &mut self.xobject_cache,
        )?;
        self.page_refs.push(Object::Reference(page_id));
        Ok(page_id)
    }

    /// Finalize the page tree and serialize the document.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        if self.page_refs.is_empty() {
            return Err(BleedError::Composition(
                "Output document has no pages".to_string(),
            ));
        }

        finalize_document(&mut self.doc, self.pages_tree_id, self.page_refs);
        self.doc.compress();

        let mut writer = Vec::new();
        self.doc
            .save_to(&mut writer)
            .map_err(BleedError::composition)?;
        Ok(writer)
    }
}

/// Create pages tree and catalog, finalize document structure
fn finalize_document(output: &mut Document, pages_tree_id: ObjectId, page_refs: Vec<Object>) {
    let count = page_refs.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(page_refs)),
        ("Count", Object::Integer(count)),
    ]);
    output
        .objects
        .insert(pages_tree_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_tree_id)),
    ]));

    output.trailer.set("Root", catalog_id);
}
