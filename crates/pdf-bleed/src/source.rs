//! Structural view of the source document
//!
//! The source is parsed with `lopdf` once per run and never mutated. Pages
//! are described by [`SourcePage`] values carrying the boxes and rotation the
//! rest of the pipeline needs; page content is only ever copied out as an
//! opaque Form XObject (see `render::xobject`).

use crate::constants::DEFAULT_PAGE_DIMENSIONS;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId};
use log::warn;

/// Guard against cyclic `Parent` chains in malformed page trees
const MAX_TREE_DEPTH: usize = 64;

/// Immutable reference to one page of the source document
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage {
    /// 0-based position in document order
    pub index: usize,
    pub id: ObjectId,
    pub media_box: PageBox,
    pub crop_box: Option<PageBox>,
    pub trim_box: Option<PageBox>,
    pub rotation: Rotation,
}

impl SourcePage {
    /// Region a renderer draws at scale 1: the CropBox clipped to the
    /// MediaBox, or the MediaBox alone.
    pub fn visible_box(&self) -> PageBox {
        self.crop_box
            .and_then(|crop| crop.intersect(&self.media_box))
            .unwrap_or(self.media_box)
    }
}

/// Content-manipulation view over the source bytes
#[derive(Debug, Clone)]
pub struct SourceDocument {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl SourceDocument {
    /// Parse a document from bytes
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| BleedError::DocumentLoad(e.to_string()))?;
        Self::from_document(doc)
    }

    pub fn from_document(doc: Document) -> Result<Self> {
        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
        if page_ids.is_empty() {
            return Err(BleedError::DocumentLoad("Document has no pages".to_string()));
        }
        Ok(Self { doc, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Describe the page at `index` (0-based)
    pub fn page(&self, index: usize) -> Result<SourcePage> {
        let id = *self.page_ids.get(index).ok_or_else(|| {
            BleedError::DocumentLoad(format!(
                "Page {} is out of range (document has {} pages)",
                index + 1,
                self.page_ids.len()
            ))
        })?;

        let media_box = self
            .read_box(index, id, b"MediaBox")
            .unwrap_or_else(|| PageBox::new(0.0, 0.0, DEFAULT_PAGE_DIMENSIONS.0, DEFAULT_PAGE_DIMENSIONS.1));

        // TrimBox is not inheritable, the other attributes are
        let own_trim = self
            .doc
            .get_dictionary(id)
            .ok()
            .and_then(|dict| dict.get(b"TrimBox").ok());
        let trim_box = self.parse_box(index, b"TrimBox", own_trim);

        let rotation = match inherited_attribute(&self.doc, id, b"Rotate") {
            Some(obj) => {
                let degrees = resolve(&self.doc, obj)
                    .and_then(|o| o.as_i64().ok())
                    .unwrap_or(0);
                Rotation::from_degrees(degrees).ok_or_else(|| {
                    BleedError::geometry(index, format!("unsupported rotation of {} degrees", degrees))
                })?
            }
            None => Rotation::None,
        };

        Ok(SourcePage {
            index,
            id,
            media_box,
            crop_box: self.read_box(index, id, b"CropBox"),
            trim_box,
            rotation,
        })
    }

    fn read_box(&self, index: usize, page_id: ObjectId, key: &[u8]) -> Option<PageBox> {
        self.parse_box(index, key, inherited_attribute(&self.doc, page_id, key))
    }

    /// A present but unusable box is skipped, so the next box in precedence
    /// decides the trim line
    fn parse_box(&self, index: usize, key: &[u8], obj: Option<&Object>) -> Option<PageBox> {
        let obj = obj?;
        let parsed = box_from_object(&self.doc, obj);
        if parsed.is_none() {
            warn!(
                "Page {}: ignoring malformed /{} {:?}",
                index + 1,
                String::from_utf8_lossy(key),
                obj
            );
        }
        parsed
    }
}

/// Look up a page attribute, walking up the page tree for inherited values.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current: &Dictionary = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Follow a single indirect reference
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn box_from_object(doc: &Document, obj: &Object) -> Option<PageBox> {
    let array = resolve(doc, obj)?.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut values = [0.0; 4];
    for (slot, item) in values.iter_mut().zip(array) {
        *slot = extract_number(resolve(doc, item)?)?;
    }
    Some(PageBox::from_corners(values[0], values[1], values[2], values[3]))
}

/// Extract numeric value from a PDF object
pub(crate) fn extract_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}
