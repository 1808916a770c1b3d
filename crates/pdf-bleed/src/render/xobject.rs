//! XObjects drawn on bleed pages
//!
//! The original page travels as a Form XObject whose content and resources
//! are copied byte for byte; each bleed strip is an Image XObject carrying
//! its already encoded samples.

use crate::source::{SourcePage, inherited_attribute};
use crate::strips::BleedStrip;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

// =============================================================================
// XObject Creation
// =============================================================================

/// Create a Form XObject from a source page.
///
/// The form's bounding box is the page's MediaBox and its matrix moves the
/// MediaBox origin to (0, 0), so drawing the form at a position places the
/// MediaBox origin there. `cache` is shared across pages.
pub fn create_page_xobject(
    output: &mut Document,
    source: &Document,
    page: &SourcePage,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let page_dict = source.get_dictionary(page.id).map_err(BleedError::composition)?;
    let media = page.media_box;

    let content = page_content(source, page_dict)?;

    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set("FormType", Object::Integer(1));
    xobject_dict.set(
        "BBox",
        Object::Array(vec![
            real(media.x),
            real(media.y),
            real(media.right()),
            real(media.top()),
        ]),
    );
    xobject_dict.set(
        "Matrix",
        Object::Array(vec![
            Object::Integer(1),
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(1),
            real(-media.x),
            real(-media.y),
        ]),
    );

    // Resources may be inherited from the page tree
    if let Some(resources) = inherited_attribute(source, page.id, b"Resources") {
        xobject_dict.set(
            "Resources",
            copy_object_deep(output, source, resources, cache)?,
        );
    }

    // Keep transparency groups intact
    if let Ok(group) = page_dict.get(b"Group") {
        xobject_dict.set("Group", copy_object_deep(output, source, group, cache)?);
    }

    // Still-encoded content keeps its filter and must not be compressed again
    let encoded = content.filter.is_some();
    if let Some(filter) = &content.filter {
        xobject_dict.set("Filter", copy_object_deep(output, source, filter, cache)?);
    }
    if let Some(params) = &content.decode_params {
        xobject_dict.set("DecodeParms", copy_object_deep(output, source, params, cache)?);
    }

    let form = Stream::new(xobject_dict, content.data);
    Ok(output.add_object(form.with_compression(!encoded)))
}

/// Create an Image XObject from an encoded bleed strip.
///
/// The strip data is already Flate-encoded, so the stream is excluded from
/// document-level compression.
pub fn create_strip_xobject(output: &mut Document, strip: &BleedStrip) -> ObjectId {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(strip.width_px as i64));
    dict.set("Height", Object::Integer(strip.height_px as i64));
    dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

    output.add_object(Stream::new(dict, strip.data.clone()).with_compression(false))
}

/// PDF real number from a point value
pub(crate) fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

// =============================================================================
// Page Content
// =============================================================================

/// Content bytes for a page form.
///
/// `filter` is set only when the page's single content stream uses a filter
/// lopdf cannot decode; its encoded bytes are then carried over together with
/// their `/Filter` and `/DecodeParms`.
struct PageContent {
    data: Vec<u8>,
    filter: Option<Object>,
    decode_params: Option<Object>,
}

/// Page content: every content stream in order, decoded and newline separated.
fn page_content(doc: &Document, page_dict: &Dictionary) -> Result<PageContent> {
    let ids = content_stream_ids(doc, page_dict)?;
    let single = ids.len() == 1;

    let mut data = Vec::new();
    for id in ids {
        let stream = doc
            .get_object(id)
            .and_then(Object::as_stream)
            .map_err(|e| {
                BleedError::Composition(format!("content stream {} {} R: {}", id.0, id.1, e))
            })?;

        let bytes = if !stream.dict.has(b"Filter") {
            stream.content.clone()
        } else {
            match stream.decompressed_content() {
                Ok(decoded) => decoded,
                Err(_) if single => {
                    return Ok(PageContent {
                        data: stream.content.clone(),
                        filter: stream.dict.get(b"Filter").ok().cloned(),
                        decode_params: stream.dict.get(b"DecodeParms").ok().cloned(),
                    });
                }
                Err(e) => {
                    return Err(BleedError::Composition(format!(
                        "cannot decode content stream {} {} R: {}",
                        id.0, id.1, e
                    )));
                }
            }
        };

        if !data.is_empty() {
            data.push(b'\n');
        }
        data.extend_from_slice(&bytes);
    }

    Ok(PageContent {
        data,
        filter: None,
        decode_params: None,
    })
}

/// `/Contents` may be a stream, an array of streams, or a reference to such
/// an array. A page without contents is blank.
fn content_stream_ids(doc: &Document, page_dict: &Dictionary) -> Result<Vec<ObjectId>> {
    Ok(match page_dict.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id).map_err(BleedError::composition)? {
            Object::Array(items) => reference_ids(items),
            _ => vec![*id],
        },
        Ok(Object::Array(items)) => reference_ids(items),
        _ => Vec::new(),
    })
}

fn reference_ids(items: &[Object]) -> Vec<ObjectId> {
    items.iter().filter_map(|o| o.as_reference().ok()).collect()
}

// =============================================================================
// Object Copying
// =============================================================================

/// Copy `obj` into `output`, following references into `source`.
///
/// `cache` maps source ids to output ids and is shared across the whole run,
/// so fonts and images used by many pages are copied once. The output id is
/// reserved before descending, which makes reference cycles terminate.
/// `/Parent` links are dropped: they would drag the source page tree along.
pub fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    let copied = match obj {
        Object::Reference(id) => Object::Reference(copy_indirect(output, source, *id, cache)?),
        Object::Dictionary(dict) => Object::Dictionary(copy_dictionary(output, source, dict, cache)?),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect::<Result<_>>()?,
        ),
        Object::Stream(stream) => {
            let mut copy = Stream::new(
                copy_dictionary(output, source, &stream.dict, cache)?,
                stream.content.clone(),
            );
            copy.allows_compression = stream.allows_compression;
            Object::Stream(copy)
        }
        other => other.clone(),
    };
    Ok(copied)
}

fn copy_indirect(
    output: &mut Document,
    source: &Document,
    id: ObjectId,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    if let Some(&copied) = cache.get(&id) {
        return Ok(copied);
    }

    let new_id = output.new_object_id();
    cache.insert(id, new_id);

    // Dangling references become null, as a reader would treat them
    let value = match source.get_object(id) {
        Ok(target) => copy_object_deep(output, source, target, cache)?,
        Err(_) => Object::Null,
    };
    output.objects.insert(new_id, value);
    Ok(new_id)
}

fn copy_dictionary(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut copy = Dictionary::new();
    for (key, value) in dict.iter().filter(|(key, _)| key.as_slice() != b"Parent") {
        copy.set(key.clone(), copy_object_deep(output, source, value, cache)?);
    }
    Ok(copy)
}
