//! Output page composition
//!
//! [`compose_page`] lays out one bleed page as a plain value: page size,
//! strip placements, the transform for the embedded original page and the
//! crop marks. [`write_page`] turns that value into PDF objects inside the
//! output document.

use crate::geometry::TrimRect;
use crate::marks::{CropMarkSet, OVERPRINT_GS_NAME, fmt_coord};
use crate::options::BleedOptions;
use crate::source::{SourceDocument, SourcePage};
use crate::strips::BleedStrip;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

use super::xobject::{create_page_xobject, create_strip_xobject, real};

/// Resource name of the embedded source page
pub const SOURCE_PAGE_XOBJECT: &str = "SrcPage";

/// A fully laid out bleed page, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPage {
    /// Index of the source page this page was built from
    pub source_index: usize,
    /// Page width in points
    pub width: f64,
    /// Page height in points
    pub height: f64,
    /// Trim rectangle on this page (points)
    pub trim_box: PageBox,
    /// Trim rectangle grown by the bleed (points)
    pub bleed_box: PageBox,
    pub strips: Vec<BleedStrip>,
    /// Transform applied to the embedded source page
    pub content_matrix: [f64; 6],
    pub marks: CropMarkSet,
}

impl OutputPage {
    /// Where the embedded page's MediaBox origin lands (unrotated pages)
    pub fn content_origin(&self) -> (f64, f64) {
        (self.content_matrix[4], self.content_matrix[5])
    }
}

/// Lay out the output page for one source page.
pub fn compose_page(
    page: &SourcePage,
    trim: &TrimRect,
    strips: Vec<BleedStrip>,
    options: &BleedOptions,
) -> OutputPage {
    let (width, height) = trim.output_size(options);
    let (trim_w, trim_h) = trim.display_size();
    let inset = options.trim_inset_pt();
    let margin = options.crop_margin_pt();

    OutputPage {
        source_index: page.index,
        width,
        height,
        trim_box: PageBox::new(inset, inset, trim_w, trim_h),
        bleed_box: PageBox::new(margin, margin, width - 2.0 * margin, height - 2.0 * margin),
        strips,
        content_matrix: trim.placement_matrix(inset),
        marks: CropMarkSet::new(trim, options),
    }
}

/// Write a composed page into `output` and return the new page object id.
///
/// The page is not linked into the page tree; the caller appends it.
pub fn write_page(
    output: &mut Document,
    source: &SourceDocument,
    page: &SourcePage,
    layout: &OutputPage,
    parent_pages_id: ObjectId,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let mut content_ops = Vec::new();
    let mut xobjects = Dictionary::new();

    // Bleed strips, drawn first so the original page sits on top
    for strip in &layout.strips {
        let name = strip.side.resource_name();
        let image_id = create_strip_xobject(output, strip);
        xobjects.set(name, Object::Reference(image_id));
        content_ops.push(generate_image_command(name, &strip.placement));
    }

    // Original page content, unmodified
    let form_id = create_page_xobject(output, source.document(), page, cache)?;
    xobjects.set(SOURCE_PAGE_XOBJECT, Object::Reference(form_id));
    content_ops.push(generate_placement_command(
        SOURCE_PAGE_XOBJECT,
        &layout.content_matrix,
    ));

    // Crop marks
    content_ops.push(layout.marks.to_content_ops());

    let mut ext_g_states = Dictionary::new();
    ext_g_states.set(OVERPRINT_GS_NAME, Object::Dictionary(overprint_state()));

    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));
    resources.set("ExtGState", Object::Dictionary(ext_g_states));

    let content_id = output.add_object(Stream::new(
        Dictionary::new(),
        content_ops.concat().into_bytes(),
    ));

    let mut page_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(parent_pages_id)),
    ]);
    page_dict.set(
        "MediaBox",
        box_array(&PageBox::new(0.0, 0.0, layout.width, layout.height)),
    );
    page_dict.set("TrimBox", box_array(&layout.trim_box));
    page_dict.set("BleedBox", box_array(&layout.bleed_box));
    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set("Resources", Object::Dictionary(resources));

    Ok(output.add_object(page_dict))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Draw an image XObject scaled into `rect`.
fn generate_image_command(name: &str, rect: &PageBox) -> String {
    format!(
        "q {} 0 0 {} {} {} cm /{} Do Q\n",
        fmt_coord(rect.width),
        fmt_coord(rect.height),
        fmt_coord(rect.x),
        fmt_coord(rect.y),
        name
    )
}

/// Draw a form XObject under the given transformation matrix.
fn generate_placement_command(name: &str, matrix: &[f64; 6]) -> String {
    let [a, b, c, d, e, f] = matrix.map(fmt_coord);
    format!("q {} {} {} {} {} {} cm /{} Do Q\n", a, b, c, d, e, f, name)
}

/// Graphics state making the crop marks overprint every separation
fn overprint_state() -> Dictionary {
    let mut gs = Dictionary::new();
    gs.set("Type", Object::Name(b"ExtGState".to_vec()));
    gs.set("OP", Object::Boolean(true));
    gs.set("op", Object::Boolean(true));
    gs.set("OPM", Object::Integer(1));
    gs
}

fn box_array(rect: &PageBox) -> Object {
    Object::Array(vec![
        real(rect.x),
        real(rect.y),
        real(rect.right()),
        real(rect.top()),
    ])
}
