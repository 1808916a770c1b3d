#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdf_bleed::{RasterFrame, RenderBackend, RenderError, RenderView, SourceDocument, Viewport};
use std::cell::RefCell;

/// One page of a synthetic test document
#[derive(Debug, Clone)]
pub struct TestPage {
    pub media: [f64; 4],
    pub crop: Option<[f64; 4]>,
    pub trim: Option<[f64; 4]>,
    pub rotate: Option<i64>,
}

impl TestPage {
    pub fn letter() -> Self {
        Self::sized(612.0, 792.0)
    }

    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            media: [0.0, 0.0, width, height],
            crop: None,
            trim: None,
            rotate: None,
        }
    }

    pub fn with_trim(mut self, trim: [f64; 4]) -> Self {
        self.trim = Some(trim);
        self
    }

    pub fn with_crop(mut self, crop: [f64; 4]) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn with_media(mut self, media: [f64; 4]) -> Self {
        self.media = media;
        self
    }

    pub fn with_rotate(mut self, degrees: i64) -> Self {
        self.rotate = Some(degrees);
        self
    }
}

fn rect(values: [f64; 4]) -> Object {
    Object::Array(values.iter().map(|&v| Object::Real(v as f32)).collect())
}

/// Build a document whose pages all share one image resource.
pub fn build_document(pages: &[TestPage]) -> Document {
    let mut doc = Document::with_version("1.7");

    // Create page tree root ID
    let pages_id = doc.new_object_id();

    // Shared 2x2 RGB image, referenced from every page
    let logo_id = doc.add_object(Stream::new(
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(2)),
            ("Height", Object::Integer(2)),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
        ]),
        vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
    ));

    let mut kids = Vec::new();
    for page in pages {
        let content = format!(
            "q 0.2 0.4 0.6 rg {} {} 100 100 re f Q q 50 0 0 50 {} {} cm /Logo Do Q",
            page.media[0] + 10.0,
            page.media[1] + 10.0,
            page.media[0] + 20.0,
            page.media[1] + 20.0
        );
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut xobjects = Dictionary::new();
        xobjects.set("Logo", Object::Reference(logo_id));
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let mut page_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("MediaBox", rect(page.media)),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if let Some(crop) = page.crop {
            page_dict.set("CropBox", rect(crop));
        }
        if let Some(trim) = page.trim {
            page_dict.set("TrimBox", rect(trim));
        }
        if let Some(rotate) = page.rotate {
            page_dict.set("Rotate", Object::Integer(rotate));
        }
        kids.push(Object::Reference(doc.add_object(page_dict)));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(pages.len() as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    doc
}

pub fn build_pdf(pages: &[TestPage]) -> Vec<u8> {
    let mut doc = build_document(pages);
    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

pub fn letter_pdf(num_pages: usize) -> Vec<u8> {
    build_pdf(&vec![TestPage::letter(); num_pages])
}

/// One Letter page whose `/Contents` is whatever `contents` returns.
pub fn letter_pdf_with_contents(contents: impl FnOnce(&mut Document) -> Object) -> Vec<u8> {
    let mut doc = build_document(&[TestPage::letter()]);
    let page_id = doc.get_pages()[&1];
    let value = contents(&mut doc);
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .unwrap()
        .set("Contents", value);

    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

/// ASCIIHexDecode encoding of `data`, with its end-of-data marker
pub fn ascii_hex(data: &[u8]) -> Vec<u8> {
    let mut encoded: String = data.iter().map(|b| format!("{:02X}", b)).collect();
    encoded.push('>');
    encoded.into_bytes()
}

// =============================================================================
// Synthetic rendering backend
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behaviour {
    /// Render a deterministic coordinate pattern
    Pattern,
    /// Refuse to open the document
    Protected,
    /// Fail rendering the page with this 0-based index
    FailOnPage(usize),
    /// Report more pages than the document has
    ExtraPages(usize),
}

/// Deterministic stand-in for a real rendering engine.
///
/// Viewports follow the page's visible box and rotation; every rendered
/// pixel encodes its own coordinates and the page index.
pub struct SyntheticBackend {
    behaviour: Behaviour,
    /// Page indices in the order they were rendered
    pub rendered: RefCell<Vec<usize>>,
}

impl SyntheticBackend {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            rendered: RefCell::new(Vec::new()),
        }
    }

    pub fn pattern() -> Self {
        Self::new(Behaviour::Pattern)
    }

    pub fn rendered_pages(&self) -> Vec<usize> {
        self.rendered.borrow().clone()
    }
}

impl RenderBackend for SyntheticBackend {
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn RenderView + 'a>, RenderError> {
        if self.behaviour == Behaviour::Protected {
            return Err(RenderError::Protected(
                "document permissions do not allow rendering".to_string(),
            ));
        }

        let source =
            SourceDocument::load(bytes).map_err(|e| RenderError::Malformed(e.to_string()))?;
        let mut sizes = Vec::new();
        for index in 0..source.page_count() {
            let page = source
                .page(index)
                .map_err(|e| RenderError::Malformed(e.to_string()))?;
            let visible = page.visible_box();
            sizes.push(if page.rotation.is_quarter_turn() {
                (visible.height, visible.width)
            } else {
                (visible.width, visible.height)
            });
        }

        let extra = match self.behaviour {
            Behaviour::ExtraPages(n) => n,
            _ => 0,
        };

        Ok(Box::new(SyntheticView {
            backend: self,
            sizes,
            extra,
        }))
    }
}

struct SyntheticView<'a> {
    backend: &'a SyntheticBackend,
    sizes: Vec<(f64, f64)>,
    extra: usize,
}

impl RenderView for SyntheticView<'_> {
    fn page_count(&self) -> usize {
        self.sizes.len() + self.extra
    }

    fn viewport(&self, page_index: usize, scale: f64) -> Result<Viewport, RenderError> {
        let (width, height) = self
            .sizes
            .get(page_index)
            .ok_or_else(|| RenderError::Engine(format!("no page {}", page_index)))?;
        Ok(Viewport {
            width: width * scale,
            height: height * scale,
        })
    }

    fn render(
        &self,
        page_index: usize,
        _scale: f64,
        target: &mut RasterFrame,
    ) -> Result<(), RenderError> {
        self.backend.rendered.borrow_mut().push(page_index);
        if self.backend.behaviour == Behaviour::FailOnPage(page_index) {
            return Err(RenderError::Engine("engine crashed".to_string()));
        }
        for (x, y, pixel) in target.pixels_mut().enumerate_pixels_mut() {
            pixel.0 = pattern_pixel(page_index, x, y);
        }
        Ok(())
    }
}

/// Colour the synthetic backend paints at `(x, y)` of a page
pub fn pattern_pixel(page_index: usize, x: u32, y: u32) -> [u8; 3] {
    [(x % 251) as u8, (y % 241) as u8, (page_index * 40 % 256) as u8]
}

// =============================================================================
// Output inspection
// =============================================================================

pub fn load_output(bytes: &[u8]) -> Document {
    Document::load_mem(bytes).unwrap()
}

pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// `[llx, lly, urx, ury]` of a page box
pub fn page_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> [f64; 4] {
    let array = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(key)
        .unwrap()
        .as_array()
        .unwrap();
    let mut values = [0.0; 4];
    for (slot, item) in values.iter_mut().zip(array) {
        *slot = item.as_float().unwrap() as f64;
    }
    values
}

/// The Form XObject carrying the original page on an output page
pub fn source_form(doc: &Document, page_index: usize) -> &Stream {
    let page = doc.get_dictionary(page_ids(doc)[page_index]).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let form_id = xobjects
        .get(pdf_bleed::SOURCE_PAGE_XOBJECT.as_bytes())
        .unwrap()
        .as_reference()
        .unwrap();
    doc.get_object(form_id).unwrap().as_stream().unwrap()
}

/// Width and height of every image XObject in the document
pub fn image_sizes(doc: &Document) -> Vec<(i64, i64)> {
    let mut sizes: Vec<(i64, i64)> = doc
        .objects
        .values()
        .filter_map(|obj| obj.as_stream().ok())
        .filter(|stream| {
            stream
                .dict
                .get(b"Subtype")
                .and_then(|s| s.as_name())
                .map(|n| n == b"Image")
                .unwrap_or(false)
        })
        .map(|stream| {
            (
                stream.dict.get(b"Width").unwrap().as_i64().unwrap(),
                stream.dict.get(b"Height").unwrap().as_i64().unwrap(),
            )
        })
        .collect();
    sizes.sort();
    sizes
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {}, got {}",
        expected,
        actual
    );
}
