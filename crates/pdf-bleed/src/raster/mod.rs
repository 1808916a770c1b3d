//! Rasterization of source pages
//!
//! Actual rendering is delegated to a [`RenderBackend`]; this module owns the
//! pixel buffer contract around it:
//! - Frames are opaque RGB, pre-filled white before the engine draws
//! - Frame size is the engine viewport at `dpi / 72`, rounded to whole pixels
//! - The frame is cut down to the trim window before mirroring

#[cfg(feature = "pdfium")]
mod pdfium;

#[cfg(feature = "pdfium")]
pub use pdfium::{PdfiumBackend, PdfiumView};

use crate::constants::{BACKGROUND_RGB, MAX_FRAME_PIXELS};
use crate::geometry::TrimRect;
use crate::options::BleedOptions;
use crate::source::SourcePage;
use crate::types::*;
use image::{Rgb, RgbImage, RgbaImage, imageops};
use log::{debug, warn};
use thiserror::Error;

/// Errors reported by a rendering engine
#[derive(Error, Debug)]
pub enum RenderError {
    /// Document permissions (or a password) block rendering
    #[error("{0}")]
    Protected(String),
    /// The engine could not parse the document
    #[error("{0}")]
    Malformed(String),
    #[error("{0}")]
    Engine(String),
}

/// Page size as seen by the engine at a given scale, in display orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Pixel dimensions of a raster covering this viewport
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.width.round().max(0.0) as u32,
            self.height.round().max(0.0) as u32,
        )
    }
}

/// Rendering engine able to open documents from bytes
pub trait RenderBackend {
    fn open<'a>(&'a self, bytes: &'a [u8]) -> std::result::Result<Box<dyn RenderView + 'a>, RenderError>;
}

/// Render-capable view of one open document
pub trait RenderView {
    fn page_count(&self) -> usize;

    /// Page size in display orientation at `scale`
    fn viewport(&self, page_index: usize, scale: f64) -> std::result::Result<Viewport, RenderError>;

    /// Draw the page at `scale` onto `target`, which the caller has sized to
    /// the viewport and filled with the background colour.
    fn render(
        &self,
        page_index: usize,
        scale: f64,
        target: &mut RasterFrame,
    ) -> std::result::Result<(), RenderError>;
}

/// Opaque RGB pixel buffer for one page
#[derive(Debug, Clone, PartialEq)]
pub struct RasterFrame {
    pixels: RgbImage,
    dpi: u32,
}

impl RasterFrame {
    /// White frame of the given size
    pub fn blank(width: u32, height: u32, dpi: u32) -> Self {
        Self {
            pixels: RgbImage::from_pixel(width, height, Rgb(BACKGROUND_RGB)),
            dpi,
        }
    }

    pub fn from_pixels(pixels: RgbImage, dpi: u32) -> Self {
        Self { pixels, dpi }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbImage {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> RgbImage {
        self.pixels
    }

    /// Alpha-composite an engine bitmap over this frame, anchored top-left.
    /// Pixels outside the overlap are left untouched.
    pub fn composite_rgba(&mut self, source: &RgbaImage) {
        let width = self.width().min(source.width());
        let height = self.height().min(source.height());
        for y in 0..height {
            for x in 0..width {
                let [r, g, b, a] = source.get_pixel(x, y).0;
                let dst = self.pixels.get_pixel_mut(x, y);
                let alpha = a as u32;
                for (d, s) in dst.0.iter_mut().zip([r, g, b]) {
                    *d = ((s as u32 * alpha + *d as u32 * (255 - alpha) + 127) / 255) as u8;
                }
            }
        }
    }

    /// Keep only the pixels inside `window`
    fn crop(self, window: crate::geometry::PixelRect) -> Self {
        let pixels = imageops::crop_imm(&self.pixels, window.x, window.y, window.width, window.height)
            .to_image();
        Self {
            pixels,
            dpi: self.dpi,
        }
    }
}

/// Render one page and cut the result down to its trim window.
pub fn rasterize_page(
    view: &dyn RenderView,
    page: &SourcePage,
    trim: &TrimRect,
    options: &BleedOptions,
) -> Result<RasterFrame> {
    let scale = options.scale();
    let viewport = view
        .viewport(page.index, scale)
        .map_err(|e| map_render_error(page.index, e))?;
    let (width, height) = viewport.pixel_size();
    if width == 0 || height == 0 {
        return Err(BleedError::raster(
            page.index,
            format!("empty viewport of {} x {} px", width, height),
        ));
    }
    if u64::from(width) * u64::from(height) > MAX_FRAME_PIXELS {
        return Err(BleedError::raster(
            page.index,
            format!(
                "{} x {} px at {} DPI exceeds the raster limit of {} pixels",
                width, height, options.dpi, MAX_FRAME_PIXELS
            ),
        ));
    }

    let mut frame = RasterFrame::blank(width, height, options.dpi);
    view.render(page.index, scale, &mut frame)
        .map_err(|e| map_render_error(page.index, e))?;
    debug!("Page {}: rendered {} x {} px", page.index + 1, width, height);

    let window = trim.pixel_window(page, scale, width, height).ok_or_else(|| {
        BleedError::geometry(page.index, "trim box lies outside the rendered page")
    })?;

    if window.x == 0 && window.y == 0 && window.width == width && window.height == height {
        return Ok(frame);
    }

    let (display_w, display_h) = trim.display_size();
    let expected_w = (display_w * scale).round() as u32;
    let expected_h = (display_h * scale).round() as u32;
    if window.width != expected_w || window.height != expected_h {
        warn!(
            "Page {}: trim window clamped to {} x {} px (expected {} x {})",
            page.index + 1,
            window.width,
            window.height,
            expected_w,
            expected_h
        );
    }
    debug!(
        "Page {}: cropping to trim window at ({}, {})",
        page.index + 1,
        window.x,
        window.y
    );

    Ok(frame.crop(window))
}

/// Translate an engine error into the pipeline taxonomy
pub(crate) fn map_render_error(page_index: usize, err: RenderError) -> BleedError {
    match err {
        RenderError::Protected(detail) => BleedError::ProtectedDocument(detail),
        RenderError::Malformed(detail) => BleedError::DocumentLoad(detail),
        RenderError::Engine(detail) => BleedError::raster(page_index, detail),
    }
}
