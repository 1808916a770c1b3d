//! Bleed generation - the page-by-page pipeline
//!
//! For every source page, in document order:
//! 1. Resolve the trim rectangle
//! 2. Rasterize the page and crop to the trim window
//! 3. Mirror the frame outwards by the bleed width
//! 4. Slice and encode the four bleed strips
//! 5. Compose the output page and append it to the output document
//!
//! The first failing page aborts the run; the partially built output is
//! dropped and never serialized.

mod document;
mod io;

pub use document::OutputDocument;
pub use io::{load_pdf_bytes, save_pdf_bytes};

use crate::geometry::resolve_trim;
use crate::mirror::mirror_frame;
use crate::options::BleedOptions;
use crate::raster::{RenderBackend, map_render_error, rasterize_page};
use crate::render::compose_page;
use crate::source::SourceDocument;
use crate::strips::extract_strips;
use crate::types::*;
use log::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What was done to one page
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PageReport {
    pub index: usize,
    pub trim_source: BoxKind,
    pub rotation: Rotation,
    pub trim_width_pt: f64,
    pub trim_height_pt: f64,
    pub output_width_pt: f64,
    pub output_height_pt: f64,
    /// Raster size after cropping to the trim window
    pub raster_width_px: u32,
    pub raster_height_px: u32,
    pub bleed_px: u32,
    /// Encoded size of the four strips together
    pub strip_bytes: usize,
}

/// Per-page summary of a completed run
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BleedReport {
    pub dpi: u32,
    pub pages: Vec<PageReport>,
    /// Size of the serialized output document
    pub output_bytes: usize,
}

impl BleedReport {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn total_strip_bytes(&self) -> usize {
        self.pages.iter().map(|p| p.strip_bytes).sum()
    }
}

/// Add bleed and crop marks to every page of a document.
///
/// Runs the blocking pipeline on a worker thread. The rendering backend is
/// created on that thread by `make_backend`, so it does not need to be `Send`.
pub async fn generate_bleed<B, F>(
    bytes: Vec<u8>,
    options: &BleedOptions,
    make_backend: F,
) -> Result<Vec<u8>>
where
    B: RenderBackend,
    F: FnOnce() -> Result<B> + Send + 'static,
{
    options.validate()?;
    let options = options.clone();

    tokio::task::spawn_blocking(move || {
        let backend = make_backend()?;
        generate_bleed_sync(&bytes, &backend, &options)
    })
    .await?
}

/// Blocking form of [`generate_bleed`]
pub fn generate_bleed_sync<B: RenderBackend + ?Sized>(
    bytes: &[u8],
    backend: &B,
    options: &BleedOptions,
) -> Result<Vec<u8>> {
    generate_bleed_with_report(bytes, backend, options).map(|(output, _)| output)
}

/// Run the pipeline and also return what was done to each page.
pub fn generate_bleed_with_report<B: RenderBackend + ?Sized>(
    bytes: &[u8],
    backend: &B,
    options: &BleedOptions,
) -> Result<(Vec<u8>, BleedReport)> {
    options.validate()?;

    // Two independent views over the same bytes
    let view = backend.open(bytes).map_err(|e| map_render_error(0, e))?;
    let source = SourceDocument::load(bytes)?;

    let page_count = source.page_count();
    if view.page_count() != page_count {
        return Err(BleedError::DocumentLoad(format!(
            "Renderer sees {} pages but the document has {}",
            view.page_count(),
            page_count
        )));
    }

    let mut output = OutputDocument::new();
    let mut report = BleedReport {
        dpi: options.dpi,
        ..Default::default()
    };

    for index in 0..page_count {
        info!("Processing page {} of {}", index + 1, page_count);

        let page = source.page(index)?;
        let trim = resolve_trim(&page)?;

        let frame = rasterize_page(view.as_ref(), &page, &trim, options)?;
        let (raster_width_px, raster_height_px) = (frame.width(), frame.height());

        // Raster buffers live only for this block
        let strips = {
            let mirrored = mirror_frame(frame, options.bleed_px(), options.overlap_policy, index)?;
            extract_strips(&mirrored, &trim, options)?
        };
        let strip_bytes = strips.iter().map(|s| s.data.len()).sum();
        debug!(
            "Page {}: {} strip bytes, {} px bleed",
            index + 1,
            strip_bytes,
            options.bleed_px()
        );

        let layout = compose_page(&page, &trim, strips, options);
        let (trim_width_pt, trim_height_pt) = trim.display_size();
        report.pages.push(PageReport {
            index,
            trim_source: trim.source,
            rotation: trim.rotation,
            trim_width_pt,
            trim_height_pt,
            output_width_pt: layout.width,
            output_height_pt: layout.height,
            raster_width_px,
            raster_height_px,
            bleed_px: options.bleed_px(),
            strip_bytes,
        });

        output.append_page(&source, &page, &layout)?;
    }

    let bytes = output.into_bytes()?;
    report.output_bytes = bytes.len();
    info!(
        "Bleed added to {} pages ({} bytes)",
        report.page_count(),
        report.output_bytes
    );

    Ok((bytes, report))
}
