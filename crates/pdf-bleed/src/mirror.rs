//! Mirrored bleed compositing
//!
//! Builds a raster enlarged by the bleed width on every side. The centre is a
//! verbatim copy of the rendered page; each border band is the adjacent edge
//! of the page reflected across the trim line, and each corner block is the
//! page corner reflected across both axes. Every operation is a whole-pixel
//! copy: no blending, no resampling.

use crate::options::OverlapPolicy;
use crate::raster::RasterFrame;
use crate::types::*;
use image::{RgbImage, imageops};
use log::debug;

/// Rendered page surrounded by its mirrored bleed
#[derive(Debug, Clone, PartialEq)]
pub struct MirroredFrame {
    pixels: RgbImage,
    bleed_px: u32,
    source_width: u32,
    source_height: u32,
}

impl MirroredFrame {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn bleed_px(&self) -> u32 {
        self.bleed_px
    }

    /// Size of the original frame copied into the centre
    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Owned copy of a rectangular block of `source`
fn block(source: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> RgbImage {
    imageops::crop_imm(source, x, y, width, height).to_image()
}

/// Enlarge `frame` by `bleed_px` on every side, filling the border with
/// reflections of the frame's edges and corners. Consumes the frame.
pub fn mirror_frame(
    frame: RasterFrame,
    bleed_px: u32,
    policy: OverlapPolicy,
    page_index: usize,
) -> Result<MirroredFrame> {
    let source = frame.into_pixels();
    let (w, h) = source.dimensions();
    let b = bleed_px;

    if b > w.min(h) {
        return Err(BleedError::geometry(
            page_index,
            format!("bleed of {} px exceeds the rendered page ({} x {} px)", b, w, h),
        ));
    }
    if policy == OverlapPolicy::Reject && 2 * b > w.min(h) {
        return Err(BleedError::geometry(
            page_index,
            format!(
                "bleed of {} px exceeds half of the rendered page ({} x {} px)",
                b, w, h
            ),
        ));
    }

    let mut out = RgbImage::new(w + 2 * b, h + 2 * b);
    let (bi, wi, hi) = (b as i64, w as i64, h as i64);

    // Centre
    imageops::replace(&mut out, &source, bi, bi);

    if b > 0 {
        // Edges
        let top = imageops::flip_vertical(&block(&source, 0, 0, w, b));
        imageops::replace(&mut out, &top, bi, 0);

        let bottom = imageops::flip_vertical(&block(&source, 0, h - b, w, b));
        imageops::replace(&mut out, &bottom, bi, hi + bi);

        let left = imageops::flip_horizontal(&block(&source, 0, 0, b, h));
        imageops::replace(&mut out, &left, 0, bi);

        let right = imageops::flip_horizontal(&block(&source, w - b, 0, b, h));
        imageops::replace(&mut out, &right, wi + bi, bi);

        // Corners, reflected across both axes
        let corners = [
            (0, 0, 0, 0),
            (w - b, 0, wi + bi, 0),
            (0, h - b, 0, hi + bi),
            (w - b, h - b, wi + bi, hi + bi),
        ];
        for (sx, sy, dx, dy) in corners {
            let reflected = imageops::rotate180(&block(&source, sx, sy, b, b));
            imageops::replace(&mut out, &reflected, dx, dy);
        }
    }

    debug!(
        "Page {}: mirrored {} x {} px to {} x {} px",
        page_index + 1,
        w,
        h,
        out.width(),
        out.height()
    );

    Ok(MirroredFrame {
        pixels: out,
        bleed_px: b,
        source_width: w,
        source_height: h,
    })
}
