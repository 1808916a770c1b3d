//! Trim geometry
//!
//! Resolves the authoritative trim rectangle of a page and derives every
//! coordinate the later stages need from it: the trim window inside the
//! rendered raster, the output page size, and the transform that places the
//! embedded original page so its trim origin lands on the output trim origin.

use crate::options::BleedOptions;
use crate::source::SourcePage;
use crate::types::*;
use log::debug;

/// Resolved printable area of a page
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrimRect {
    /// Width in points, in the page's unrotated space
    pub width: f64,
    /// Height in points, in the page's unrotated space
    pub height: f64,
    /// Positioning box origin minus MediaBox origin (x)
    pub offset_x: f64,
    /// Positioning box origin minus MediaBox origin (y)
    pub offset_y: f64,
    /// Box the rectangle was taken from
    pub source: BoxKind,
    pub rotation: Rotation,
}

/// Rectangle in raster space (origin top-left, pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Resolve the trim rectangle: TrimBox, else CropBox, else MediaBox.
pub fn resolve_trim(page: &SourcePage) -> Result<TrimRect> {
    let (positioning, source) = match (page.trim_box, page.crop_box) {
        (Some(trim), _) => (trim, BoxKind::TrimBox),
        (None, Some(crop)) => (crop, BoxKind::CropBox),
        (None, None) => (page.media_box, BoxKind::MediaBox),
    };

    if !(positioning.width.is_finite() && positioning.height.is_finite())
        || positioning.width <= 0.0
        || positioning.height <= 0.0
    {
        return Err(BleedError::geometry(
            page.index,
            format!(
                "degenerate {} of {} x {} pt",
                String::from_utf8_lossy(source.pdf_key()),
                positioning.width,
                positioning.height
            ),
        ));
    }

    let trim = TrimRect {
        width: positioning.width,
        height: positioning.height,
        offset_x: positioning.x - page.media_box.x,
        offset_y: positioning.y - page.media_box.y,
        source,
        rotation: page.rotation,
    };

    debug!(
        "Page {}: trim {:.3} x {:.3} pt from {:?}, offset ({:.3}, {:.3})",
        page.index + 1,
        trim.width,
        trim.height,
        source,
        trim.offset_x,
        trim.offset_y
    );

    Ok(trim)
}

impl TrimRect {
    /// Trim size as displayed, after applying the page rotation
    pub fn display_size(&self) -> (f64, f64) {
        if self.rotation.is_quarter_turn() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Output page size: trim grown by bleed and crop margin on every side
    pub fn output_size(&self, options: &BleedOptions) -> (f64, f64) {
        let (width, height) = self.display_size();
        let grow = 2.0 * options.trim_inset_pt();
        (width + grow, height + grow)
    }

    /// Transformation matrix placing the embedded page (positioned by its
    /// MediaBox origin) so that the trim rectangle, in display orientation,
    /// starts at `(inset, inset)` on the output page.
    pub fn placement_matrix(&self, inset: f64) -> [f64; 6] {
        let (ox, oy) = (self.offset_x, self.offset_y);
        let (w, h) = (self.width, self.height);
        match self.rotation {
            Rotation::None => [1.0, 0.0, 0.0, 1.0, inset - ox, inset - oy],
            Rotation::Clockwise90 => [0.0, -1.0, 1.0, 0.0, inset - oy, inset + ox + w],
            Rotation::Clockwise180 => [-1.0, 0.0, 0.0, -1.0, inset + ox + w, inset + oy + h],
            Rotation::Clockwise270 => [0.0, 1.0, -1.0, 0.0, inset + oy + h, inset - ox],
        }
    }

    /// Locate the trim rectangle inside a raster of the page's visible box.
    ///
    /// `frame_width`/`frame_height` are the rendered raster dimensions in
    /// display orientation. Edges are rounded to whole pixels and the result
    /// is clamped to the frame; `None` when nothing of the trim is visible.
    pub fn pixel_window(
        &self,
        page: &SourcePage,
        scale: f64,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<PixelRect> {
        let visible = page.visible_box();
        let trim_x = page.media_box.x + self.offset_x;
        let trim_top = page.media_box.y + self.offset_y + self.height;

        // Unrotated raster space, y growing downwards from the visible top edge
        let left = trim_x - visible.x;
        let top = visible.top() - trim_top;
        let x0 = (left * scale).round() as i64;
        let x1 = ((left + self.width) * scale).round() as i64;
        let y0 = (top * scale).round() as i64;
        let y1 = ((top + self.height) * scale).round() as i64;

        let (fw, fh) = (frame_width as i64, frame_height as i64);
        let (unrotated_w, unrotated_h) = if self.rotation.is_quarter_turn() {
            (fh, fw)
        } else {
            (fw, fh)
        };

        let (rx0, ry0, rx1, ry1) = match self.rotation {
            Rotation::None => (x0, y0, x1, y1),
            Rotation::Clockwise90 => (unrotated_h - y1, x0, unrotated_h - y0, x1),
            Rotation::Clockwise180 => (
                unrotated_w - x1,
                unrotated_h - y1,
                unrotated_w - x0,
                unrotated_h - y0,
            ),
            Rotation::Clockwise270 => (y0, unrotated_w - x1, y1, unrotated_w - x0),
        };

        let cx0 = rx0.clamp(0, fw);
        let cy0 = ry0.clamp(0, fh);
        let cx1 = rx1.clamp(0, fw);
        let cy1 = ry1.clamp(0, fh);
        if cx1 <= cx0 || cy1 <= cy0 {
            return None;
        }

        Some(PixelRect {
            x: cx0 as u32,
            y: cy0 as u32,
            width: (cx1 - cx0) as u32,
            height: (cy1 - cy0) as u32,
        })
    }
}
