//! Crop mark rendering for bleed pages
//!
//! This module computes the eight crop mark segments of an output page and
//! turns them into PDF content stream operations. Marks sit in the outer
//! crop margin, collinear with the trim edges, and stop at the bleed boundary.

use crate::constants::REGISTRATION_CMYK;
use crate::geometry::TrimRect;
use crate::options::BleedOptions;
use crate::types::Segment;

/// Name of the overprint graphics state in the page resources
pub const OVERPRINT_GS_NAME: &str = "GSReg";

/// The eight crop mark segments of one output page
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CropMarkSet {
    /// Two segments per trim corner: top-left, top-right, bottom-left, bottom-right
    pub segments: [Segment; 8],
    /// Stroke weight in points
    pub weight_pt: f32,
    /// Stroke colour as C, M, Y, K fractions
    pub cmyk: [f32; 4],
}

impl CropMarkSet {
    /// Derive the marks from the trim size and the configured margins
    pub fn new(trim: &TrimRect, options: &BleedOptions) -> Self {
        let (page_w, page_h) = trim.output_size(options);
        let (trim_w, trim_h) = trim.display_size();
        let margin = options.crop_margin_pt();
        let x1 = options.trim_inset_pt();
        let y1 = x1;
        let x2 = x1 + trim_w;
        let y2 = y1 + trim_h;

        let seg = |sx: f64, sy: f64, ex: f64, ey: f64| Segment {
            start: (sx, sy),
            end: (ex, ey),
        };

        let segments = [
            // Top-left
            seg(0.0, y2, margin, y2),
            seg(x1, page_h, x1, page_h - margin),
            // Top-right
            seg(page_w - margin, y2, page_w, y2),
            seg(x2, page_h, x2, page_h - margin),
            // Bottom-left
            seg(0.0, y1, margin, y1),
            seg(x1, 0.0, x1, margin),
            // Bottom-right
            seg(page_w - margin, y1, page_w, y1),
            seg(x2, 0.0, x2, margin),
        ];

        Self {
            segments,
            weight_pt: options.crop_mark_weight_pt,
            cmyk: REGISTRATION_CMYK,
        }
    }

    /// Content stream operations stroking every segment in registration colour
    pub fn to_content_ops(&self) -> String {
        let mut ops = String::new();

        // Save graphics state
        ops.push_str("q\n");
        ops.push_str(&format!("/{} gs\n", OVERPRINT_GS_NAME));

        let [c, m, y, k] = self.cmyk;
        ops.push_str(&format!("{} {} {} {} K\n", c, m, y, k));
        ops.push_str(&format!("{} w\n", self.weight_pt));
        ops.push_str("[] 0 d\n"); // solid line
        ops.push_str("0 J\n"); // butt caps, so marks end exactly at the bleed boundary

        for segment in &self.segments {
            ops.push_str(&format!(
                "{} {} m {} {} l S\n",
                fmt_coord(segment.start.0),
                fmt_coord(segment.start.1),
                fmt_coord(segment.end.0),
                fmt_coord(segment.end.1)
            ));
        }

        // Restore graphics state
        ops.push_str("Q\n");

        ops
    }
}

/// Format a coordinate for a content stream (no exponent notation)
pub(crate) fn fmt_coord(value: f64) -> String {
    let s = format!("{:.4}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}
