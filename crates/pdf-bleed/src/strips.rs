//! Bleed strip extraction
//!
//! Slices the four border bands out of a mirrored frame and encodes each as
//! a lossless (zlib / `FlateDecode`) RGB block. Top and bottom strips span the
//! full mirrored width and so carry the corners; left and right strips cover
//! the original height only. Each strip records the rectangle it occupies on
//! the output page, which tiles the bleed band without gaps or overlap.

use crate::geometry::TrimRect;
use crate::mirror::MirroredFrame;
use crate::options::BleedOptions;
use crate::types::*;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use image::{RgbImage, imageops};
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StripSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl StripSide {
    pub const ALL: [StripSide; 4] = [
        StripSide::Top,
        StripSide::Bottom,
        StripSide::Left,
        StripSide::Right,
    ];

    /// Resource name used for the strip image on the output page
    pub fn resource_name(self) -> &'static str {
        match self {
            StripSide::Top => "BleedTop",
            StripSide::Bottom => "BleedBottom",
            StripSide::Left => "BleedLeft",
            StripSide::Right => "BleedRight",
        }
    }
}

/// One losslessly encoded border band of the mirrored frame
#[derive(Debug, Clone, PartialEq)]
pub struct BleedStrip {
    pub side: StripSide,
    pub width_px: u32,
    pub height_px: u32,
    /// zlib-compressed RGB samples, 8 bits per component
    pub data: Vec<u8>,
    /// Where the strip is drawn on the output page (points)
    pub placement: PageBox,
}

impl BleedStrip {
    /// Decompress the strip back into pixels
    pub fn decode(&self) -> Result<RgbImage> {
        let mut raw = Vec::with_capacity((self.width_px * self.height_px * 3) as usize);
        ZlibDecoder::new(self.data.as_slice()).read_to_end(&mut raw)?;
        RgbImage::from_raw(self.width_px, self.height_px, raw)
            .ok_or_else(|| BleedError::Composition(format!("{:?} strip data is truncated", self.side)))
    }
}

/// Pixel rectangle of a strip inside the mirrored frame: (x, y, width, height)
pub fn strip_source_rect(mirrored: &MirroredFrame, side: StripSide) -> (u32, u32, u32, u32) {
    let b = mirrored.bleed_px();
    let (full_w, full_h) = (mirrored.width(), mirrored.height());
    let (_, source_h) = mirrored.source_size();
    match side {
        StripSide::Top => (0, 0, full_w, b),
        StripSide::Bottom => (0, full_h - b, full_w, b),
        StripSide::Left => (0, b, b, source_h),
        StripSide::Right => (full_w - b, b, b, source_h),
    }
}

/// Placement rectangle of a strip on the output page, in points
pub fn strip_placement(trim: &TrimRect, options: &BleedOptions, side: StripSide) -> PageBox {
    let (page_w, page_h) = trim.output_size(options);
    let (_, trim_h) = trim.display_size();
    let margin = options.crop_margin_pt();
    let bleed = options.bleed_pt();
    match side {
        StripSide::Top => PageBox::new(margin, page_h - margin - bleed, page_w - 2.0 * margin, bleed),
        StripSide::Bottom => PageBox::new(margin, margin, page_w - 2.0 * margin, bleed),
        StripSide::Left => PageBox::new(margin, margin + bleed, bleed, trim_h),
        StripSide::Right => PageBox::new(page_w - margin - bleed, margin + bleed, bleed, trim_h),
    }
}

/// Extract and encode the four bleed strips of a mirrored frame.
pub fn extract_strips(
    mirrored: &MirroredFrame,
    trim: &TrimRect,
    options: &BleedOptions,
) -> Result<Vec<BleedStrip>> {
    StripSide::ALL
        .iter()
        .map(|&side| {
            let (x, y, width, height) = strip_source_rect(mirrored, side);
            let pixels = imageops::crop_imm(mirrored.pixels(), x, y, width, height).to_image();
            Ok(BleedStrip {
                side,
                width_px: width,
                height_px: height,
                data: encode_lossless(&pixels)?,
                placement: strip_placement(trim, options, side),
            })
        })
        .collect()
}

fn encode_lossless(pixels: &RgbImage) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(pixels.as_raw())?;
    Ok(encoder.finish()?)
}
