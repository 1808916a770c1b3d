//! Shared constants for bleed generation
//!
//! This module centralizes the prepress constants used throughout
//! the pipeline. They only seed [`BleedOptions::default`](crate::BleedOptions);
//! every stage reads its values from the options it is handed.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per inch (PDF user space unit)
pub const POINTS_PER_INCH: f64 = 72.0;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Convert inches to points
#[inline]
pub fn in_to_pt(inches: f64) -> f64 {
    inches * POINTS_PER_INCH
}

/// Convert points to inches
#[inline]
pub fn pt_to_in(pt: f64) -> f64 {
    pt / POINTS_PER_INCH
}

/// Convert points to millimeters
#[inline]
pub fn pt_to_mm(pt: f64) -> f64 {
    pt_to_in(pt) * MM_PER_INCH
}

// =============================================================================
// Default Page Dimensions
// =============================================================================

/// Default page width in points (US Letter: 8.5" × 11")
pub const DEFAULT_PAGE_WIDTH_PT: f64 = 612.0;

/// Default page height in points (US Letter)
pub const DEFAULT_PAGE_HEIGHT_PT: f64 = 792.0;

/// Default page dimensions as tuple (width, height)
pub const DEFAULT_PAGE_DIMENSIONS: (f64, f64) = (DEFAULT_PAGE_WIDTH_PT, DEFAULT_PAGE_HEIGHT_PT);

// =============================================================================
// Bleed Geometry
// =============================================================================

/// Render resolution for the bleed raster (dots per inch)
pub const DPI: u32 = 300;

/// Upper bound accepted for the render resolution
pub const MAX_DPI: u32 = 2400;

/// Bleed extending past the trim line (inches)
pub const BLEED_IN: f32 = 0.125;

/// Margin outside the bleed reserved for crop marks (inches)
pub const CROP_MARGIN_IN: f32 = 0.25;

// =============================================================================
// Printer's Marks
// =============================================================================

/// Line width for crop marks (points)
pub const CROP_MARK_WEIGHT_PT: f32 = 0.5;

/// Registration black: 100% of all four process separations (C, M, Y, K)
pub const REGISTRATION_CMYK: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

// =============================================================================
// Raster
// =============================================================================

/// Background used under rendered page content
pub const BACKGROUND_RGB: [u8; 3] = [255, 255, 255];

/// Scale used when probing whether a document can be rendered at all
pub const PROBE_SCALE: f64 = 0.1;

/// Largest page raster allocated, in pixels (US Letter at `MAX_DPI` fits)
pub const MAX_FRAME_PIXELS: u64 = 600_000_000;
