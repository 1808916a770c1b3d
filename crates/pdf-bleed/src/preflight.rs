//! Preflight analysis and dry-run planning
//!
//! [`preflight`] inspects a document before it is processed: real page
//! dimensions, a render-permission probe, and a short list of checks.
//! [`plan_output`] computes the output geometry of every page without
//! rendering anything.

use crate::constants::*;
use crate::geometry::{TrimRect, resolve_trim};
use crate::marks::CropMarkSet;
use crate::options::BleedOptions;
use crate::raster::{RasterFrame, RenderBackend, map_render_error};
use crate::source::SourceDocument;
use crate::strips::{StripSide, strip_placement};
use crate::types::*;
use log::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sizes differing by less than this are treated as equal (points)
const SIZE_TOLERANCE_PT: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PreflightCheck {
    pub id: String,
    pub name: String,
    pub status: CheckStatus,
    pub details: String,
}

impl PreflightCheck {
    fn new(id: &str, name: &str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            status,
            details: details.into(),
        }
    }
}

/// Real dimensions of one source page
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PageSummary {
    pub index: usize,
    /// Trim size as displayed, in points
    pub trim_width_pt: f64,
    pub trim_height_pt: f64,
    pub width_in: f64,
    pub height_in: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    /// Box the trim rectangle was resolved from
    pub positioning_box: BoxKind,
    pub rotation: Rotation,
    pub output_width_pt: f64,
    pub output_height_pt: f64,
}

impl PageSummary {
    fn new(index: usize, trim: &TrimRect, options: &BleedOptions) -> Self {
        let (width, height) = trim.display_size();
        let (output_width_pt, output_height_pt) = trim.output_size(options);
        Self {
            index,
            trim_width_pt: width,
            trim_height_pt: height,
            width_in: pt_to_in(width),
            height_in: pt_to_in(height),
            width_mm: pt_to_mm(width),
            height_mm: pt_to_mm(height),
            positioning_box: trim.source,
            rotation: trim.rotation,
            output_width_pt,
            output_height_pt,
        }
    }

    /// Human readable size, e.g. `8.5" x 11"`
    pub fn inches_label(&self) -> String {
        format!("{}\" x {}\"", round_to(self.width_in, 3), round_to(self.height_in, 3))
    }

    /// Human readable size, e.g. `215.9mm x 279.4mm`
    pub fn metric_label(&self) -> String {
        format!("{}mm x {}mm", round_to(self.width_mm, 1), round_to(self.height_mm, 1))
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PreflightReport {
    pub page_count: usize,
    pub pages: Vec<PageSummary>,
    pub checks: Vec<PreflightCheck>,
}

impl PreflightReport {
    /// Most severe status among the checks
    pub fn worst_status(&self) -> CheckStatus {
        self.checks
            .iter()
            .map(|c| c.status)
            .max_by_key(|s| match s {
                CheckStatus::Pass => 0,
                CheckStatus::Warn => 1,
                CheckStatus::Fail => 2,
            })
            .unwrap_or(CheckStatus::Pass)
    }
}

/// Analyse a document before bleed generation.
///
/// Renders the first page at a tiny scale to surface permission problems
/// early: a protected document fails with `ProtectedDocument`.
pub fn preflight<B: RenderBackend + ?Sized>(
    bytes: &[u8],
    backend: &B,
    options: &BleedOptions,
) -> Result<PreflightReport> {
    options.validate()?;

    let view = backend.open(bytes).map_err(|e| map_render_error(0, e))?;
    let viewport = view
        .viewport(0, PROBE_SCALE)
        .map_err(|e| map_render_error(0, e))?;
    let (probe_w, probe_h) = viewport.pixel_size();
    let mut probe = RasterFrame::blank(probe_w.max(1), probe_h.max(1), options.dpi);
    view.render(0, PROBE_SCALE, &mut probe)
        .map_err(|e| map_render_error(0, e))?;
    debug!("Render probe succeeded at {} x {} px", probe_w, probe_h);

    let source = SourceDocument::load(bytes)?;
    let mut pages = Vec::with_capacity(source.page_count());
    for index in 0..source.page_count() {
        let trim = resolve_trim(&source.page(index)?)?;
        pages.push(PageSummary::new(index, &trim, options));
    }

    let checks = vec![
        bleed_check(options),
        trim_box_check(&pages),
        page_sizes_check(&pages),
    ];

    info!(
        "Preflight: {} pages, {} checks",
        view.page_count(),
        checks.len()
    );

    Ok(PreflightReport {
        page_count: view.page_count(),
        pages,
        checks,
    })
}

/// Every incoming file is assumed to lack bleed.
fn bleed_check(options: &BleedOptions) -> PreflightCheck {
    PreflightCheck::new(
        "bleed",
        "Bleed Insufficient",
        CheckStatus::Fail,
        format!(
            "File will be processed to add a standard {}\" bleed margin and crop marks.",
            options.bleed_in
        ),
    )
}

fn trim_box_check(pages: &[PageSummary]) -> PreflightCheck {
    let fallback: Vec<String> = pages
        .iter()
        .filter(|p| p.positioning_box != BoxKind::TrimBox)
        .map(|p| (p.index + 1).to_string())
        .collect();

    if fallback.is_empty() {
        PreflightCheck::new(
            "trim-box",
            "Trim Box",
            CheckStatus::Pass,
            "Every page defines a TrimBox.",
        )
    } else {
        PreflightCheck::new(
            "trim-box",
            "Trim Box Missing",
            CheckStatus::Warn,
            format!(
                "No TrimBox on page(s) {}; the CropBox or MediaBox is used as the trim line.",
                fallback.join(", ")
            ),
        )
    }
}

fn page_sizes_check(pages: &[PageSummary]) -> PreflightCheck {
    let mixed = pages.windows(2).any(|pair| {
        (pair[0].trim_width_pt - pair[1].trim_width_pt).abs() > SIZE_TOLERANCE_PT
            || (pair[0].trim_height_pt - pair[1].trim_height_pt).abs() > SIZE_TOLERANCE_PT
    });

    match (mixed, pages.first()) {
        (false, Some(first)) => PreflightCheck::new(
            "page-sizes",
            "Page Sizes",
            CheckStatus::Pass,
            format!("All pages are {}.", first.inches_label()),
        ),
        (false, None) => {
            PreflightCheck::new("page-sizes", "Page Sizes", CheckStatus::Pass, "No pages.")
        }
        (true, _) => PreflightCheck::new(
            "page-sizes",
            "Mixed Page Sizes",
            CheckStatus::Warn,
            "Pages differ in trim size; each output page follows its own source page.",
        ),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// =============================================================================
// Planning
// =============================================================================

/// Expected size and placement of one bleed strip
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StripPlan {
    pub side: StripSide,
    pub width_px: u32,
    pub height_px: u32,
    pub placement: PageBox,
}

/// Output geometry of one page, computed without rendering
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PagePlan {
    pub index: usize,
    pub trim: TrimRect,
    pub output_width_pt: f64,
    pub output_height_pt: f64,
    pub trim_box: PageBox,
    pub bleed_box: PageBox,
    /// Raster size of the trim window at the configured DPI
    pub raster_width_px: u32,
    pub raster_height_px: u32,
    pub strips: Vec<StripPlan>,
    pub marks: CropMarkSet,
}

/// Compute the output geometry of every page without rendering.
pub fn plan_output(bytes: &[u8], options: &BleedOptions) -> Result<Vec<PagePlan>> {
    options.validate()?;
    let source = SourceDocument::load(bytes)?;

    (0..source.page_count())
        .map(|index| {
            let trim = resolve_trim(&source.page(index)?)?;
            Ok(plan_page(index, trim, options))
        })
        .collect()
}

fn plan_page(index: usize, trim: TrimRect, options: &BleedOptions) -> PagePlan {
    let (trim_w, trim_h) = trim.display_size();
    let (output_width_pt, output_height_pt) = trim.output_size(options);
    let inset = options.trim_inset_pt();
    let margin = options.crop_margin_pt();
    let scale = options.scale();
    let raster_width_px = (trim_w * scale).round() as u32;
    let raster_height_px = (trim_h * scale).round() as u32;
    let b = options.bleed_px();

    let strips = StripSide::ALL
        .iter()
        .map(|&side| {
            let (width_px, height_px) = match side {
                StripSide::Top | StripSide::Bottom => (raster_width_px + 2 * b, b),
                StripSide::Left | StripSide::Right => (b, raster_height_px),
            };
            StripPlan {
                side,
                width_px,
                height_px,
                placement: strip_placement(&trim, options, side),
            }
        })
        .collect();

    PagePlan {
        index,
        output_width_pt,
        output_height_pt,
        trim_box: PageBox::new(inset, inset, trim_w, trim_h),
        bleed_box: PageBox::new(
            margin,
            margin,
            output_width_pt - 2.0 * margin,
            output_height_pt - 2.0 * margin,
        ),
        raster_width_px,
        raster_height_px,
        strips,
        marks: CropMarkSet::new(&trim, options),
        trim,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(index: usize, w: f64, h: f64, positioning_box: BoxKind) -> PageSummary {
        PageSummary {
            index,
            trim_width_pt: w,
            trim_height_pt: h,
            width_in: pt_to_in(w),
            height_in: pt_to_in(h),
            width_mm: pt_to_mm(w),
            height_mm: pt_to_mm(h),
            positioning_box,
            rotation: Rotation::None,
            output_width_pt: w + 54.0,
            output_height_pt: h + 54.0,
        }
    }

    #[test]
    fn test_labels() {
        let page = summary(0, 612.0, 792.0, BoxKind::MediaBox);
        assert_eq!(page.inches_label(), "8.5\" x 11\"");
        assert_eq!(page.metric_label(), "215.9mm x 279.4mm");
    }

    #[test]
    fn test_trim_box_check_names_fallback_pages() {
        let pages = [
            summary(0, 612.0, 792.0, BoxKind::TrimBox),
            summary(1, 612.0, 792.0, BoxKind::CropBox),
        ];
        let check = trim_box_check(&pages);
        assert_eq!(check.status, CheckStatus::Warn);
        assert!(check.details.contains("page(s) 2;"));
    }

    #[test]
    fn test_mixed_sizes_warn() {
        let pages = [
            summary(0, 612.0, 792.0, BoxKind::TrimBox),
            summary(1, 792.0, 612.0, BoxKind::TrimBox),
        ];
        assert_eq!(page_sizes_check(&pages).status, CheckStatus::Warn);
        assert_eq!(page_sizes_check(&pages[..1]).status, CheckStatus::Pass);
    }

    #[test]
    fn test_bleed_check_always_fails() {
        let check = bleed_check(&BleedOptions::default());
        assert_eq!(check.status, CheckStatus::Fail);
        assert_eq!(
            check.details,
            "File will be processed to add a standard 0.125\" bleed margin and crop marks."
        );
    }
}
