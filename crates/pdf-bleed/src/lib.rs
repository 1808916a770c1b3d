pub mod bleed;
pub mod constants;
mod geometry;
mod marks;
mod mirror;
mod options;
mod preflight;
pub mod raster;
mod render;
mod source;
mod strips;
mod types;

pub use bleed::{
    BleedReport, OutputDocument, PageReport, generate_bleed, generate_bleed_sync,
    generate_bleed_with_report, load_pdf_bytes, save_pdf_bytes,
};
pub use geometry::{PixelRect, TrimRect, resolve_trim};
pub use marks::{CropMarkSet, OVERPRINT_GS_NAME};
pub use mirror::{MirroredFrame, mirror_frame};
pub use options::*;
pub use preflight::{
    CheckStatus, PagePlan, PageSummary, PreflightCheck, PreflightReport, StripPlan, plan_output,
    preflight,
};
pub use raster::{RasterFrame, RenderBackend, RenderError, RenderView, Viewport, rasterize_page};
pub use render::{OutputPage, SOURCE_PAGE_XOBJECT, compose_page, write_page};
pub use source::{SourceDocument, SourcePage};
pub use strips::{BleedStrip, StripSide, extract_strips, strip_placement, strip_source_rect};
pub use types::*;
