//! Rendering through the pdfium shared library

use super::{RasterFrame, RenderBackend, RenderError, RenderView, Viewport};
use log::debug;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Pdfium bound at runtime
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    /// Bind pdfium, trying `lib_dir` first, then the vendored library,
    /// then falling back to the system library.
    pub fn bind(lib_dir: Option<&Path>) -> std::result::Result<Self, RenderError> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(dir) = lib_dir {
            candidates.push(dir.to_path_buf());
        }
        // When running from cargo, the working directory is the workspace root
        if let Ok(mut vendor) = std::env::current_dir() {
            vendor.push("vendor/pdfium/lib");
            if vendor.exists() {
                candidates.push(vendor);
            }
        }

        for dir in candidates {
            if let Ok(bindings) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            {
                debug!("Bound pdfium from {}", dir.display());
                return Ok(Self {
                    pdfium: Pdfium::new(bindings),
                });
            }
        }

        Pdfium::bind_to_system_library()
            .map(|bindings| Self {
                pdfium: Pdfium::new(bindings),
            })
            .map_err(|e| RenderError::Engine(format!("Failed to load pdfium library: {:?}", e)))
    }
}

impl RenderBackend for PdfiumBackend {
    fn open<'a>(&'a self, bytes: &'a [u8]) -> std::result::Result<Box<dyn RenderView + 'a>, RenderError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| match e {
                PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
                    RenderError::Protected("document requires a password".to_string())
                }
                other => RenderError::Malformed(format!("{:?}", other)),
            })?;

        let permissions = document.permissions();
        let can_print = permissions.can_print_high_quality().unwrap_or(true)
            || permissions.can_print_only_low_quality().unwrap_or(true);
        if !can_print {
            return Err(RenderError::Protected(
                "document permissions do not allow rendering".to_string(),
            ));
        }

        Ok(Box::new(PdfiumView { document }))
    }
}

/// One document opened in pdfium
pub struct PdfiumView<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumView<'a> {
    fn page(&self, page_index: usize) -> std::result::Result<PdfPage<'a>, RenderError> {
        self.document
            .pages()
            .get(page_index as _)
            .map_err(|e| RenderError::Engine(format!("{:?}", e)))
    }
}

impl RenderView for PdfiumView<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn viewport(&self, page_index: usize, scale: f64) -> std::result::Result<Viewport, RenderError> {
        let page = self.page(page_index)?;
        Ok(Viewport {
            width: page.width().value as f64 * scale,
            height: page.height().value as f64 * scale,
        })
    }

    fn render(
        &self,
        page_index: usize,
        scale: f64,
        target: &mut RasterFrame,
    ) -> std::result::Result<(), RenderError> {
        let page = self.page(page_index)?;

        // Pixel-exact output: no smoothing, white under transparent regions
        let config = PdfRenderConfig::new()
            .scale_page_by_factor(scale as f32)
            .set_clear_color(PdfColor::WHITE)
            .set_text_smoothing(false)
            .set_image_smoothing(false)
            .set_path_smoothing(false)
            .render_form_data(true);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| RenderError::Engine(format!("{:?}", e)))?;
        let image = bitmap.as_image().into_rgba8();
        target.composite_rgba(&image);
        Ok(())
    }
}
