//! Image acquisition: turn uploaded bytes into one in-memory raster.
//!
//! Images are decoded directly with the `image` crate. PDFs are rasterised
//! with pdfium, page 1 only.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async contexts. Rendering runs on the
//! blocking pool so Tokio workers keep serving other requests.

use crate::config::ExtractionConfig;
use crate::error::LedgerScanError;
use crate::pipeline::input::DocumentKind;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Decode an upload into a single raster image.
///
/// * JPEG / PNG: decoded by sniffing the bytes. The declared type only
///   separates images from PDFs, so a PNG labelled `image/jpeg` still decodes.
/// * PDF: page 1 rendered with its longest edge capped at
///   `config.max_rendered_pixels`.
pub async fn acquire_image(
    bytes: Vec<u8>,
    kind: DocumentKind,
    config: &ExtractionConfig,
) -> Result<DynamicImage, LedgerScanError> {
    if bytes.is_empty() {
        return Err(LedgerScanError::EmptyUpload);
    }

    match kind {
        DocumentKind::Jpeg | DocumentKind::Png => decode_image(&bytes),
        DocumentKind::Pdf => {
            let max_pixels = config.max_rendered_pixels;
            let lib_path = config
                .pdfium_lib_path
                .clone()
                .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

            tokio::task::spawn_blocking(move || {
                render_first_page(bytes, max_pixels, lib_path.as_deref())
            })
            .await
            .map_err(|e| LedgerScanError::Internal(format!("Render task panicked: {}", e)))?
        }
    }
}

/// Decode JPEG or PNG bytes, whichever the magic bytes say they are.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, LedgerScanError> {
    let decode_err = |e: image::ImageError| LedgerScanError::ImageDecodeFailed {
        detail: e.to_string(),
    };
    let format = image::guess_format(bytes).map_err(decode_err)?;
    let img = image::load_from_memory_with_format(bytes, format).map_err(decode_err)?;
    debug!(
        "Decoded {:?} upload → {}x{} px",
        format,
        img.width(),
        img.height()
    );
    Ok(img)
}

/// Bind to pdfium, preferring an explicit library directory.
fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, LedgerScanError> {
    let bindings = match lib_path {
        Some(dir) => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| LedgerScanError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of PDF page-1 rasterisation.
fn render_first_page(
    bytes: Vec<u8>,
    max_pixels: u32,
    lib_path: Option<&Path>,
) -> Result<DynamicImage, LedgerScanError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium
        .load_pdf_from_byte_vec(bytes, None)
        .map_err(|e| LedgerScanError::PdfDecodeFailed {
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages, rendering page 1", pages.len());
    if pages.len() == 0 {
        return Err(LedgerScanError::EmptyPdf);
    }

    let page = pages.first().map_err(|e| LedgerScanError::PdfDecodeFailed {
        detail: format!("{:?}", e),
    })?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| LedgerScanError::PdfDecodeFailed {
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!("Rendered page 1 → {}x{} px", image.width(), image.height());
    Ok(image)
}
