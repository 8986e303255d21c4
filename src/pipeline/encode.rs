//! Raster → base64 PNG `ImageData` for the vision request body.
//!
//! The image is encoded once per request and reused by both generation rounds
//! of the template flow. PNG keeps thin ledger rules and small digits crisp;
//! JPEG re-compression of an already-JPEG photo would only add artefacts.

use crate::error::LedgerScanError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode the acquired raster as a high-detail PNG attachment.
pub fn encode_image(img: &DynamicImage) -> Result<ImageData, LedgerScanError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| LedgerScanError::ImageEncodeFailed {
            detail: e.to_string(),
        })?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} image → {} bytes base64",
        img.width(),
        img.height(),
        b64.len()
    );

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
