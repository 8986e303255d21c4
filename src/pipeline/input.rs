//! Input gate: classify an upload by its declared content type.
//!
//! Classification happens before any bytes are decoded or any service call is
//! made, so an unsupported upload costs nothing.

use crate::error::LedgerScanError;
use std::path::Path;

/// The three upload formats the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Jpeg,
    Png,
    Pdf,
}

impl DocumentKind {
    /// Classify a declared MIME type.
    ///
    /// Parameters (`; charset=...`) and letter case are ignored.
    pub fn from_mime(content_type: &str) -> Result<Self, LedgerScanError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" => Ok(DocumentKind::Jpeg),
            "image/png" => Ok(DocumentKind::Png),
            "application/pdf" => Ok(DocumentKind::Pdf),
            _ => Err(LedgerScanError::UnsupportedMediaType {
                content_type: content_type.to_string(),
            }),
        }
    }

    /// Guess the kind of a local file from its extension (CLI only).
    pub fn from_path(path: &Path) -> Result<Self, LedgerScanError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(DocumentKind::Jpeg),
            "png" => Ok(DocumentKind::Png),
            "pdf" => Ok(DocumentKind::Pdf),
            _ => Err(LedgerScanError::UnsupportedMediaType {
                content_type: format!("unknown (extension '{ext}')"),
            }),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentKind::Jpeg => "image/jpeg",
            DocumentKind::Png => "image/png",
            DocumentKind::Pdf => "application/pdf",
        }
    }
}
