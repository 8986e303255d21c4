//! Error types for the ledgerscan library.
//!
//! Every failure a request can hit is a [`LedgerScanError`]. Variants are
//! grouped into four caller-facing classes by [`ErrorKind`]:
//!
//! * **InvalidInput**: the upload itself is wrong (type, empty PDF). The
//!   caller can fix it and resubmit.
//! * **Processing**: decoding or serialisation broke on our side.
//! * **Extraction**: the generation service answered with something we
//!   cannot use (no headers, non-JSON text) or did not answer at all.
//! * **NoData**: extraction worked but produced zero rows.
//!
//! A fifth class, **Configuration**, only occurs at startup.
//!
//! Nothing is retried. Each stage wraps its own faults into one of these
//! variants and hands them straight back to the caller.

use std::fmt;
use thiserror::Error;

/// Which request stage talked to the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Round 1 of the template flow: header discovery.
    Discovery,
    /// Round 2 of the template flow: member extraction.
    Extraction,
    /// The single round of the direct-export flow.
    DirectExport,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Discovery => "header discovery",
            Stage::Extraction => "data extraction",
            Stage::DirectExport => "direct export",
        };
        f.write_str(name)
    }
}

/// Caller-facing classification of a [`LedgerScanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Processing,
    Extraction,
    NoData,
    Configuration,
}

/// All errors returned by the ledgerscan library.
#[derive(Debug, Error)]
pub enum LedgerScanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Declared content type is not JPEG, PNG or PDF.
    #[error("Unsupported file type '{content_type}'. Upload a JPEG, PNG or PDF.")]
    UnsupportedMediaType { content_type: String },

    /// The multipart request had no `file` field.
    #[error("No file uploaded: expected a multipart field named '{field}'")]
    MissingUpload { field: String },

    /// The upload was present but zero bytes long.
    #[error("Uploaded file is empty")]
    EmptyUpload,

    /// The PDF opened fine but has no page to rasterise.
    #[error("Could not extract an image from the PDF: document has no pages")]
    EmptyPdf,

    // ── Processing errors ─────────────────────────────────────────────────
    /// pdfium could not load or render page 1.
    #[error("PDF processing failed: {detail}")]
    PdfDecodeFailed { detail: String },

    /// The image bytes are not a JPEG or PNG the decoder can read.
    #[error("Image decoding failed: {detail}")]
    ImageDecodeFailed { detail: String },

    /// Re-encoding the raster as PNG for the generation service failed.
    #[error("Image encoding failed: {detail}")]
    ImageEncodeFailed { detail: String },

    /// Could not bind to a pdfium shared library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH (or --pdfium-lib-path) to the directory holding libpdfium."
    )]
    PdfiumBindingFailed(String),

    /// Writing the CSV or XLSX output failed.
    #[error("Failed to write {format} output: {detail}")]
    ExportFailed { format: &'static str, detail: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Discovery returned no usable header labels.
    #[error("Could not identify any expense headers in the document")]
    NoHeaders,

    /// The response text was not a JSON array of objects.
    #[error("Malformed response during {stage}: {detail}")]
    MalformedResponse { stage: Stage, detail: String },

    /// The generation service call itself failed.
    #[error("Generation service failed during {stage}: {message}")]
    GenerationFailed { stage: Stage, message: String },

    /// The generation service did not answer within the configured deadline.
    #[error("Generation service timed out after {secs}s during {stage}")]
    GenerationTimeout { stage: Stage, secs: u64 },

    // ── No data ───────────────────────────────────────────────────────────
    /// Extraction succeeded but yielded zero rows.
    #[error("No data could be extracted during {stage}")]
    NoData { stage: Stage },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A required credential environment variable is unset or empty.
    #[error("FATAL: {var} environment variable not set")]
    MissingCredential { var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerScanError {
    /// The caller-facing class of this error.
    pub fn kind(&self) -> ErrorKind {
        use LedgerScanError::*;
        match self {
            UnsupportedMediaType { .. } | MissingUpload { .. } | EmptyUpload | EmptyPdf => {
                ErrorKind::InvalidInput
            }
            PdfDecodeFailed { .. }
            | ImageDecodeFailed { .. }
            | ImageEncodeFailed { .. }
            | PdfiumBindingFailed(_)
            | ExportFailed { .. }
            | Internal(_) => ErrorKind::Processing,
            NoHeaders
            | MalformedResponse { .. }
            | GenerationFailed { .. }
            | GenerationTimeout { .. } => ErrorKind::Extraction,
            NoData { .. } => ErrorKind::NoData,
            MissingCredential { .. } | InvalidConfig(_) => ErrorKind::Configuration,
        }
    }
}
