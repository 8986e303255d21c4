//! # ledgerscan
//!
//! Turn a photographed or scanned society maintenance ledger into an
//! accounting-import CSV, or transcribe any tabular bill into an XLSX
//! workbook, using a multimodal Vision Language Model.
//!
//! ## Why this crate?
//!
//! Ledgers arrive as phone photos and scanned PDFs with hand-drawn grids,
//! merged cells and charge columns that differ from one housing society to
//! the next. OCR plus layout heuristics breaks on every new form. Instead the
//! first page is rasterised to a PNG and a VLM is asked two narrow questions:
//! which charge columns exist, then what each member owes under them.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (JPEG / PNG / PDF)
//!  │
//!  ├─ 1. Input    gate on declared content type
//!  ├─ 2. Render   decode image or rasterise PDF page 1 (spawn_blocking)
//!  ├─ 3. Encode   PNG → base64 ImageData, once per request
//!  ├─ 4. VLM      template: discover headers, then extract members
//!  │              direct:   transcribe the table row by row
//!  ├─ 5. Parse    strip fences, parse the JSON array
//!  ├─ 6. Flatten  fixed 33-column template, or 1:1 rows
//!  └─ 7. Export   CSV / XLSX bytes plus download name
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ledgerscan::{ExtractionConfig, Extractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY through edgequake-llm.
//!     let config = ExtractionConfig::default();
//!     let extractor = Extractor::from_config(config)?;
//!
//!     let bytes = std::fs::read("ledger.jpg")?;
//!     let export = extractor.template_export(bytes, "image/jpeg").await?;
//!     std::fs::write(export.filename, &export.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ledgerscan` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when embedding only the library or the router:
//! ```toml
//! ledgerscan = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod flatten;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    require_api_key, ExtractionConfig, ExtractionConfigBuilder, ServerConfig, DEFAULT_MODEL,
    DEFAULT_PROVIDER,
};
pub use convert::{Extractor, DIRECT_FILENAME, TEMPLATE_FILENAME};
pub use error::{ErrorKind, LedgerScanError, Stage};
pub use export::{Export, SHEET_NAME};
pub use flatten::{FlatTemplateRow, MAX_EXPENSE_COLUMNS};
pub use model::{Amount, Cell, ExtractedMember, Table};
pub use pipeline::input::DocumentKind;
pub use pipeline::llm::{GenerationError, Generator, VisionGenerator};
pub use server::{create_router, serve};
