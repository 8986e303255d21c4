//! Pipeline stages shared by both export flows.
//!
//! Each submodule implements one transformation step and can be tested on its
//! own. The flows that string them together live in [`crate::convert`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm ──▶ postprocess
//! (MIME)    (pdfium)   (base64)   (VLM)   (fences, JSON)
//! ```
//!
//! 1. [`input`]: classify the upload; unsupported types stop here
//! 2. [`render`]: decode JPEG/PNG or rasterise PDF page 1; pdfium runs in
//!    `spawn_blocking` because it is not async-safe
//! 3. [`encode`]: PNG-encode and base64-wrap the raster for the request body
//! 4. [`llm`]: one VLM call per round; the only stage with network I/O
//! 5. [`postprocess`]: header-line splitting and fenced-JSON parsing

pub mod encode;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod render;
