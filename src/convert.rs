//! The two request flows.
//!
//! ```text
//! template:  acquire ─▶ encode ─▶ discover headers ─▶ extract members ─▶ flatten ─▶ CSV
//! direct:    acquire ─▶ encode ─▶ transcribe table  ───────────────────▶ flatten ─▶ XLSX
//! ```
//!
//! An [`Extractor`] is built once per process and shared by every request.
//! It holds no mutable state: each call owns its image, headers and rows and
//! drops them when the export is returned.

use crate::config::ExtractionConfig;
use crate::error::{LedgerScanError, Stage};
use crate::export::{self, Export, CSV_MEDIA_TYPE, SHEET_NAME, XLSX_MEDIA_TYPE};
use crate::flatten::{flatten_direct, flatten_template};
use crate::model::ExtractedMember;
use crate::pipeline::input::DocumentKind;
use crate::pipeline::llm::{GenerationError, Generator, VisionGenerator};
use crate::pipeline::postprocess::{parse_header_line, parse_json_array, JsonRow};
use crate::pipeline::{encode, render};
use crate::prompts::{extraction_prompt, DIRECT_EXPORT_PROMPT, DISCOVERY_PROMPT};
use edgequake_llm::ImageData;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Download name of the template CSV.
pub const TEMPLATE_FILENAME: &str = "converted_template.csv";
/// Download name of the direct-export workbook.
pub const DIRECT_FILENAME: &str = "exported_data.xlsx";

/// Drives the generation service for both flows.
pub struct Extractor {
    generator: Arc<dyn Generator>,
    config: ExtractionConfig,
}

impl Extractor {
    pub fn new(generator: Arc<dyn Generator>, config: ExtractionConfig) -> Self {
        Self { generator, config }
    }

    /// Build with a [`VisionGenerator`] resolved from `config`.
    pub fn from_config(config: ExtractionConfig) -> Result<Self, LedgerScanError> {
        let generator = VisionGenerator::from_config(&config)?;
        Ok(Self::new(Arc::new(generator), config))
    }

    /// Upload → accounting-template CSV.
    ///
    /// `content_type` is checked before anything is decoded.
    pub async fn template_export(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<Export, LedgerScanError> {
        let kind = DocumentKind::from_mime(content_type)?;
        self.template_export_kind(bytes, kind).await
    }

    /// Upload → single-sheet XLSX transcription.
    pub async fn direct_export(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<Export, LedgerScanError> {
        let kind = DocumentKind::from_mime(content_type)?;
        self.direct_export_kind(bytes, kind).await
    }

    pub async fn template_export_kind(
        &self,
        bytes: Vec<u8>,
        kind: DocumentKind,
    ) -> Result<Export, LedgerScanError> {
        let start = Instant::now();
        info!("Template export: {} bytes of {}", bytes.len(), kind.mime());

        let image = self.acquire(bytes, kind).await?;
        let headers = self.discover_headers(&image).await?;
        let members = self.extract_members(&image, &headers).await?;
        let table = flatten_template(&members, &headers)?;
        let bytes = export::write_csv(&table)?;

        info!(
            "Template export complete: {} rows, {} headers, {}ms",
            table.rows.len(),
            headers.len(),
            start.elapsed().as_millis()
        );
        Ok(Export {
            bytes,
            filename: TEMPLATE_FILENAME,
            media_type: CSV_MEDIA_TYPE,
        })
    }

    pub async fn direct_export_kind(
        &self,
        bytes: Vec<u8>,
        kind: DocumentKind,
    ) -> Result<Export, LedgerScanError> {
        let start = Instant::now();
        info!("Direct export: {} bytes of {}", bytes.len(), kind.mime());

        let image = self.acquire(bytes, kind).await?;
        let rows = self.transcribe_table(&image).await?;
        let table = flatten_direct(&rows)?;
        let bytes = export::write_xlsx(&table, SHEET_NAME)?;

        info!(
            "Direct export complete: {} rows x {} columns, {}ms",
            table.rows.len(),
            table.columns.len(),
            start.elapsed().as_millis()
        );
        Ok(Export {
            bytes,
            filename: DIRECT_FILENAME,
            media_type: XLSX_MEDIA_TYPE,
        })
    }

    /// Round 1: ask for the charge column headers.
    ///
    /// Fails with `NoHeaders` when nothing usable comes back; the caller must
    /// not proceed to extraction.
    pub async fn discover_headers(&self, image: &ImageData) -> Result<Vec<String>, LedgerScanError> {
        let text = self.call(Stage::Discovery, DISCOVERY_PROMPT, image).await?;
        let headers = parse_header_line(&text);
        if headers.is_empty() {
            return Err(LedgerScanError::NoHeaders);
        }
        info!("Discovered {} headers: {:?}", headers.len(), headers);
        Ok(headers)
    }

    /// Round 2: ask for every member against the discovered headers.
    pub async fn extract_members(
        &self,
        image: &ImageData,
        headers: &[String],
    ) -> Result<Vec<ExtractedMember>, LedgerScanError> {
        let prompt = extraction_prompt(headers);
        let rows = self.call_json(Stage::Extraction, &prompt, image).await?;
        Ok(rows.iter().map(ExtractedMember::from_row).collect())
    }

    /// Direct flow: literal row-by-row transcription.
    pub async fn transcribe_table(&self, image: &ImageData) -> Result<Vec<JsonRow>, LedgerScanError> {
        self.call_json(Stage::DirectExport, DIRECT_EXPORT_PROMPT, image)
            .await
    }

    async fn acquire(&self, bytes: Vec<u8>, kind: DocumentKind) -> Result<ImageData, LedgerScanError> {
        let raster = render::acquire_image(bytes, kind, &self.config).await?;
        encode::encode_image(&raster)
    }

    async fn call_json(
        &self,
        stage: Stage,
        instruction: &str,
        image: &ImageData,
    ) -> Result<Vec<JsonRow>, LedgerScanError> {
        let text = self.call(stage, instruction, image).await?;
        let rows = parse_json_array(&text).map_err(|e| LedgerScanError::MalformedResponse {
            stage,
            detail: e.to_string(),
        })?;
        debug!("{}: parsed {} rows", stage, rows.len());
        Ok(rows)
    }

    async fn call(
        &self,
        stage: Stage,
        instruction: &str,
        image: &ImageData,
    ) -> Result<String, LedgerScanError> {
        let start = Instant::now();
        let text = self
            .generator
            .generate(instruction, image)
            .await
            .map_err(|e| match e {
                GenerationError::Timeout(secs) => LedgerScanError::GenerationTimeout { stage, secs },
                GenerationError::Api(message) => LedgerScanError::GenerationFailed { stage, message },
            })?;
        debug!(
            "{}: {} chars in {}ms",
            stage,
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}
