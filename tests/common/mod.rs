//! Shared helpers for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use edgequake_llm::ImageData;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ledgerscan::{ExtractionConfig, Extractor, GenerationError, Generator};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replays canned responses in order and records every instruction it saw.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    instructions: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_results(responses.into_iter().map(|s| Ok(s.into())))
    }

    pub fn with_results<I>(results: I) -> Arc<Self>
    where
        I: IntoIterator<Item = Result<String, GenerationError>>,
    {
        Arc::new(Self {
            responses: Mutex::new(results.into_iter().collect()),
            instructions: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        instruction: &str,
        image: &ImageData,
    ) -> Result<String, GenerationError> {
        assert_eq!(image.mime_type, "image/png", "pipeline always sends PNG");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Api("script exhausted".into())))
    }
}

pub fn extractor(generator: Arc<ScriptedGenerator>) -> Extractor {
    Extractor::new(generator, ExtractionConfig::default())
}

/// A small white PNG with a grey grid, enough to pass decoding.
pub fn ledger_png() -> Vec<u8> {
    encode(ImageFormat::Png)
}

pub fn ledger_jpeg() -> Vec<u8> {
    encode(ImageFormat::Jpeg)
}

fn encode(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(64, 48, |x, y| {
        if x % 16 == 0 || y % 12 == 0 {
            Rgb([128, 128, 128])
        } else {
            Rgb([255, 255, 255])
        }
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

pub const MEMBER_TAX_JSON: &str =
    r#"[{"Wing":"A","Unit No":"1","Member Name":"John","Charges":{"Tax":"100"}}]"#;
