//! The generation-service seam.
//!
//! [`Generator`] is the only interface the request flows see: one instruction
//! plus one image in, free-form text out. [`VisionGenerator`] implements it on
//! top of any `edgequake_llm` provider. Tests substitute a scripted generator.
//!
//! No retries happen here. A failed or timed-out call is reported once and
//! the request fails.

use crate::config::ExtractionConfig;
use crate::error::LedgerScanError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of a single generation call, before the caller attaches a stage.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{0}")]
    Api(String),

    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Multimodal text generation: `generate(instruction, image) -> text`.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, instruction: &str, image: &ImageData) -> Result<String, GenerationError>;
}

/// [`Generator`] backed by an `edgequake_llm` vision provider.
pub struct VisionGenerator {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout: Option<Duration>,
}

impl VisionGenerator {
    /// Wrap an already-constructed provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExtractionConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
            timeout: config.api_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Use `config.provider` if set, else create one through `ProviderFactory`.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, LedgerScanError> {
        let provider = match config.provider {
            Some(ref p) => Arc::clone(p),
            None => ProviderFactory::create_llm_provider(&config.provider_name, &config.model)
                .map_err(|e| {
                    LedgerScanError::InvalidConfig(format!(
                        "LLM provider '{}' could not be created: {e}",
                        config.provider_name
                    ))
                })?,
        };
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl Generator for VisionGenerator {
    async fn generate(&self, instruction: &str, image: &ImageData) -> Result<String, GenerationError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user_with_images(instruction, vec![image.clone()])];

        let call = self.provider.chat(&messages, Some(&self.options));
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| GenerationError::Timeout(limit.as_secs()))?,
            None => call.await,
        };

        match result {
            Ok(response) => {
                debug!(
                    "Generation: {} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                Ok(response.content)
            }
            Err(e) => {
                warn!("Generation failed after {:?}: {}", start.elapsed(), e);
                Err(GenerationError::Api(e.to_string()))
            }
        }
    }
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
