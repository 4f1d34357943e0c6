//! The four memoized pipeline stages.
//!
//! Each adapter is a pure function of its inputs wrapped in a lookup into
//! the session's [`StageCache`]. Remote failures stop here: the adapter
//! logs, returns its fallback value inside a [`StageOutput`] together with a
//! [`Notice`], and the caller carries on.
//!
//! | Stage | On failure | Cached on |
//! |-------|-----------|-----------|
//! | extract   | `None` + error notice | (image bytes, file name) |
//! | transform | raw text unchanged + warning | (raw text, style, file name) |
//! | summary   | [`SUMMARY_FALLBACK`] + error notice | ordered article texts |
//! | assemble  | `Err` (fatal for the request) | (summary, ordered articles) |
//!
//! Only successful results are cached, so re-running an action after a
//! failure retries the remote call.

use crate::cache::{CacheKey, StageCache};
use crate::config::{AssistantConfig, ProcessingStyle};
use crate::document::{assemble_document, OutputDocument};
use crate::error::AssistantError;
use crate::notice::{Notice, StageOutput};
use crate::pipeline::encode::encode_image;
use crate::pipeline::llm::{resolve_model, LanguageModel};
use crate::pipeline::postprocess::clean_response;
use crate::progress::{BatchProgressCallback, NoopProgressCallback};
use crate::prompts::{ocr_instruction, style_prompt, summary_prompt, SUMMARY_FALLBACK};
use std::sync::Arc;
use tracing::{debug, error, warn};

const OP_EXTRACT: &str = "extract/v1";
const OP_TRANSFORM: &str = "transform/v1";
const OP_SUMMARY: &str = "summary/v1";
const OP_ASSEMBLE: &str = "assemble/v1";

/// Read-only service shared by every session: the model client and config.
pub struct ArchiveAssistant {
    model: Arc<dyn LanguageModel>,
    config: AssistantConfig,
}

impl ArchiveAssistant {
    /// Resolve the model from `config` and build the assistant.
    ///
    /// Fails with [`AssistantError::MissingCredential`] when the provider's
    /// API key is absent.
    pub fn from_config(config: AssistantConfig) -> Result<Self, AssistantError> {
        let model = resolve_model(&config)?;
        Ok(Self { model, config })
    }

    /// Build an assistant around an already-constructed model.
    pub fn with_model(model: Arc<dyn LanguageModel>, config: AssistantConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub(crate) fn progress(&self) -> Arc<dyn BatchProgressCallback> {
        self.config
            .progress_callback
            .clone()
            .unwrap_or_else(|| Arc::new(NoopProgressCallback))
    }

    /// Stage 1: transcribe the text on a scanned image.
    pub async fn extract_text(
        &self,
        cache: &StageCache,
        image: &[u8],
        file_name: &str,
    ) -> StageOutput<Option<String>> {
        let key = CacheKey::for_operation(OP_EXTRACT)
            .field(image)
            .field(file_name)
            .finish();
        if let Some(text) = cache.texts.get(&key) {
            debug!("Extraction cache hit for '{}' ({:?})", file_name, key);
            return StageOutput::cached(Some(text));
        }

        let Some(image_data) = encode_image(image) else {
            error!("Extraction skipped for '{}': not a PNG or JPEG image", file_name);
            return StageOutput::fallback(
                None,
                Notice::error(format!(
                    "Text extraction failed ({file_name}): not a PNG or JPEG image"
                )),
            );
        };

        let instruction = ocr_instruction(&self.config.document_language);
        match self.model.read_image(&instruction, image_data).await {
            Ok(reply) => {
                let text = clean_response(&reply);
                debug!("Extracted {} bytes from '{}'", text.len(), file_name);
                cache.texts.insert(key, text.clone());
                StageOutput::fresh(Some(text))
            }
            Err(e) => {
                error!("Extraction failed for '{}': {}", file_name, e);
                StageOutput::fallback(
                    None,
                    Notice::error(format!("Text extraction failed ({file_name}): {e}")),
                )
            }
        }
    }

    /// Stage 2: rewrite extracted text in the selected style.
    ///
    /// Empty or missing text short-circuits to `""` without a remote call.
    /// A failed call returns `raw_text` unchanged.
    pub async fn transform_text(
        &self,
        cache: &StageCache,
        raw_text: Option<&str>,
        style: ProcessingStyle,
        file_name: &str,
    ) -> StageOutput<String> {
        let raw = match raw_text {
            Some(raw) if !raw.is_empty() => raw,
            _ => return StageOutput::fresh(String::new()),
        };

        let key = CacheKey::for_operation(OP_TRANSFORM)
            .field(raw)
            .field(style.as_str())
            .field(file_name)
            .finish();
        if let Some(text) = cache.texts.get(&key) {
            debug!("Transform cache hit for '{}' ({:?})", file_name, key);
            return StageOutput::cached(text);
        }

        match self.model.generate(&style_prompt(style, raw)).await {
            Ok(reply) => {
                let text = clean_response(&reply);
                cache.texts.insert(key, text.clone());
                StageOutput::fresh(text)
            }
            Err(e) => {
                warn!("Transform ({}) failed for '{}': {}", style, file_name, e);
                StageOutput::fallback(
                    raw.to_string(),
                    Notice::warning(format!("Text processing failed ({file_name}): {e}")),
                )
            }
        }
    }

    /// Stage 3: title page and table of contents over the selected articles.
    ///
    /// Cached on the exact ordered sequence; reordering is a miss.
    pub async fn synthesize_summary(&self, cache: &StageCache, articles: &[String]) -> StageOutput<String> {
        let key = CacheKey::for_operation(OP_SUMMARY).fields(articles).finish();
        if let Some(text) = cache.texts.get(&key) {
            debug!("Summary cache hit ({:?})", key);
            return StageOutput::cached(text);
        }

        match self.model.generate(&summary_prompt(articles)).await {
            Ok(reply) => {
                let text = clean_response(&reply);
                cache.texts.insert(key, text.clone());
                StageOutput::fresh(text)
            }
            Err(e) => {
                error!("Summary generation failed: {}", e);
                StageOutput::fallback(
                    SUMMARY_FALLBACK.to_string(),
                    Notice::error(format!("Summary generation failed: {e}")),
                )
            }
        }
    }

    /// Stage 4: serialise summary and articles into the output document.
    ///
    /// Memoized so an unchanged finalize hands back the very same bytes.
    pub fn assemble(
        &self,
        cache: &StageCache,
        summary: &str,
        articles: &[String],
    ) -> Result<OutputDocument, AssistantError> {
        let key = CacheKey::for_operation(OP_ASSEMBLE)
            .field(summary)
            .fields(articles)
            .finish();
        if let Some(bytes) = cache.documents.get(&key) {
            return Ok(OutputDocument { bytes });
        }

        let bytes: Arc<[u8]> = Arc::from(assemble_document(summary, articles)?);
        cache.documents.insert(key, Arc::clone(&bytes));
        Ok(OutputDocument { bytes })
    }
}
