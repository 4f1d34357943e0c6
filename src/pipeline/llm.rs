//! Model interaction: the [`LanguageModel`] seam and its provider-backed
//! implementation.
//!
//! Every stage talks to the remote service through two calls only: read an
//! image with an instruction, or complete a text prompt. Prompt wording
//! lives in [`crate::prompts`]; fallbacks and notices live in the stage
//! adapters. This module only moves messages and maps failures.
//!
//! There is no retry loop. A failed call is reported once and the user
//! re-triggers the action.

use crate::config::AssistantConfig;
use crate::error::{AssistantError, ModelError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// A hosted model able to read images and complete prompts.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send `image` with `instruction` and return the model's text.
    async fn read_image(&self, instruction: &str, image: ImageData) -> Result<String, ModelError>;

    /// Complete a single-turn text prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// [`LanguageModel`] backed by an `edgequake_llm` provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AssistantConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ModelError> {
        let start = Instant::now();
        let options = self.build_options();
        let call = self.provider.chat(&messages, Some(&options));

        let response = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ModelError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ModelError::Api(e.to_string()))?;

        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }

    fn build_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl LanguageModel for ProviderModel {
    async fn read_image(&self, instruction: &str, image: ImageData) -> Result<String, ModelError> {
        self.chat(vec![ChatMessage::user_with_images(instruction, vec![image])])
            .await
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.chat(vec![ChatMessage::user(prompt)]).await
    }
}

/// Resolve the model, from most-specific to least-specific.
///
/// 1. **Pre-built model** (`config.provider`): used as-is; tests inject
///    scripted models this way.
/// 2. **Named provider + model**: created through
///    [`ProviderFactory::create_llm_provider`], after the provider's API key
///    has been checked.
///
/// With nothing named, provider and model fall back to
/// [`crate::config::DEFAULT_PROVIDER`] / [`crate::config::DEFAULT_MODEL`].
pub fn resolve_model(config: &AssistantConfig) -> Result<Arc<dyn LanguageModel>, AssistantError> {
    if let Some(ref model) = config.provider {
        return Ok(Arc::clone(model));
    }

    config.check_credential()?;

    let provider_name = config.effective_provider();
    let model_id = config.effective_model();
    let provider = ProviderFactory::create_llm_provider(provider_name, model_id).map_err(|e| {
        AssistantError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("Could not create model '{model_id}': {e}"),
        }
    })?;

    debug!("Using provider '{}' with model '{}'", provider_name, model_id);
    Ok(Arc::new(ProviderModel::new(provider, config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    #[test]
    fn prebuilt_model_wins() {
        let scripted = Arc::new(ScriptedModel::echo());
        let config = AssistantConfig::builder()
            .provider_name("definitely-not-a-provider")
            .provider(scripted)
            .build()
            .unwrap();
        assert!(resolve_model(&config).is_ok());
    }

    #[test]
    fn unknown_provider_fails_before_network() {
        let config = AssistantConfig::builder()
            .provider_name("definitely-not-a-provider")
            .build()
            .unwrap();
        assert!(matches!(
            resolve_model(&config),
            Err(AssistantError::InvalidConfig(_))
        ));
    }
}
