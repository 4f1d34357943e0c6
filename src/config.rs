//! Configuration types for the archive assistant.
//!
//! All pipeline behaviour is controlled through [`AssistantConfig`], built
//! via its [`AssistantConfigBuilder`]. The HTTP surface has its own small
//! [`ServerConfig`].

use crate::error::AssistantError;
use crate::pipeline::llm::LanguageModel;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Provider used when none is named.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Model used when none is named.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for the extraction / transform / summary pipeline.
///
/// Built via [`AssistantConfig::builder()`] or using
/// [`AssistantConfig::default()`].
///
/// # Example
/// ```rust
/// use archive_assistant::{AssistantConfig, ProcessingStyle};
///
/// let config = AssistantConfig::builder()
///     .model("gemini-2.0-flash")
///     .document_language("Polish")
///     .default_style(ProcessingStyle::CorrectionOnly)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AssistantConfig {
    /// LLM model ID. Default: [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// Provider name (gemini, openai, anthropic, mistral). Default: [`DEFAULT_PROVIDER`].
    pub provider_name: Option<String>,

    /// Pre-built model. Takes priority over `provider_name`; the credential
    /// check is skipped when set.
    pub provider: Option<Arc<dyn LanguageModel>>,

    /// Sampling temperature, 0.0–2.0. Default: 0.2.
    pub temperature: f32,

    /// Max output tokens per call. Default: 8192.
    ///
    /// A literary edit of a dense newspaper page can exceed 4k tokens, and
    /// the summary covers every selected article at once.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Language named in the OCR instruction. Default: "Ukrainian".
    pub document_language: String,

    /// Style used when a batch does not name one. Default: literary edit.
    pub default_style: ProcessingStyle,

    /// Optional per-file progress events for batch processing.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 8192,
            api_timeout_secs: 120,
            document_language: "Ukrainian".to_string(),
            default_style: ProcessingStyle::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LanguageModel>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("document_language", &self.document_language)
            .field("default_style", &self.default_style)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl AssistantConfig {
    /// Create a new builder for `AssistantConfig`.
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder {
            config: Self::default(),
        }
    }

    /// Provider name after defaults are applied.
    pub fn effective_provider(&self) -> &str {
        self.provider_name.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// Model id after defaults are applied.
    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Verify the API key for the selected provider is present in the
    /// process environment.
    ///
    /// This is the one fatal startup condition: the binary refuses to
    /// start without it.
    pub fn check_credential(&self) -> Result<(), AssistantError> {
        self.check_credential_with(|var| std::env::var(var).ok())
    }

    /// Same as [`check_credential`](Self::check_credential) with an
    /// injectable environment lookup.
    pub fn check_credential_with<F>(&self, lookup: F) -> Result<(), AssistantError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.provider.is_some() {
            return Ok(());
        }
        let provider = self.effective_provider();
        let var = credential_var(provider).ok_or_else(|| {
            AssistantError::InvalidConfig(format!(
                "Unknown provider '{provider}'. Supported: gemini, openai, anthropic, mistral"
            ))
        })?;
        match lookup(var) {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(AssistantError::MissingCredential {
                provider: provider.to_string(),
                var: var.to_string(),
            }),
        }
    }
}

/// Environment variable holding the API key of a hosted provider.
pub fn credential_var(provider: &str) -> Option<&'static str> {
    match provider.to_ascii_lowercase().as_str() {
        "gemini" | "google" => Some("GEMINI_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "mistral" => Some("MISTRAL_API_KEY"),
        _ => None,
    }
}

/// Builder for [`AssistantConfig`].
#[derive(Debug)]
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl AssistantConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LanguageModel>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn document_language(mut self, language: impl Into<String>) -> Self {
        self.config.document_language = language.into();
        self
    }

    pub fn default_style(mut self, style: ProcessingStyle) -> Self {
        self.config.default_style = style;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AssistantConfig, AssistantError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(AssistantError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(AssistantError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.document_language.trim().is_empty() {
            return Err(AssistantError::InvalidConfig(
                "document_language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Settings for the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: `127.0.0.1:8501`.
    pub bind_addr: String,
    /// Request body limit for uploads. Default: 64 MiB.
    pub max_upload_bytes: usize,
    /// Sessions untouched for this long are ended. Default: 1 hour.
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8501".to_string(),
            max_upload_bytes: 64 * 1024 * 1024,
            session_idle_secs: 3600,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Editorial style applied to each extracted text.
///
/// | Style | Result |
/// |-------|--------|
/// | `LiteraryEdit` | Titled, corrected article split into paragraphs (default) |
/// | `CorrectionOnly` | Same text with spelling and grammar fixed, structure untouched |
/// | `BulletSummary` | Key points as a bulleted list |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingStyle {
    #[default]
    LiteraryEdit,
    CorrectionOnly,
    BulletSummary,
}

impl ProcessingStyle {
    pub const ALL: [ProcessingStyle; 3] = [
        ProcessingStyle::LiteraryEdit,
        ProcessingStyle::CorrectionOnly,
        ProcessingStyle::BulletSummary,
    ];

    /// Stable identifier, also the serde and cache-key form.
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingStyle::LiteraryEdit => "literary-edit",
            ProcessingStyle::CorrectionOnly => "correction-only",
            ProcessingStyle::BulletSummary => "bullet-summary",
        }
    }

    /// Human-readable label for selectors.
    pub fn label(self) -> &'static str {
        match self {
            ProcessingStyle::LiteraryEdit => "Literary edit",
            ProcessingStyle::CorrectionOnly => "Correction only",
            ProcessingStyle::BulletSummary => "Bullet summary",
        }
    }
}

impl fmt::Display for ProcessingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStyle {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        ProcessingStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == norm)
            .ok_or_else(|| {
                AssistantError::InvalidConfig(format!(
                    "Unknown processing style '{s}'. Expected one of: literary-edit, correction-only, bullet-summary"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AssistantConfig::default();
        assert_eq!(c.effective_provider(), "gemini");
        assert_eq!(c.effective_model(), DEFAULT_MODEL);
        assert_eq!(c.default_style, ProcessingStyle::LiteraryEdit);
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = AssistantConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = AssistantConfig::builder().api_timeout_secs(0).build();
        assert!(matches!(err, Err(AssistantError::InvalidConfig(_))));
    }

    #[test]
    fn missing_credential_is_reported() {
        let c = AssistantConfig::default();
        let err = c.check_credential_with(|_| None).unwrap_err();
        match err {
            AssistantError::MissingCredential { var, .. } => assert_eq!(var, "GEMINI_API_KEY"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let c = AssistantConfig::builder().provider_name("openai").build().unwrap();
        let err = c.check_credential_with(|_| Some("   ".into()));
        assert!(matches!(err, Err(AssistantError::MissingCredential { .. })));
    }

    #[test]
    fn present_credential_passes() {
        let c = AssistantConfig::builder().provider_name("anthropic").build().unwrap();
        let ok = c.check_credential_with(|var| {
            (var == "ANTHROPIC_API_KEY").then(|| "sk-test".to_string())
        });
        assert!(ok.is_ok());
    }

    #[test]
    fn unknown_provider_is_invalid_config() {
        let c = AssistantConfig::builder().provider_name("nope").build().unwrap();
        let err = c.check_credential_with(|_| Some("k".into()));
        assert!(matches!(err, Err(AssistantError::InvalidConfig(_))));
    }

    #[test]
    fn style_parses_loose_forms() {
        assert_eq!(
            "Correction only".parse::<ProcessingStyle>().unwrap(),
            ProcessingStyle::CorrectionOnly
        );
        assert_eq!(
            "bullet_summary".parse::<ProcessingStyle>().unwrap(),
            ProcessingStyle::BulletSummary
        );
        assert!("poetry".parse::<ProcessingStyle>().is_err());
    }

    #[test]
    fn style_serde_matches_as_str() {
        for style in ProcessingStyle::ALL {
            let json = serde_json::to_string(&style).unwrap();
            assert_eq!(json, format!("\"{}\"", style.as_str()));
        }
    }
}
