//! The AI capability family: prompt, summarizer, writer and translator.
//!
//! Each capability exists only when a token is configured for it. Every call
//! degrades to a deterministic local result instead of failing the caller.

use anyhow::Result;
use async_trait::async_trait;
use ruhezeit_storage::AiTokens;
use std::sync::Arc;

use crate::ai_provider::{create_provider, AiProviderTrait, ProviderConfig};
use crate::ai_utils::{normalize_response, prepare_prompt, truncate_chars};

/// Characters kept by the local summarize fallback
const SUMMARY_FALLBACK_CHARS: usize = 400;
/// Characters of the prompt echoed by the local writer fallback
const DRAFT_FALLBACK_CHARS: usize = 200;

/// Something that can condense text
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text`
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying capability call fails
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Summarizer backed by a generative provider
pub struct ProviderSummarizer {
    provider: Arc<dyn AiProviderTrait>,
}

impl ProviderSummarizer {
    #[must_use]
    pub fn new(provider: Arc<dyn AiProviderTrait>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Summarizer for ProviderSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let prompt = format!(
            "Summarize what the user worked on during this focus session \
             in two or three sentences, based on these open tabs:\n\n{}",
            prepare_prompt(text)
        );
        let raw = self.provider.generate(&prompt).await?;
        Ok(normalize_response(&raw))
    }
}

/// Optional providers for each capability
#[derive(Clone, Default)]
pub struct AiCapabilities {
    prompt: Option<Arc<dyn AiProviderTrait>>,
    summarizer: Option<Arc<dyn AiProviderTrait>>,
    writer: Option<Arc<dyn AiProviderTrait>>,
    translator: Option<Arc<dyn AiProviderTrait>>,
}

impl AiCapabilities {
    /// No capability available; every call uses its fallback
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Build capabilities for every token that is present
    #[must_use]
    pub fn from_tokens(tokens: &AiTokens, config: &ProviderConfig) -> Self {
        let provider = |name: &str| -> Option<Arc<dyn AiProviderTrait>> {
            tokens
                .get(name)
                .map(|key| Arc::from(create_provider(key, config)))
        };
        let capabilities = Self {
            prompt: provider("prompt"),
            summarizer: provider("summarizer"),
            writer: provider("writer"),
            translator: provider("translator"),
        };
        log::info!(
            "AI capabilities: prompt={}, summarizer={}, writer={}, translator={}",
            capabilities.prompt.is_some(),
            capabilities.summarizer.is_some(),
            capabilities.writer.is_some(),
            capabilities.translator.is_some()
        );
        capabilities
    }

    #[must_use]
    pub fn with_prompt(mut self, provider: Arc<dyn AiProviderTrait>) -> Self {
        self.prompt = Some(provider);
        self
    }

    #[must_use]
    pub fn with_summarizer(mut self, provider: Arc<dyn AiProviderTrait>) -> Self {
        self.summarizer = Some(provider);
        self
    }

    #[must_use]
    pub fn with_writer(mut self, provider: Arc<dyn AiProviderTrait>) -> Self {
        self.writer = Some(provider);
        self
    }

    #[must_use]
    pub fn with_translator(mut self, provider: Arc<dyn AiProviderTrait>) -> Self {
        self.translator = Some(provider);
        self
    }

    /// Summarizer for session summaries, if the capability exists
    #[must_use]
    pub fn summarizer(&self) -> Option<Arc<dyn Summarizer>> {
        self.summarizer.as_ref().map(|provider| {
            Arc::new(ProviderSummarizer::new(Arc::clone(provider))) as Arc<dyn Summarizer>
        })
    }

    /// Send a free-form prompt
    pub async fn send_prompt(&self, prompt: &str) -> String {
        let prompt = prepare_prompt(prompt);
        if let Some(provider) = &self.prompt {
            match provider.generate(&prompt).await {
                Ok(raw) => return normalize_response(&raw),
                Err(e) => log::warn!("Prompt capability unavailable: {e:#}"),
            }
        }
        log::debug!("send_prompt (fallback)");
        format!("mock response for: {prompt}")
    }

    /// Summarize arbitrary text
    pub async fn summarize(&self, text: &str) -> String {
        if let Some(summarizer) = self.summarizer() {
            match summarizer.summarize(text).await {
                Ok(summary) => return summary,
                Err(e) => log::warn!("Summarizer capability unavailable: {e:#}"),
            }
        }
        log::debug!("summarize (fallback)");
        truncate_chars(text, SUMMARY_FALLBACK_CHARS)
    }

    /// Generate a written draft from a prompt
    pub async fn generate_draft(&self, prompt: &str) -> String {
        let prompt = prepare_prompt(prompt);
        if let Some(provider) = &self.writer {
            let request = format!("Write a short draft for the following request:\n\n{prompt}");
            match provider.generate(&request).await {
                Ok(raw) => return normalize_response(&raw),
                Err(e) => log::warn!("Writer capability unavailable: {e:#}"),
            }
        }
        log::debug!("generate_draft (fallback)");
        format!("Draft for: {}", truncate_chars(&prompt, DRAFT_FALLBACK_CHARS))
    }

    /// Translate text into `target_lang`
    pub async fn translate(&self, text: &str, target_lang: &str) -> String {
        if let Some(provider) = &self.translator {
            let request = format!(
                "Translate the following text to the language with code '{target_lang}'. \
                 Return only the translation.\n\n{text}"
            );
            match provider.generate(&request).await {
                Ok(raw) => return normalize_response(&raw),
                Err(e) => log::warn!("Translator capability unavailable: {e:#}"),
            }
        }
        log::debug!("translate (fallback)");
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl AiProviderTrait for EchoProvider {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(format!("echo:{}", prompt.lines().last().unwrap_or_default()))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl AiProviderTrait for FailingProvider {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("offline")
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_prompt_fallback_without_provider() {
        let ai = AiCapabilities::none();
        assert_eq!(ai.send_prompt("  hi ").await, "mock response for: hi");
    }

    #[tokio::test]
    async fn test_prompt_uses_provider() {
        let ai = AiCapabilities::none().with_prompt(Arc::new(EchoProvider));
        assert_eq!(ai.send_prompt("hi").await, "echo:hi");
    }

    #[tokio::test]
    async fn test_failing_provider_degrades_to_fallback() {
        let ai = AiCapabilities::none()
            .with_prompt(Arc::new(FailingProvider))
            .with_writer(Arc::new(FailingProvider))
            .with_translator(Arc::new(FailingProvider))
            .with_summarizer(Arc::new(FailingProvider));

        assert_eq!(ai.send_prompt("q").await, "mock response for: q");
        assert_eq!(ai.generate_draft("note").await, "Draft for: note");
        assert_eq!(ai.translate("hallo", "en").await, "hallo");
        assert_eq!(ai.summarize("short").await, "short");
    }

    #[tokio::test]
    async fn test_summarize_fallback_truncates() {
        let ai = AiCapabilities::none();
        let long = "x".repeat(1000);
        assert_eq!(ai.summarize(&long).await.len(), SUMMARY_FALLBACK_CHARS);
    }

    #[tokio::test]
    async fn test_draft_fallback_truncates_prompt() {
        let ai = AiCapabilities::none();
        let draft = ai.generate_draft(&"y".repeat(500)).await;
        assert_eq!(draft.len(), "Draft for: ".len() + DRAFT_FALLBACK_CHARS);
    }

    #[tokio::test]
    async fn test_summarizer_only_present_with_provider() {
        assert!(AiCapabilities::none().summarizer().is_none());

        let ai = AiCapabilities::none().with_summarizer(Arc::new(EchoProvider));
        let summarizer = ai.summarizer().unwrap();
        assert_eq!(summarizer.summarize("tab one").await.unwrap(), "echo:tab one");
    }

    #[test]
    fn test_from_tokens_only_builds_present_capabilities() {
        let mut tokens = AiTokens::default();
        tokens.set("summarizer", Some("key".to_string())).unwrap();
        let ai = AiCapabilities::from_tokens(&tokens, &ProviderConfig::default());
        assert!(ai.summarizer().is_some());
        assert!(ai.prompt.is_none());
        assert!(ai.writer.is_none());
        assert!(ai.translator.is_none());
    }
}
