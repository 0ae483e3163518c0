use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::providers::openai::OpenAiProvider;

/// Trait for AI providers
#[async_trait]
pub trait AiProviderTrait: Send + Sync {
    /// Generate text response for a given prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}

/// Endpoint settings shared by every capability provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.openai.com/v1"),
            model: String::from("gpt-4o-mini"),
        }
    }
}

/// Create a provider instance for one capability token
#[must_use]
pub fn create_provider(api_key: &str, config: &ProviderConfig) -> Box<dyn AiProviderTrait> {
    Box::new(OpenAiProvider::new(
        api_key,
        &config.model,
        Some(&config.base_url),
    ))
}
