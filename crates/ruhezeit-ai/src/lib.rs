pub mod ai_provider;
pub mod ai_utils;
pub mod capabilities;
pub mod providers;

pub use ai_provider::{create_provider, AiProviderTrait, ProviderConfig};
pub use ai_utils::{normalize_response, parse_ai_response, prepare_prompt, truncate_chars};
pub use capabilities::{AiCapabilities, ProviderSummarizer, Summarizer};
