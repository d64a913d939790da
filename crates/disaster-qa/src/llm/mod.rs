//! LLM Module - external generative model support
//! Providers are trait objects so the dispatcher never depends on a vendor.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod gemini;

pub use gemini::GeminiProvider;

use crate::config::GenerativeConfig;

/// Core trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;

    /// Get provider info
    fn info(&self) -> ProviderInfo;
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
        }
    }
}

impl From<&GenerativeConfig> for GenerationConfig {
    fn from(config: &GenerativeConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            ..Self::default()
        }
    }
}

/// Provider information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
}
