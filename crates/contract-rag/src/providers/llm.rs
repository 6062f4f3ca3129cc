//! LLM provider trait for completions

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// Incremental text fragments from a streaming completion
pub type TextStream = BoxStream<'static, Result<String>>;

/// Per-call generation options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Ask the model for a JSON document
    pub json_mode: bool,
}

impl CompletionOptions {
    /// Plain text output
    pub fn text(temperature: f32) -> Self {
        Self {
            temperature,
            json_mode: false,
        }
    }

    /// JSON output
    pub fn json(temperature: f32) -> Self {
        Self {
            temperature,
            json_mode: true,
        }
    }
}

/// Trait for LLM completions
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server (llama3.1, phi3, ...)
///
/// An unconfigured LLM is modelled as the absence of a provider, not as a
/// provider that always fails.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Single-shot completion
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: CompletionOptions,
    ) -> Result<String>;

    /// Streaming completion yielding fragments as they arrive
    async fn complete_stream(
        &self,
        system: &str,
        user: &str,
        options: CompletionOptions,
    ) -> Result<TextStream>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model being used
    fn model(&self) -> &str;
}
