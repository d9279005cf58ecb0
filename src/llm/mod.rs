//! LLM — adapter for the hosted model provider.
//!
//! DESIGN
//! ======
//! The relay only ever needs two provider calls: one chat completion and one
//! image generation. `LlmClient` binds an `OpenAiClient` to the configured
//! models and exposes it through the [`LlmChat`] trait so handlers and tests
//! can swap in mocks.

pub mod config;
pub mod openai;
pub mod types;

use config::LlmConfig;
pub use types::LlmChat;
use types::{GeneratedImage, ImageRequest, LlmError, Turn};

// =============================================================================
// CLIENT
// =============================================================================

/// Concrete LLM client with fixed chat and image models.
pub struct LlmClient {
    inner: openai::OpenAiClient,
    model: String,
    image_model: String,
}

impl LlmClient {
    /// Build an LLM client from a parsed typed config.
    ///
    /// Returns `Ok(None)` when no provider credential is configured; the relay
    /// then answers requests as misconfigured.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Option<Self>, LlmError> {
        let Some(api_key) = config.api_key else {
            return Ok(None);
        };
        let inner = openai::OpenAiClient::new(api_key, &config.base_url, config.timeouts)?;
        Ok(Some(Self { inner, model: config.model, image_model: config.image_model }))
    }

    /// Return the configured chat model name (e.g. `"gpt-3.5-turbo"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, messages: &[Turn]) -> Result<Turn, LlmError> {
        self.inner.chat(&self.model, messages).await
    }

    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>, LlmError> {
        self.inner.generate_images(&self.image_model, request).await
    }
}
