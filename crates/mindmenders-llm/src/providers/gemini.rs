use async_trait::async_trait;
use mindmenders_core::HistoryTurn;

use crate::error::Result;
use crate::persona::DEFAULT_BASE_URL;
use crate::provider::{BaseProvider, CompletionClient, ProviderConfig, ProviderMetadata};
use crate::transformer::GeminiTransformer;

/// Gemini completion provider
pub struct GeminiProvider {
    inner: BaseProvider<GeminiTransformer>,
}

impl GeminiProvider {
    /// Create a provider against the public endpoint with the default model
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let config = ProviderConfig::new("gemini", DEFAULT_BASE_URL).with_api_key(api_key);
        Self::with_config(config)
    }

    /// Create with custom configuration
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        let metadata = ProviderMetadata {
            id: "gemini".to_string(),
            name: "Google Gemini".to_string(),
        };

        Ok(Self {
            inner: BaseProvider::new(config, GeminiTransformer::new(), metadata)?,
        })
    }

    pub fn model(&self) -> &str {
        &self.inner.config().model
    }
}

#[async_trait]
impl CompletionClient for GeminiProvider {
    fn provider_id(&self) -> &str {
        self.inner.provider_id()
    }

    async fn complete(&self, history: &[HistoryTurn], prompt: &str) -> Result<String> {
        self.inner.complete(history, prompt).await
    }

    async fn validate(&self) -> Result<()> {
        self.inner.validate().await
    }
}
