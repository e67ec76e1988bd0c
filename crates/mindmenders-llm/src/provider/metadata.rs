use async_trait::async_trait;
use mindmenders_core::HistoryTurn;

use crate::error::Result;

/// Stateless text completion: prior turns plus a new prompt in, reply text out
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Get the provider ID
    fn provider_id(&self) -> &str;

    /// Request a reply to `prompt`, given the preceding conversation
    async fn complete(&self, history: &[HistoryTurn], prompt: &str) -> Result<String>;

    /// Validate the provider configuration
    async fn validate(&self) -> Result<()>;
}

/// Provider metadata
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    /// Provider ID
    pub id: String,
    /// Human-readable name
    pub name: String,
}
