pub mod transformer;
pub mod provider;
pub mod providers;
pub mod error;
pub mod auth;
pub mod persona;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export core types
pub use error::{LLMError, ConversionError, Result};
pub use transformer::{SchemaTransformer, GeminiTransformer};
pub use provider::{CompletionClient, BaseProvider, ProviderConfig, AuthConfig, ProviderMetadata};
pub use auth::{Authenticator, ApiKeyAuth, NoAuth};
pub use providers::GeminiProvider;
