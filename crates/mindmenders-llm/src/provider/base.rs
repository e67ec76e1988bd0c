use async_trait::async_trait;
use mindmenders_core::HistoryTurn;
use reqwest::{header, Client};
use std::sync::Arc;

use crate::auth::{ApiKeyAuth, Authenticator, NoAuth};
use crate::error::{LLMError, Result};
use crate::provider::{AuthConfig, CompletionClient, ProviderConfig, ProviderMetadata};
use crate::transformer::SchemaTransformer;

/// Base provider implementation
/// Handles common HTTP functionality and delegates schema transformation
pub struct BaseProvider<T: SchemaTransformer> {
    config: ProviderConfig,
    http_client: Client,
    transformer: Arc<T>,
    pub metadata: ProviderMetadata,
    authenticator: Arc<dyn Authenticator>,
}

impl<T: SchemaTransformer + 'static> BaseProvider<T> {
    /// Create a new base provider
    pub fn new(config: ProviderConfig, transformer: T, metadata: ProviderMetadata) -> Result<Self> {
        let authenticator: Arc<dyn Authenticator> = match &config.auth {
            AuthConfig::ApiKey { key } => Arc::new(ApiKeyAuth::new(key.clone())),
            AuthConfig::None => Arc::new(NoAuth),
        };

        Self::with_authenticator(config, transformer, metadata, authenticator)
    }

    /// Create with a custom authenticator
    pub fn with_authenticator(
        config: ProviderConfig,
        transformer: T,
        metadata: ProviderMetadata,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LLMError::Config(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            transformer: Arc::new(transformer),
            metadata,
            authenticator,
        })
    }

    /// Get the config
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Build request headers
    async fn build_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));

        // Add authentication header
        if let Some((header_name, header_value)) = self.authenticator.get_auth_header().await? {
            let name = header::HeaderName::from_bytes(header_name.as_bytes())
                .map_err(|e| LLMError::Config(format!("Invalid auth header name: {}", e)))?;
            let value = header::HeaderValue::from_str(&header_value)
                .map_err(|e| LLMError::Config(format!("Invalid auth header value: {}", e)))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    /// Send a single completion request. Failures are returned as-is, never retried.
    pub async fn send_request(&self, history: &[HistoryTurn], prompt: &str) -> Result<String> {
        let body = self.transformer.transform_request(history, prompt)?;
        let headers = self.build_headers().await?;
        let url = self.transformer.endpoint(&self.config.base_url, &self.config.model);

        tracing::debug!(
            provider = %self.metadata.id,
            model = %self.config.model,
            history_len = history.len(),
            "sending completion request"
        );

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(60);
            let error_text = response.text().await.unwrap_or_default();
            let message = self.transformer.parse_error(&error_text);

            return Err(match status.as_u16() {
                401 | 403 => LLMError::Auth(message),
                429 => LLMError::RateLimited { retry_after },
                _ => LLMError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let response_data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        let text = self.transformer.parse_response(&response_data)?;
        if text.trim().is_empty() {
            return Err(LLMError::EmptyResponse);
        }

        Ok(text)
    }
}

#[async_trait]
impl<T: SchemaTransformer + 'static> CompletionClient for BaseProvider<T> {
    fn provider_id(&self) -> &str {
        &self.config.provider_id
    }

    async fn complete(&self, history: &[HistoryTurn], prompt: &str) -> Result<String> {
        self.send_request(history, prompt).await
    }

    async fn validate(&self) -> Result<()> {
        if matches!(self.config.auth, AuthConfig::None) {
            return Err(LLMError::Auth(format!(
                "{} requires an API key",
                self.metadata.name
            )));
        }
        let _ = self.build_headers().await?;
        Ok(())
    }
}
