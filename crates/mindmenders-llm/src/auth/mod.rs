use async_trait::async_trait;
use crate::error::Result;

/// Authenticator trait for different authentication methods
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Get the authentication header (header_name, header_value)
    /// Returns None if no authentication is needed
    async fn get_auth_header(&self) -> Result<Option<(String, String)>>;
}

const API_KEY_HEADER: &str = "x-goog-api-key";

/// API Key authenticator, sent in the `x-goog-api-key` header
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    api_key: String,
}

impl ApiKeyAuth {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuth {
    async fn get_auth_header(&self) -> Result<Option<(String, String)>> {
        Ok(Some((API_KEY_HEADER.to_string(), self.api_key.clone())))
    }
}

/// No authentication
#[derive(Debug, Clone)]
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    async fn get_auth_header(&self) -> Result<Option<(String, String)>> {
        Ok(None)
    }
}
