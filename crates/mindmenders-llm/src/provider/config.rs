use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::persona::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Authentication configuration enum
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// API key sent in a provider-specific header
    ApiKey {
        /// The API key
        key: String,
    },
    /// No authentication
    #[default]
    None,
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider ID, reported in logs
    pub provider_id: String,
    /// Base URL for the API
    pub base_url: String,
    /// Authentication configuration
    #[serde(flatten)]
    pub auth: AuthConfig,
    /// Model to use
    pub model: String,
    /// Request timeout in seconds
    #[serde(with = "serde_duration", default = "default_timeout")]
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Create a new provider config
    pub fn new(provider_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            base_url: base_url.into(),
            auth: AuthConfig::None,
            model: DEFAULT_MODEL.to_string(),
            timeout: default_timeout(),
        }
    }

    /// Set API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.auth = AuthConfig::ApiKey { key: key.into() };
        self
    }

    /// Set model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new("gemini", DEFAULT_BASE_URL)
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

// Custom serialization for Duration
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.provider_id, "gemini");
        assert_eq!(config.model, "gemini-3-pro-preview");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(matches!(config.auth, AuthConfig::None));
    }

    #[test]
    fn test_serde_round_trip_keeps_timeout_in_seconds() {
        let config = ProviderConfig::default()
            .with_api_key("k")
            .with_timeout(Duration::from_secs(15));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout"], 15);
        assert_eq!(json["type"], "api_key");

        let parsed: ProviderConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.timeout, Duration::from_secs(15));
    }
}
