use serde::{Deserialize, Serialize};

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: StoreConfig::default(),
            llm: LlmConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// 获取配置值的快捷方法
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["store", "url"] => Some(self.store.url.clone()),
            ["store", "anon_key_env"] => self.store.auth.env_var().map(str::to_string),
            ["store", "session_file"] => self.store.session_file.clone(),
            ["store", "timeout_seconds"] => Some(self.store.timeout_seconds.to_string()),
            ["llm", "base_url"] => Some(self.llm.base_url.clone()),
            ["llm", "model"] => Some(self.llm.model.clone()),
            ["llm", "api_key_env"] => self.llm.auth.env_var().map(str::to_string),
            ["llm", "timeout_seconds"] => Some(self.llm.timeout_seconds.to_string()),
            ["logging", "level"] => Some(self.logging.level.to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            ["logging", "json"] => Some(self.logging.json.to_string()),
            ["logging", "max_files"] => Some(self.logging.max_files.to_string()),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["store", "url"] => {
                self.store.url = value.trim_end_matches('/').to_string();
            }
            ["store", "anon_key_env"] => {
                self.store.auth = AuthSettings::ApiKey {
                    env: value.to_string(),
                };
            }
            ["store", "session_file"] => {
                self.store.session_file = Some(value.to_string());
            }
            ["store", "timeout_seconds"] => {
                self.store.timeout_seconds = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid number: {}", value))
                })?;
            }
            ["llm", "base_url"] => {
                self.llm.base_url = value.trim_end_matches('/').to_string();
            }
            ["llm", "model"] => {
                self.llm.model = value.to_string();
            }
            ["llm", "api_key_env"] => {
                self.llm.auth = AuthSettings::ApiKey {
                    env: value.to_string(),
                };
            }
            ["llm", "timeout_seconds"] => {
                self.llm.timeout_seconds = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid number: {}", value))
                })?;
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "file"] => {
                self.logging.file = Some(value.to_string());
            }
            ["logging", "json"] => {
                self.logging.json = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid boolean: {}", value))
                })?;
            }
            ["logging", "max_files"] => {
                self.logging.max_files = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid number: {}", value))
                })?;
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

/// 远端存储（认证 + 数据库）配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// 项目地址，例如 https://xyzcompany.supabase.co
    pub url: String,
    /// 匿名 key 的来源
    #[serde(flatten)]
    pub auth: AuthSettings,
    /// 登录会话缓存文件
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_file: Option<String>,
    #[serde(default = "default_store_timeout")]
    pub timeout_seconds: u64,
}

fn default_store_timeout() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:54321".to_string(),
            auth: AuthSettings::ApiKey {
                env: "SUPABASE_ANON_KEY".to_string(),
            },
            session_file: Some("~/.mindmenders/session.json".to_string()),
            timeout_seconds: default_store_timeout(),
        }
    }
}

/// LLM 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(flatten)]
    pub auth: AuthSettings,
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-3-pro-preview".to_string(),
            auth: AuthSettings::ApiKey {
                env: "GEMINI_API_KEY".to_string(),
            },
            timeout_seconds: default_llm_timeout(),
        }
    }
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "auth_type", rename_all = "snake_case")]
pub enum AuthSettings {
    /// API Key authentication - reads from environment variable
    ApiKey {
        env: String,
    },
    /// No authentication
    #[default]
    None,
}

impl AuthSettings {
    /// Get API key from environment if applicable
    pub fn get_api_key(&self) -> Option<String> {
        match self {
            Self::ApiKey { env } => std::env::var(env).ok().filter(|key| !key.is_empty()),
            Self::None => None,
        }
    }

    /// Name of the environment variable holding the key
    pub fn env_var(&self) -> Option<&str> {
        match self {
            Self::ApiKey { env } => Some(env),
            Self::None => None,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", level)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    #[serde(default)]
    pub json: bool,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_max_files() -> usize {
    5
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: Some("~/.mindmenders/logs/mindmenders.log".to_string()),
            json: false,
            max_files: default_max_files(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.model, "gemini-3-pro-preview");
        assert_eq!(config.llm.auth.env_var(), Some("GEMINI_API_KEY"));
        assert_eq!(config.store.auth.env_var(), Some("SUPABASE_ANON_KEY"));
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_auth_settings_serialization() {
        let llm = LlmConfig::default();
        let json = serde_json::to_value(&llm).unwrap();
        assert_eq!(json["auth_type"], "api_key");
        assert_eq!(json["env"], "GEMINI_API_KEY");

        let parsed: LlmConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, llm);
    }

    #[test]
    fn test_get_and_set_value() {
        let mut config = Config::default();

        config.set_value("llm.model", "gemini-2.5-flash").unwrap();
        assert_eq!(config.get_value("llm.model").as_deref(), Some("gemini-2.5-flash"));

        config.set_value("store.url", "https://demo.supabase.co/").unwrap();
        assert_eq!(config.get_value("store.url").as_deref(), Some("https://demo.supabase.co"));

        config.set_value("logging.level", "WARNING").unwrap();
        assert_eq!(config.get_value("logging.level").as_deref(), Some("warn"));

        config.set_value("logging.json", "true").unwrap();
        assert!(config.logging.json);
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = Config::default();

        assert!(matches!(
            config.set_value("llm.timeout_seconds", "soon"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            config.set_value("server.port", "8080"),
            Err(ConfigError::KeyNotFound(_))
        ));
        assert_eq!(config.get_value("nope"), None);
    }
}
