use crate::config::{Config, ConfigError, ConfigResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// 配置管理器
#[derive(Clone)]
pub struct ConfigManager {
    path: PathBuf,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// 加载配置文件，不存在时写入默认配置
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let config = if path.exists() {
            info!("Loading config from {:?}", path);
            Self::read_file(path).await?
        } else {
            info!("Config file not found, creating default config at {:?}", path);
            let default_config = Config::default();
            // 确保父目录存在
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let content = serde_json::to_string_pretty(&default_config)?;
            tokio::fs::write(path, &content).await?;
            default_config
        };

        Ok(Self {
            path: path.to_path_buf(),
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 从默认位置加载配置
    pub async fn load_default() -> ConfigResult<Self> {
        let config_path = Self::default_config_path()?;
        Self::load(&config_path).await
    }

    /// 获取默认配置路径 (~/.mindmenders/config.json)
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        crate::default_config_path()
            .ok_or_else(|| ConfigError::InvalidPath("Could not find home directory".to_string()))
    }

    /// 创建一个新的配置管理器（用于测试和 init）
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置的共享引用
    pub fn get(&self) -> Arc<RwLock<Config>> {
        Arc::clone(&self.config)
    }

    /// 获取当前配置的副本
    pub async fn snapshot(&self) -> Config {
        self.config.read().await.clone()
    }

    /// 保存配置到文件
    pub async fn save(&self) -> ConfigResult<()> {
        let config = self.config.read().await;
        let content = serde_json::to_string_pretty(&*config)?;
        drop(config);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        info!("Config saved to {:?}", self.path);
        Ok(())
    }

    /// 重新加载配置
    pub async fn reload(&self) -> ConfigResult<()> {
        if !self.path.exists() {
            return Err(ConfigError::InvalidPath(format!(
                "Config file not found: {:?}",
                self.path
            )));
        }

        let new_config = Self::read_file(&self.path).await?;

        let mut config = self.config.write().await;
        *config = new_config;
        drop(config);

        info!("Config reloaded from {:?}", self.path);
        Ok(())
    }

    /// 更新配置并保存
    pub async fn update<F>(&self, f: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config) -> ConfigResult<()>,
    {
        let mut config = self.config.write().await;
        let mut candidate = config.clone();
        f(&mut candidate)?;
        Self::validate(&candidate)?;
        *config = candidate;
        drop(config);
        self.save().await
    }

    /// 验证配置
    pub fn validate(config: &Config) -> ConfigResult<()> {
        if !config.store.url.starts_with("http://") && !config.store.url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "Store url must be an http(s) URL: {}",
                config.store.url
            )));
        }

        if !config.llm.base_url.starts_with("http://") && !config.llm.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "LLM base_url must be an http(s) URL: {}",
                config.llm.base_url
            )));
        }

        if config.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "LLM model cannot be empty".to_string(),
            ));
        }

        if config.llm.timeout_seconds == 0 || config.store.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    async fn read_file(path: &Path) -> ConfigResult<Config> {
        let content = tokio::fs::read_to_string(path).await?;
        let content = Self::expand_env_vars(&content)?;
        let config: Config = serde_json::from_str(&content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// 展开环境变量 ${VAR} 或 ${VAR:-default}
    pub fn expand_env_vars(content: &str) -> ConfigResult<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::Validation(format!("Invalid pattern: {}", e)))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let (Some(full_match), Some(var_expr)) = (cap.get(0), cap.get(1)) else {
                continue;
            };

            // 处理 ${VAR:-default} 语法
            let (var_name, default_value) = match var_expr.as_str().split_once(":-") {
                Some((name, default)) => (name, Some(default)),
                None => (var_expr.as_str(), None),
            };

            let replacement = match std::env::var(var_name) {
                Ok(val) => val,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    None => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
                },
            };

            result = result.replace(full_match.as_str(), &replacement);
        }

        Ok(result)
    }

    /// 获取配置文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_creates_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let manager = ConfigManager::load(&config_path).await.unwrap();
        let config = manager.snapshot().await;

        assert!(config_path.exists());
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_env_var_expansion() {
        std::env::set_var("MINDMENDERS_TEST_EXPAND", "test_value");

        let content = r#"{"key": "${MINDMENDERS_TEST_EXPAND}", "other": "${MINDMENDERS_UNSET_VAR:-fallback}"}"#;
        let expanded = ConfigManager::expand_env_vars(content).unwrap();

        assert!(expanded.contains("test_value"));
        assert!(expanded.contains("fallback"));

        let missing = ConfigManager::expand_env_vars("${MINDMENDERS_SURELY_MISSING}");
        assert!(matches!(missing, Err(ConfigError::EnvVarNotFound(_))));
    }

    #[tokio::test]
    async fn test_load_expands_store_url() {
        std::env::set_var("MINDMENDERS_TEST_STORE_URL", "https://demo.supabase.co");
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let mut value = serde_json::to_value(Config::default()).unwrap();
        value["store"]["url"] = serde_json::json!("${MINDMENDERS_TEST_STORE_URL}");
        tokio::fs::write(&config_path, value.to_string()).await.unwrap();

        let manager = ConfigManager::load(&config_path).await.unwrap();
        assert_eq!(manager.snapshot().await.store.url, "https://demo.supabase.co");
    }

    #[tokio::test]
    async fn test_update_persists_and_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::load(&config_path).await.unwrap();

        manager
            .update(|config| config.set_value("llm.model", "gemini-2.5-pro"))
            .await
            .unwrap();

        let reloaded = ConfigManager::load(&config_path).await.unwrap();
        assert_eq!(reloaded.snapshot().await.llm.model, "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::load(&config_path).await.unwrap();

        let result = manager
            .update(|config| config.set_value("store.url", "ftp://nowhere"))
            .await;
        assert!(result.is_err());
        assert_eq!(manager.snapshot().await.store.url, Config::default().store.url);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(ConfigManager::validate(&config).is_ok());

        config.llm.timeout_seconds = 0;
        assert!(ConfigManager::validate(&config).is_err());

        config.llm.timeout_seconds = 30;
        config.llm.model = "  ".to_string();
        assert!(ConfigManager::validate(&config).is_err());
    }
}
