pub mod config;
pub mod manager;

pub use config::{
    AuthSettings, Config, ConfigError, ConfigResult, LlmConfig, LogLevel, LoggingConfig,
    StoreConfig,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 获取 MindMenders 配置目录路径
pub fn mindmenders_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mindmenders"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    mindmenders_dir().map(|dir| dir.join("config.json"))
}

/// 获取默认登录会话缓存路径
pub fn default_session_path() -> Option<PathBuf> {
    mindmenders_dir().map(|dir| dir.join("session.json"))
}

/// 获取默认日志文件路径
pub fn default_log_path() -> Option<PathBuf> {
    mindmenders_dir().map(|dir| dir.join("logs").join("mindmenders.log"))
}

/// 初始化 MindMenders 目录结构
pub async fn init_mindmenders_dirs() -> ConfigResult<()> {
    if let Some(root) = mindmenders_dir() {
        tokio::fs::create_dir_all(&root).await?;
        tokio::fs::create_dir_all(root.join("logs")).await?;
    }
    Ok(())
}

/// 展开路径中的 ~ 为用户主目录
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else {
        Some(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mindmenders_dir() {
        let dir = mindmenders_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().to_string_lossy().contains(".mindmenders"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/.mindmenders/config.json");
        assert!(expanded.is_some());
        assert!(!expanded.unwrap().to_string_lossy().starts_with('~'));

        let plain = expand_tilde("/tmp/config.json").unwrap();
        assert_eq!(plain, PathBuf::from("/tmp/config.json"));
    }

    #[test]
    fn test_default_paths_share_root() {
        let root = mindmenders_dir().unwrap();
        assert!(default_config_path().unwrap().starts_with(&root));
        assert!(default_session_path().unwrap().starts_with(&root));
        assert!(default_log_path().unwrap().starts_with(&root));
    }
}
