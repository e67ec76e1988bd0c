//! 日志配置
//!
//! 支持直接构建，或从 mindmenders-config 的应用配置转换。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// 日志级别（trace, debug, info, warn, error）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否使用 JSON 格式
    #[serde(default)]
    pub json_format: bool,

    /// 是否输出到 stderr
    #[serde(default = "default_true")]
    pub console: bool,

    /// 日志文件路径，按天滚动
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// 保留的滚动日志文件数量
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// 模块级别的日志配置
    #[serde(default)]
    pub module_levels: HashMap<String, String>,

    /// 是否启用 ANSI 颜色
    #[serde(default = "default_true")]
    pub ansi_colors: bool,

    /// 是否包含目标（target）
    #[serde(default = "default_true")]
    pub include_target: bool,

    /// 是否包含行号
    #[serde(default)]
    pub include_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            console: true,
            file_path: None,
            max_files: default_max_files(),
            module_levels: HashMap::new(),
            ansi_colors: true,
            include_target: true,
            include_line_number: false,
        }
    }
}

impl LoggingConfig {
    /// 设置日志级别
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// 设置是否使用 JSON 格式
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// 设置是否输出到 stderr
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// 设置日志文件路径
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// 添加模块特定的日志级别
    pub fn with_module_level(mut self, module: impl Into<String>, level: impl Into<String>) -> Self {
        self.module_levels.insert(module.into(), level.into());
        self
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_files() -> usize {
    5
}

#[cfg(feature = "app-config")]
impl From<&mindmenders_config::LoggingConfig> for LoggingConfig {
    fn from(settings: &mindmenders_config::LoggingConfig) -> Self {
        Self {
            level: settings.level.to_string(),
            json_format: settings.json,
            file_path: settings
                .file
                .as_deref()
                .and_then(mindmenders_config::expand_tilde),
            max_files: settings.max_files,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = LoggingConfig::default()
            .with_level("debug")
            .with_json_format(true)
            .with_console(false)
            .with_module_level("mindmenders_store", "trace");

        assert_eq!(config.level, "debug");
        assert!(config.json_format);
        assert!(!config.console);
        assert_eq!(config.module_levels["mindmenders_store"], "trace");
    }

    #[cfg(feature = "app-config")]
    #[test]
    fn test_from_app_config() {
        let mut settings = mindmenders_config::LoggingConfig::default();
        settings.level = mindmenders_config::LogLevel::Warn;
        settings.file = Some("/tmp/mindmenders-test.log".to_string());
        settings.json = true;

        let config = LoggingConfig::from(&settings);
        assert_eq!(config.level, "warn");
        assert!(config.json_format);
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/mindmenders-test.log")));
    }
}
