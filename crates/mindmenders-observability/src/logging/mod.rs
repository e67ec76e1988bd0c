//! 结构化日志模块
//!
//! 提供基于 tracing 的结构化日志功能。

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{self, Rotation};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;
use crate::error::{ObservabilityError, Result};

/// 日志级别重新加载句柄类型
type ReloadHandle = Handle<EnvFilter, Registry>;

/// 日志管理器
///
/// 持有文件写入线程的 guard，drop 时会刷新剩余日志。
#[derive(Debug)]
pub struct LogManager {
    /// 配置
    config: LoggingConfig,

    /// 过滤器重新加载句柄
    reload_handle: Arc<RwLock<ReloadHandle>>,

    /// 文件写入 guard
    _file_guard: Option<WorkerGuard>,
}

impl LogManager {
    /// 初始化全局日志系统
    ///
    /// 每个进程只能成功调用一次，重复调用返回 `Init` 错误。
    pub fn init(config: LoggingConfig) -> Result<Self> {
        // 构建环境过滤器
        let filter = build_filter(&config.level, &config)?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        let console_layer = if !config.console {
            None
        } else if config.json_format {
            Some(
                fmt::layer()
                    .json()
                    .with_target(config.include_target)
                    .with_line_number(config.include_line_number)
                    .with_writer(std::io::stderr)
                    .boxed(),
            )
        } else {
            Some(
                fmt::layer()
                    .with_target(config.include_target)
                    .with_line_number(config.include_line_number)
                    .with_ansi(config.ansi_colors)
                    .with_writer(std::io::stderr)
                    .boxed(),
            )
        };

        let (file_layer, file_guard) = match &config.file_path {
            Some(path) => {
                let (writer, guard) = file_writer(path, config.max_files)?;
                let layer = fmt::layer()
                    .json()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| ObservabilityError::init(format!("Failed to install subscriber: {}", e)))?;

        tracing::debug!(
            target: "mindmenders_observability",
            "Log manager initialized with level: {}",
            config.level
        );

        Ok(Self {
            config,
            reload_handle: Arc::new(RwLock::new(reload_handle)),
            _file_guard: file_guard,
        })
    }

    /// 动态更新日志级别
    pub fn update_level(&mut self, level: &str) -> Result<()> {
        let new_filter = build_filter(level, &self.config)?;

        self.reload_handle
            .write()
            .modify(|filter| {
                *filter = new_filter;
            })
            .map_err(|e| ObservabilityError::logging(format!("Failed to update log level: {}", e)))?;

        self.config.level = level.to_string();

        tracing::info!(
            target: "mindmenders_observability",
            "Log level updated to: {}",
            level
        );

        Ok(())
    }

    /// 获取当前配置
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}

/// 构建环境过滤器
fn build_filter(level: &str, config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(level)
        .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

    // 添加模块级别的过滤器
    for (module, module_level) in &config.module_levels {
        filter = filter.add_directive(
            format!("{}={}", module, module_level)
                .parse()
                .map_err(|e| ObservabilityError::logging(format!("Invalid directive: {}", e)))?,
        );
    }

    Ok(filter)
}

/// 创建按天滚动的非阻塞文件写入器
fn file_writer(path: &Path, max_files: usize) -> Result<(NonBlocking, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("mindmenders.log");

    let appender = rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(max_files.max(1))
        .build(dir)
        .map_err(|e| ObservabilityError::init(format!("Failed to open log file: {}", e)))?;

    Ok(tracing_appender::non_blocking(appender))
}

/// 创建一次聊天轮次的 span
pub fn chat_turn_span(user_id: &str) -> tracing::Span {
    tracing::info_span!(
        "chat_turn",
        user_id = %user_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_with_modules() {
        let config = LoggingConfig::default().with_module_level("mindmenders_llm", "trace");
        assert!(build_filter("warn", &config).is_ok());
    }

    #[test]
    fn test_build_filter_rejects_garbage() {
        let config = LoggingConfig::default().with_module_level("mindmenders_llm", "[[[");
        let err = build_filter("info", &config).unwrap_err();
        assert_eq!(err.category(), "logging");
    }

    #[test]
    fn test_init_and_update_level() {
        let mut manager = LogManager::init(LoggingConfig::default().with_console(false)).unwrap();
        manager.update_level("debug").unwrap();
        assert_eq!(manager.config().level, "debug");

        // the global subscriber is already installed
        let second = LogManager::init(LoggingConfig::default());
        assert!(matches!(second, Err(ObservabilityError::Init { .. })));
    }

    #[test]
    fn test_chat_turn_span_is_constructible() {
        let _turn = chat_turn_span("user-1");
    }
}
