//! # Store Error Types
//!
//! 定义远端存储相关的错误类型。

use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    /// 本地校验失败（请求未发出）
    #[error("{message}")]
    Validation { message: String },

    /// 认证失败（凭据错误、用户已存在等）
    #[error("{message}")]
    Auth { message: String },

    /// 邮箱尚未确认
    #[error("Your email hasn't been confirmed yet. Please check your inbox or disable 'Confirm Email' in your Supabase Authentication settings.")]
    EmailNotConfirmed,

    /// 没有可用的登录会话
    #[error("Not signed in")]
    NotAuthenticated,

    /// 网络错误
    #[error("Network error: {0}")]
    Network(String),

    /// 服务端返回错误
    #[error("Store API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化/反序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 配置错误
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// 其他错误
    #[error("Store error: {message}")]
    Other { message: String },
}

impl StoreError {
    /// 创建校验错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// 创建认证错误
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 创建其他错误
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// 是否应作为表单内联提示展示给用户
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::Auth { .. } | Self::EmailNotConfirmed
        )
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// 存储结果类型
pub type StoreResult<T> = Result<T, StoreError>;
