//! # Session Error Types

use mindmenders_store::StoreError;
use thiserror::Error;

/// 编排层错误
#[derive(Error, Debug)]
pub enum SessionError {
    /// 远端存储失败；补全失败在轮次内以兜底回复处理，不会出现在这里
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 应用导航错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// 未登录时不能切换标签页
    #[error("Please sign in to continue.")]
    NotAuthenticated,

    #[error("Unknown tab: {0}")]
    UnknownTab(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_is_transparent() {
        let err: SessionError = StoreError::auth("Invalid login credentials").into();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }
}
