//! # Exercise Error Types

use thiserror::Error;

/// 练习状态机错误
#[derive(Error, Debug)]
pub enum ExerciseError {
    /// 着陆练习已完成，需要 restart
    #[error("Grounding session already finished")]
    GroundingFinished,

    /// 感恩记录已保存，需要 reset 后才能修改
    #[error("Gratitude entry already saved")]
    GratitudeSaved,

    /// 所有感恩条目都为空
    #[error("Write at least one thing you're grateful for.")]
    NothingToSave,

    #[error("Gratitude slot {index} out of range (max {max})")]
    SlotOutOfRange { index: usize, max: usize },

    #[error("Unknown breathing pattern: {0}")]
    UnknownPattern(String),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ExerciseResult<T> = Result<T, ExerciseError>;
