use thiserror::Error;

/// Errors raised while parsing or validating domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown mood: {0}")]
    UnknownMood(String),

    #[error("unknown chat role: {0}")]
    UnknownRole(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
