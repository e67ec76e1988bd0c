pub mod types;
pub mod crisis;
pub mod error;

pub use types::{
    User,
    UserId,
    DEFAULT_DISPLAY_NAME,
    MoodType,
    MoodEntry,
    NewMoodEntry,
    MOOD_SAVE_ALERT,
    ChatRole,
    ChatMessage,
    NewChatMessage,
    HistoryTurn,
    HISTORY_WINDOW,
    CHAT_FALLBACK_REPLY,
    COMPLETION_APOLOGY,
    GratitudeEntry,
    GroundingSession,
};

pub use crisis::{detect_crisis, CRISIS_KEYWORDS, CRISIS_NOTICE_BODY, CRISIS_NOTICE_TITLE};
pub use error::{CoreError, Result};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
