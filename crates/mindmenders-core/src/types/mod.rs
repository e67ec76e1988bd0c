pub mod user;
pub mod mood;
pub mod chat;
pub mod exercise;

pub use user::{User, UserId, DEFAULT_DISPLAY_NAME};
pub use mood::{MoodType, MoodEntry, NewMoodEntry, MOOD_SAVE_ALERT};
pub use chat::{
    ChatRole, ChatMessage, NewChatMessage, HistoryTurn, HISTORY_WINDOW, CHAT_FALLBACK_REPLY,
    COMPLETION_APOLOGY,
};
pub use exercise::{GratitudeEntry, GroundingSession};

/// Row ids arrive as uuid strings or bigint numbers depending on the table
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}
