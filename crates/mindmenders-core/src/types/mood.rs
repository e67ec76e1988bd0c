use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::user::UserId;

/// Alert shown when a mood entry could not be saved
pub const MOOD_SAVE_ALERT: &str = "Error saving mood. Please check your cloud connection.";

/// Self-reported mood category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodType {
    Happy,
    Sad,
    Anxious,
    Stressed,
    Calm,
}

impl MoodType {
    /// Every category, in the order the check-in screen offers them
    pub const ALL: [MoodType; 5] = [
        MoodType::Happy,
        MoodType::Sad,
        MoodType::Anxious,
        MoodType::Stressed,
        MoodType::Calm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodType::Happy => "happy",
            MoodType::Sad => "sad",
            MoodType::Anxious => "anxious",
            MoodType::Stressed => "stressed",
            MoodType::Calm => "calm",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            MoodType::Happy => "😊",
            MoodType::Sad => "😢",
            MoodType::Anxious => "😰",
            MoodType::Stressed => "😫",
            MoodType::Calm => "😌",
        }
    }
}

impl std::fmt::Display for MoodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MoodType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Ok(MoodType::Happy),
            "sad" => Ok(MoodType::Sad),
            "anxious" => Ok(MoodType::Anxious),
            "stressed" => Ok(MoodType::Stressed),
            "calm" => Ok(MoodType::Calm),
            _ => Err(CoreError::UnknownMood(s.to_string())),
        }
    }
}

/// A stored mood entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    #[serde(deserialize_with = "crate::types::deserialize_id")]
    pub id: String,
    pub user_id: UserId,
    pub mood: MoodType,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
    pub created_at: DateTime<Utc>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl MoodEntry {
    /// Placeholder shown while the store write is in flight
    pub fn local(user_id: impl Into<UserId>, mood: MoodType, note: impl Into<String>) -> Self {
        Self {
            id: format!("local-{}", uuid::Uuid::new_v4()),
            user_id: user_id.into(),
            mood,
            note: note.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.id.starts_with("local-")
    }

    /// Whether the entry carries a note worth displaying
    pub fn has_note(&self) -> bool {
        !self.note.trim().is_empty()
    }
}

/// Insert payload for a mood entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMoodEntry {
    pub user_id: UserId,
    pub mood: MoodType,
    pub note: String,
}

impl NewMoodEntry {
    /// Missing notes are stored as an empty string
    pub fn new(user_id: impl Into<UserId>, mood: MoodType, note: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            mood,
            note: note.unwrap_or_default(),
        }
    }
}
