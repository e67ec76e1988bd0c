use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::user::UserId;

/// Number of prior messages handed to the completion client
pub const HISTORY_WINDOW: usize = 10;

/// Assistant reply shown when a chat turn cannot complete
pub const CHAT_FALLBACK_REPLY: &str = "I'm having trouble connecting to my memory banks right now, but I'm still here for you. Is there something specific on your mind?";

/// Assistant reply shown when the completion client fails
pub const COMPLETION_APOLOGY: &str = "I'm sorry, I'm having a hard time connecting to my thoughts right now. I'm still here with you, though. Please take a moment to breathe with me. What else is on your mind?";

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Ai => "ai",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChatRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ChatRole::User),
            "ai" => Ok(ChatRole::Ai),
            _ => Err(CoreError::UnknownRole(s.to_string())),
        }
    }
}

/// A stored chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(deserialize_with = "crate::types::deserialize_id")]
    pub id: String,
    pub user_id: UserId,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a message that only exists on this client
    pub fn local(user_id: impl Into<UserId>, role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: format!("local-{}", uuid::Uuid::new_v4()),
            user_id: user_id.into(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.id.starts_with("local-")
    }

    pub fn to_turn(&self) -> HistoryTurn {
        HistoryTurn {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Insert payload for a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChatMessage {
    pub user_id: UserId,
    pub role: ChatRole,
    pub content: String,
}

impl NewChatMessage {
    pub fn new(user_id: impl Into<UserId>, role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            content: content.into(),
        }
    }
}

/// One prior turn handed to the completion client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: ChatRole,
    pub content: String,
}

impl HistoryTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Ai,
            content: content.into(),
        }
    }
}
