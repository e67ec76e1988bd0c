use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::user::UserId;

/// Items written in one gratitude journal session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GratitudeEntry {
    pub id: String,
    pub user_id: UserId,
    pub items: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl GratitudeEntry {
    pub fn new(user_id: impl Into<UserId>, items: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            items,
            created_at: Utc::now(),
        }
    }
}

/// A finished 5-4-3-2-1 grounding walk-through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSession {
    pub id: String,
    pub user_id: UserId,
    pub completed_at: DateTime<Utc>,
}

impl GroundingSession {
    pub fn completed_now(user_id: impl Into<UserId>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            completed_at: Utc::now(),
        }
    }
}
