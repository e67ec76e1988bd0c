use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique user identifier, as issued by the remote store
pub type UserId = String;

/// Display name used when the store has no profile row for a user
pub const DEFAULT_DISPLAY_NAME: &str = "Sanctuary User";

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        id: impl Into<UserId>,
        email: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            created_at,
        }
    }

    /// First word of the display name, used for greetings
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}
