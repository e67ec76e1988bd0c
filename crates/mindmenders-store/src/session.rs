//! Login session persistence

use chrono::{DateTime, Utc};
use mindmenders_core::User;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// Seconds before expiry at which a session is treated as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Tokens and user info of a signed-in session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds)
    pub expires_at: i64,
    pub user: User,
}

impl AuthSession {
    /// Check if the access token is still usable (with a one minute buffer)
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp() + EXPIRY_MARGIN_SECS
    }
}

/// JSON file holding the last session, readable only by the owner
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.mindmenders/session.json`
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".mindmenders").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached session. Unreadable or corrupt files count as no session.
    pub fn load(&self) -> Option<AuthSession> {
        if !self.path.exists() {
            return None;
        }

        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Ignoring corrupt session cache {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Load the cached session (async version)
    pub async fn load_async(&self) -> Option<AuthSession> {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.load())
            .await
            .ok()
            .flatten()
    }

    /// Save session to cache
    pub fn save(&self, session: &AuthSession) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }

    /// Save session to cache (async version)
    pub async fn save_async(&self, session: &AuthSession) -> StoreResult<()> {
        let cache = self.clone();
        let session = session.clone();
        tokio::task::spawn_blocking(move || cache.save(&session))
            .await
            .map_err(|e| StoreError::other(format!("Failed to save session: {}", e)))?
    }

    /// Delete cache file
    pub fn clear(&self) -> StoreResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
