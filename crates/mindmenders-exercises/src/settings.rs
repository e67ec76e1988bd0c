//! 界面偏好开关，保存在 `~/.mindmenders/settings.json`

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ExerciseError, ExerciseResult};

/// 偏好开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    DarkMode,
    Notifications,
    ProactiveSupport,
    PrivacyMode,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::DarkMode,
        SettingKey::Notifications,
        SettingKey::ProactiveSupport,
        SettingKey::PrivacyMode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::DarkMode => "dark_mode",
            SettingKey::Notifications => "notifications",
            SettingKey::ProactiveSupport => "proactive_support",
            SettingKey::PrivacyMode => "privacy_mode",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SettingKey::DarkMode => "Dark Mode",
            SettingKey::Notifications => "Daily Reminders",
            SettingKey::ProactiveSupport => "Proactive Support",
            SettingKey::PrivacyMode => "Privacy Mode",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SettingKey::DarkMode => "Use the low-light sanctuary theme",
            SettingKey::Notifications => "Gentle nudges to check in with yourself",
            SettingKey::ProactiveSupport => "Let the companion reach out when your mood dips",
            SettingKey::PrivacyMode => "Hide journal previews on the dashboard",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = ExerciseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        SettingKey::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == key)
            .ok_or_else(|| ExerciseError::UnknownSetting(s.to_string()))
    }
}

/// 偏好设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dark_mode: bool,
    pub notifications: bool,
    pub proactive_support: bool,
    pub privacy_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            notifications: true,
            proactive_support: false,
            privacy_mode: false,
        }
    }
}

impl Settings {
    pub fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::DarkMode => self.dark_mode,
            SettingKey::Notifications => self.notifications,
            SettingKey::ProactiveSupport => self.proactive_support,
            SettingKey::PrivacyMode => self.privacy_mode,
        }
    }

    pub fn set(&mut self, key: SettingKey, value: bool) {
        let slot = match key {
            SettingKey::DarkMode => &mut self.dark_mode,
            SettingKey::Notifications => &mut self.notifications,
            SettingKey::ProactiveSupport => &mut self.proactive_support,
            SettingKey::PrivacyMode => &mut self.privacy_mode,
        };
        *slot = value;
    }

    /// 翻转开关，返回新值
    pub fn toggle(&mut self, key: SettingKey) -> bool {
        let value = !self.get(key);
        self.set(key, value);
        value
    }

    /// 所有开关及其当前值
    pub fn entries(&self) -> Vec<(SettingKey, bool)> {
        SettingKey::ALL.into_iter().map(|key| (key, self.get(key))).collect()
    }

    /// 读取设置文件；不存在或损坏时使用默认值
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> ExerciseResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Settings saved to {:?}", path);
        Ok(())
    }
}
