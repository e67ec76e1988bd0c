//! # Mood Journal
//!
//! [`MoodJournal`] 是用户心情记录的本地镜像（最新的在前）。
//! 保存时先在顶部插入一条待定记录，成功后替换为存储返回的记录，失败则移除。
//!
//! [`MoodCheckIn`] 是打卡表单：选择心情、可选备注、提交。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mindmenders_core::{MoodEntry, MoodType, User, MOOD_SAVE_ALERT};
use mindmenders_store::RemoteStore;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::SessionResult;

/// 用户心情记录缓存
pub struct MoodJournal {
    user: User,
    store: Arc<dyn RemoteStore>,
    entries: RwLock<Vec<MoodEntry>>,
}

impl MoodJournal {
    pub fn new(user: User, store: Arc<dyn RemoteStore>) -> Self {
        Self {
            user,
            store,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// 记录快照（最新的在前，待定记录在最上方）
    pub fn entries(&self) -> Vec<MoodEntry> {
        self.entries.read().clone()
    }

    pub fn latest(&self) -> Option<MoodEntry> {
        self.entries.read().first().cloned()
    }

    /// 从存储重新加载；进行中的待定记录保留在顶部
    pub async fn refresh(&self) -> SessionResult<usize> {
        let fetched = self.store.list_moods(&self.user).await?;
        let count = fetched.len();

        let mut entries = self.entries.write();
        let mut merged: Vec<MoodEntry> = entries.iter().filter(|e| e.is_local()).cloned().collect();
        merged.extend(fetched);
        *entries = merged;

        debug!(user_id = %self.user.id, count, "Mood entries refreshed");
        Ok(count)
    }

    /// 保存一条心情记录
    pub async fn record(&self, mood: MoodType, note: Option<&str>) -> SessionResult<MoodEntry> {
        let note = note.unwrap_or_default();
        let pending = MoodEntry::local(self.user.id.clone(), mood, note);
        let pending_id = pending.id.clone();
        self.entries.write().insert(0, pending);

        match self.store.create_mood(&self.user, mood, note).await {
            Ok(saved) => {
                let mut entries = self.entries.write();
                // 并发的 refresh 可能已经取回这条记录
                entries.retain(|entry| entry.id != saved.id);
                match entries.iter_mut().find(|e| e.id == pending_id) {
                    Some(slot) => *slot = saved.clone(),
                    None => entries.insert(0, saved.clone()),
                }
                drop(entries);

                info!(user_id = %self.user.id, mood = %mood, "Mood recorded");
                Ok(saved)
            }
            Err(e) => {
                self.entries.write().retain(|entry| entry.id != pending_id);
                warn!(user_id = %self.user.id, "Failed to save mood: {}", e);
                Err(e.into())
            }
        }
    }
}

/// 打卡提交错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckInError {
    #[error("Select how you're feeling first.")]
    NoMoodSelected,

    #[error("A check-in is already being saved.")]
    InProgress,

    /// 阻塞式提示，不自动重试
    #[error("{}", MOOD_SAVE_ALERT)]
    SaveFailed,
}

#[derive(Debug, Default)]
struct CheckInForm {
    selected: Option<MoodType>,
    note: String,
}

/// 心情打卡表单
#[derive(Debug, Default)]
pub struct MoodCheckIn {
    form: Mutex<CheckInForm>,
    submitting: AtomicBool,
}

impl MoodCheckIn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&self, mood: MoodType) {
        self.form.lock().selected = Some(mood);
    }

    pub fn selected(&self) -> Option<MoodType> {
        self.form.lock().selected
    }

    pub fn set_note(&self, note: impl Into<String>) {
        self.form.lock().note = note.into();
    }

    pub fn note(&self) -> String {
        self.form.lock().note.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// 已选择心情且没有进行中的提交
    pub fn can_submit(&self) -> bool {
        self.selected().is_some() && !self.is_submitting()
    }

    /// 提交到心情日志，成功后清空表单；失败时保留输入
    pub async fn submit(&self, journal: &MoodJournal) -> Result<MoodEntry, CheckInError> {
        let (mood, note) = {
            let form = self.form.lock();
            (form.selected, form.note.clone())
        };
        let mood = mood.ok_or(CheckInError::NoMoodSelected)?;

        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CheckInError::InProgress);
        }

        let note = note.trim();
        let result = journal
            .record(mood, (!note.is_empty()).then_some(note))
            .await;
        self.submitting.store(false, Ordering::Release);

        match result {
            Ok(entry) => {
                *self.form.lock() = CheckInForm::default();
                Ok(entry)
            }
            Err(_) => Err(CheckInError::SaveFailed),
        }
    }
}
