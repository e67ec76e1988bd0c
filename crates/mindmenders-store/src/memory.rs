//! # In-Memory Store
//!
//! 进程内的 [`RemoteStore`] 实现，行为与 Supabase 后端一致：
//! 数据操作需要登录会话，列表按创建时间排序。
//!
//! 支持故障注入（[`MemoryStore::fail_next`] / [`MemoryStore::fail_always`]），
//! 用于验证上层的乐观更新和失败回滚逻辑。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use mindmenders_core::{ChatMessage, ChatRole, MoodEntry, MoodType, User, UserId, DEFAULT_DISPLAY_NAME};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{
    Registration, RemoteStore, LOGIN_PASSWORD_REQUIRED, REGISTER_PASSWORD_REQUIRED,
};

/// 可注入故障的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Authenticate,
    Register,
    CurrentSession,
    SignOut,
    ListMoods,
    CreateMood,
    ListChats,
    CreateChat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Once,
    Always,
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
    confirmed: bool,
}

/// 内存存储
pub struct MemoryStore {
    /// email -> 账号
    accounts: DashMap<String, Account>,
    moods: DashMap<UserId, Vec<MoodEntry>>,
    chats: DashMap<UserId, Vec<ChatMessage>>,
    current: RwLock<Option<User>>,
    failures: DashMap<StoreOperation, Failure>,
    require_confirmation: AtomicBool,
    writes: AtomicUsize,
    /// 最近一次分配的时间戳，保证严格递增
    clock: Mutex<DateTime<Utc>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            moods: DashMap::new(),
            chats: DashMap::new(),
            current: RwLock::new(None),
            failures: DashMap::new(),
            require_confirmation: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
            clock: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// 预置一个已确认的账号（未登录）
    pub fn with_user(self, name: &str, email: &str, password: &str) -> Self {
        self.insert_account(name, email, password, true);
        self
    }

    /// 注册后需要邮件确认
    pub fn requiring_confirmation(self) -> Self {
        self.require_confirmation.store(true, Ordering::SeqCst);
        self
    }

    /// 创建一个已登录的存储
    pub fn signed_in(name: &str, email: &str) -> (Self, User) {
        let store = Self::new();
        let user = store.insert_account(name, email, "secret", true);
        *store.current.write() = Some(user.clone());
        (store, user)
    }

    /// 确认邮箱，返回账号是否存在
    pub fn confirm_email(&self, email: &str) -> bool {
        match self.accounts.get_mut(&normalize_email(email)) {
            Some(mut account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// 下一次调用该操作时失败
    pub fn fail_next(&self, operation: StoreOperation) {
        self.failures.insert(operation, Failure::Once);
    }

    /// 每次调用该操作都失败，直到 [`recover`](Self::recover)
    pub fn fail_always(&self, operation: StoreOperation) {
        self.failures.insert(operation, Failure::Always);
    }

    pub fn recover(&self, operation: StoreOperation) {
        self.failures.remove(&operation);
    }

    /// 成功写入的记录数
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// 已保存的心情记录（最新的在前）
    pub fn moods_of(&self, user_id: &str) -> Vec<MoodEntry> {
        let mut entries = self
            .moods
            .get(user_id)
            .map(|entries| entries.clone())
            .unwrap_or_default();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }

    /// 已保存的聊天消息（最早的在前）
    pub fn chats_of(&self, user_id: &str) -> Vec<ChatMessage> {
        let mut messages = self
            .chats
            .get(user_id)
            .map(|messages| messages.clone())
            .unwrap_or_default();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        messages
    }

    fn insert_account(&self, name: &str, email: &str, password: &str, confirmed: bool) -> User {
        let name = if name.trim().is_empty() {
            DEFAULT_DISPLAY_NAME
        } else {
            name.trim()
        };
        let user = User::new(uuid::Uuid::new_v4().to_string(), email.trim(), name, Utc::now());
        self.accounts.insert(
            normalize_email(email),
            Account {
                user: user.clone(),
                password: password.to_string(),
                confirmed,
            },
        );
        user
    }

    fn check(&self, operation: StoreOperation) -> StoreResult<()> {
        let failure = self.failures.get(&operation).map(|entry| *entry.value());
        match failure {
            Some(Failure::Once) => {
                self.failures.remove(&operation);
                Err(injected(operation))
            }
            Some(Failure::Always) => Err(injected(operation)),
            None => Ok(()),
        }
    }

    fn require_session(&self) -> StoreResult<User> {
        self.current.read().clone().ok_or(StoreError::NotAuthenticated)
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.clock.lock();
        let now = Utc::now();
        let next = if now > *last {
            now
        } else {
            *last + Duration::milliseconds(1)
        };
        *last = next;
        next
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn injected(operation: StoreOperation) -> StoreError {
    StoreError::Network(format!("injected failure: {:?}", operation))
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn authenticate(&self, email: &str, password: &str) -> StoreResult<User> {
        self.check(StoreOperation::Authenticate)?;
        if password.is_empty() {
            return Err(StoreError::validation(LOGIN_PASSWORD_REQUIRED));
        }

        let account = self
            .accounts
            .get(&normalize_email(email))
            .map(|account| account.clone())
            .filter(|account| account.password == password)
            .ok_or_else(|| StoreError::auth("Invalid login credentials"))?;

        if !account.confirmed {
            return Err(StoreError::EmailNotConfirmed);
        }

        *self.current.write() = Some(account.user.clone());
        debug!(user_id = %account.user.id, "Signed in (memory)");
        Ok(account.user)
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> StoreResult<Registration> {
        self.check(StoreOperation::Register)?;
        if password.is_empty() {
            return Err(StoreError::validation(REGISTER_PASSWORD_REQUIRED));
        }
        if self.accounts.contains_key(&normalize_email(email)) {
            return Err(StoreError::auth("User already registered"));
        }

        let needs_confirmation = self.require_confirmation.load(Ordering::SeqCst);
        let user = self.insert_account(name, email, password, !needs_confirmation);

        if needs_confirmation {
            return Ok(Registration::ConfirmationPending { email: user.email });
        }

        *self.current.write() = Some(user.clone());
        Ok(Registration::SignedIn(user))
    }

    async fn current_session(&self) -> StoreResult<Option<User>> {
        self.check(StoreOperation::CurrentSession)?;
        Ok(self.current.read().clone())
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.check(StoreOperation::SignOut)?;
        *self.current.write() = None;
        Ok(())
    }

    async fn list_moods(&self, user: &User) -> StoreResult<Vec<MoodEntry>> {
        self.check(StoreOperation::ListMoods)?;
        self.require_session()?;
        Ok(self.moods_of(&user.id))
    }

    async fn create_mood(&self, user: &User, mood: MoodType, note: &str) -> StoreResult<MoodEntry> {
        self.check(StoreOperation::CreateMood)?;
        self.require_session()?;

        let entry = MoodEntry {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            mood,
            note: note.to_string(),
            created_at: self.next_timestamp(),
        };
        self.moods
            .entry(user.id.clone())
            .or_default()
            .push(entry.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(entry)
    }

    async fn list_chats(&self, user: &User) -> StoreResult<Vec<ChatMessage>> {
        self.check(StoreOperation::ListChats)?;
        self.require_session()?;
        Ok(self.chats_of(&user.id))
    }

    async fn create_chat(&self, user: &User, role: ChatRole, content: &str) -> StoreResult<ChatMessage> {
        self.check(StoreOperation::CreateChat)?;
        self.require_session()?;

        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            role,
            content: content.to_string(),
            created_at: self.next_timestamp(),
        };
        self.chats
            .entry(user.id.clone())
            .or_default()
            .push(message.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(message)
    }
}
