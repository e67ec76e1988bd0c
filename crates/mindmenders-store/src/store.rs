//! # Store Trait
//!
//! 定义远端存储的核心操作。

use async_trait::async_trait;
use mindmenders_core::{ChatMessage, ChatRole, MoodEntry, MoodType, User};

use crate::error::StoreResult;

/// 登录时密码为空的提示
pub const LOGIN_PASSWORD_REQUIRED: &str = "A secure password is required to enter the sanctuary.";

/// 注册时密码为空的提示
pub const REGISTER_PASSWORD_REQUIRED: &str = "A secure password is required for your protection.";

/// 注册响应中没有用户时的提示
pub const REGISTRATION_INCOMPLETE: &str = "Registration could not be completed at this time.";

/// 注册结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// 注册后立即获得可用会话
    SignedIn(User),
    /// 需要先通过邮件确认
    ConfirmationPending { email: String },
}

/// 远端存储 trait
///
/// 列表操作按创建时间排序：心情记录倒序，聊天消息正序。
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// 邮箱密码登录
    async fn authenticate(&self, email: &str, password: &str) -> StoreResult<User>;

    /// 注册新用户
    async fn register(&self, name: &str, email: &str, password: &str) -> StoreResult<Registration>;

    /// 获取当前会话的用户（没有会话时返回 None）
    async fn current_session(&self) -> StoreResult<Option<User>>;

    /// 退出登录
    async fn sign_out(&self) -> StoreResult<()>;

    /// 列出用户的心情记录（最新的在前）
    async fn list_moods(&self, user: &User) -> StoreResult<Vec<MoodEntry>>;

    /// 创建心情记录
    async fn create_mood(&self, user: &User, mood: MoodType, note: &str) -> StoreResult<MoodEntry>;

    /// 列出用户的聊天消息（最早的在前）
    async fn list_chats(&self, user: &User) -> StoreResult<Vec<ChatMessage>>;

    /// 创建聊天消息
    async fn create_chat(&self, user: &User, role: ChatRole, content: &str) -> StoreResult<ChatMessage>;
}
