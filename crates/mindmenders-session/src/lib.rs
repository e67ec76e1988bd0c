//! # MindMenders Session
//!
//! 客户端编排层，位于远端存储和 AI 补全客户端之上。
//!
//! ## 组件
//!
//! - [`ChatSession`]: 单个用户的聊天轮次编排（危机检测、乐观追加、失败兜底）
//! - [`MoodJournal`] / [`MoodCheckIn`]: 心情记录缓存和打卡表单
//! - [`AuthGate`]: 登录、注册、退出的状态机
//! - [`App`]: 显式的应用状态对象，持有登录状态、当前标签页和用户工作区
//!
//! 本地镜像使用 `parking_lot::RwLock`，从不跨 `.await` 持有；
//! 远端存储是唯一的数据来源。

pub mod error;
pub mod chat;
pub mod mood;
pub mod auth;
pub mod app;

pub use error::{AppError, SessionError, SessionResult};
pub use chat::{ChatEvent, ChatSession, SyncState, TranscriptEntry, TurnOutcome};
pub use mood::{CheckInError, MoodCheckIn, MoodJournal};
pub use auth::{
    AuthForm, AuthGate, AuthState, CONFIRMATION_SENT, CREDENTIALS_REQUIRED, FIELDS_REQUIRED,
};
pub use app::{App, Tab, Workspace};
