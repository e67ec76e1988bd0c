//! # MindMenders Store
//!
//! 远端存储客户端：登录/注册、会话恢复，以及心情记录和聊天消息的读写。
//!
//! ## 实现
//!
//! - [`SupabaseStore`]: 基于 HTTP 的 GoTrue + PostgREST 客户端
//! - [`MemoryStore`]: 进程内实现，用于测试和离线演示
//!
//! 两者都实现 [`RemoteStore`] trait。

pub mod error;
pub mod store;
pub mod session;
pub mod supabase;
pub mod memory;

pub use error::{StoreError, StoreResult};
pub use store::{
    Registration, RemoteStore, LOGIN_PASSWORD_REQUIRED, REGISTER_PASSWORD_REQUIRED,
    REGISTRATION_INCOMPLETE,
};
pub use session::{AuthSession, SessionCache};
pub use supabase::SupabaseStore;
pub use memory::{MemoryStore, StoreOperation};
