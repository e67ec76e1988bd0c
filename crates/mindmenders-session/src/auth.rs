//! # Auth Gate
//!
//! 登录状态机：
//!
//! ```text
//! Loading ──initialize──▶ Authenticated(User)
//!    │                        ▲        │
//!    ▼                        │        │ sign_out
//! SignedOut { notice } ──sign_in/register──┘
//!    │
//!    └──register（需确认邮箱）──▶ PendingConfirmation { email }
//! ```

use std::sync::Arc;

use mindmenders_core::User;
use mindmenders_store::{Registration, RemoteStore, StoreError};
use parking_lot::RwLock;
use tracing::{info, warn};

/// 登录表单字段缺失
pub const CREDENTIALS_REQUIRED: &str = "Please enter your credentials.";

/// 注册表单字段缺失
pub const FIELDS_REQUIRED: &str = "Complete all fields to proceed.";

/// 注册成功但需要邮件确认
pub const CONFIRMATION_SENT: &str =
    "Success! Please check your email for a confirmation link to complete your registration.";

/// 认证状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// 正在查询已有会话
    Loading,
    /// 未登录，可能带有一条内联提示
    SignedOut { notice: Option<String> },
    /// 注册完成，等待邮件确认
    PendingConfirmation { email: String },
    Authenticated(User),
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// 需要展示给用户的提示
    pub fn notice(&self) -> Option<&str> {
        match self {
            Self::SignedOut { notice } => notice.as_deref(),
            Self::PendingConfirmation { .. } => Some(CONFIRMATION_SENT),
            _ => None,
        }
    }

    fn signed_out(notice: impl Into<String>) -> Self {
        Self::SignedOut {
            notice: Some(notice.into()),
        }
    }
}

/// 登录 / 注册表单
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AuthForm {
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn registration(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn validate_login(&self) -> Result<(), &'static str> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(CREDENTIALS_REQUIRED);
        }
        Ok(())
    }

    fn validate_registration(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty() {
            return Err(FIELDS_REQUIRED);
        }
        Ok(())
    }
}

/// 认证门
pub struct AuthGate {
    store: Arc<dyn RemoteStore>,
    state: RwLock<AuthState>,
}

impl AuthGate {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            state: RwLock::new(AuthState::Loading),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.read(), AuthState::Authenticated(_))
    }

    /// 查询已有会话
    pub async fn initialize(&self) -> AuthState {
        let state = match self.store.current_session().await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "Existing session restored");
                AuthState::Authenticated(user)
            }
            Ok(None) => AuthState::SignedOut { notice: None },
            Err(e) => {
                warn!("Session lookup failed, treating as signed out: {}", e);
                AuthState::SignedOut { notice: None }
            }
        };
        self.set(state)
    }

    pub async fn sign_in(&self, form: &AuthForm) -> AuthState {
        if let Err(notice) = form.validate_login() {
            return self.set(AuthState::signed_out(notice));
        }

        let state = match self.store.authenticate(form.email.trim(), &form.password).await {
            Ok(user) => AuthState::Authenticated(user),
            Err(e) => failure_state(e),
        };
        self.set(state)
    }

    pub async fn register(&self, form: &AuthForm) -> AuthState {
        if let Err(notice) = form.validate_registration() {
            return self.set(AuthState::signed_out(notice));
        }

        let result = self
            .store
            .register(form.name.trim(), form.email.trim(), &form.password)
            .await;
        let state = match result {
            Ok(Registration::SignedIn(user)) => AuthState::Authenticated(user),
            Ok(Registration::ConfirmationPending { email }) => {
                info!("Registration awaiting email confirmation");
                AuthState::PendingConfirmation { email }
            }
            Err(e) => failure_state(e),
        };
        self.set(state)
    }

    pub async fn sign_out(&self) -> AuthState {
        if let Err(e) = self.store.sign_out().await {
            warn!("Sign out failed: {}", e);
        }
        self.set(AuthState::SignedOut { notice: None })
    }

    fn set(&self, state: AuthState) -> AuthState {
        *self.state.write() = state.clone();
        state
    }
}

fn failure_state(err: StoreError) -> AuthState {
    if !err.is_user_facing() {
        warn!("Authentication request failed: {}", err);
    }
    AuthState::signed_out(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmenders_store::{MemoryStore, StoreOperation};

    fn gate_for(store: MemoryStore) -> (Arc<MemoryStore>, AuthGate) {
        let store = Arc::new(store);
        let gate = AuthGate::new(store.clone());
        (store, gate)
    }

    #[tokio::test]
    async fn test_initialize() {
        let (_store, gate) = gate_for(MemoryStore::new());
        assert_eq!(gate.state(), AuthState::Loading);
        assert_eq!(gate.initialize().await, AuthState::SignedOut { notice: None });

        let (signed_in, user) = MemoryStore::signed_in("Sam", "sam@example.com");
        let (_store, gate) = gate_for(signed_in);
        assert_eq!(gate.initialize().await, AuthState::Authenticated(user));
        assert!(gate.is_authenticated());
    }

    #[tokio::test]
    async fn test_initialize_store_error_is_signed_out() {
        let (store, gate) = gate_for(MemoryStore::signed_in("Sam", "sam@example.com").0);
        store.fail_next(StoreOperation::CurrentSession);

        assert_eq!(gate.initialize().await, AuthState::SignedOut { notice: None });
    }

    #[tokio::test]
    async fn test_sign_in_validation() {
        let (store, gate) = gate_for(MemoryStore::new().with_user("Sam", "sam@example.com", "pw"));

        let state = gate.sign_in(&AuthForm::login(" ", "pw")).await;
        assert_eq!(state.notice(), Some(CREDENTIALS_REQUIRED));
        let state = gate.sign_in(&AuthForm::login("sam@example.com", "")).await;
        assert_eq!(state.notice(), Some(CREDENTIALS_REQUIRED));
        assert!(store.current_session().await.unwrap().is_none());

        let state = gate.sign_in(&AuthForm::login("sam@example.com", "pw")).await;
        assert_eq!(state.user().map(|u| u.name.as_str()), Some("Sam"));
    }

    #[tokio::test]
    async fn test_sign_in_failures_are_inline() {
        let (_store, gate) = gate_for(
            MemoryStore::new()
                .requiring_confirmation()
                .with_user("Sam", "sam@example.com", "pw"),
        );

        let state = gate.sign_in(&AuthForm::login("sam@example.com", "wrong")).await;
        assert_eq!(state.notice(), Some("Invalid login credentials"));
        assert!(!gate.is_authenticated());
    }

    #[tokio::test]
    async fn test_unconfirmed_email_notice() {
        let (store, gate) = gate_for(MemoryStore::new().requiring_confirmation());
        store.register("Ana", "ana@example.com", "pw").await.unwrap();

        let state = gate.sign_in(&AuthForm::login("ana@example.com", "pw")).await;
        assert_eq!(
            state.notice().map(str::to_string),
            Some(StoreError::EmailNotConfirmed.to_string())
        );
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (_store, gate) = gate_for(MemoryStore::new());

        let state = gate
            .register(&AuthForm::registration("", "ana@example.com", "pw"))
            .await;
        assert_eq!(state.notice(), Some(FIELDS_REQUIRED));
    }

    #[tokio::test]
    async fn test_register_pending_confirmation() {
        let (_store, gate) = gate_for(MemoryStore::new().requiring_confirmation());

        let state = gate
            .register(&AuthForm::registration("Ana", "ana@example.com", "pw"))
            .await;

        assert_eq!(
            state,
            AuthState::PendingConfirmation {
                email: "ana@example.com".to_string()
            }
        );
        assert_eq!(state.notice(), Some(CONFIRMATION_SENT));
        assert!(!gate.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_and_sign_out() {
        let (store, gate) = gate_for(MemoryStore::new());

        let state = gate
            .register(&AuthForm::registration("Ana Lee", "ana@example.com", "pw"))
            .await;
        assert_eq!(gate.user().map(|u| u.name), Some("Ana Lee".to_string()));
        assert!(matches!(state, AuthState::Authenticated(_)));

        store.fail_next(StoreOperation::SignOut);
        assert_eq!(gate.sign_out().await, AuthState::SignedOut { notice: None });
        assert!(gate.user().is_none());
    }
}
