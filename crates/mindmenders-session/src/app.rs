//! # Application State
//!
//! [`App`] 持有认证门、当前标签页，以及登录后的用户工作区。
//! 未登录时不存在工作区，导航会失败。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use mindmenders_core::User;
use mindmenders_llm::CompletionClient;
use mindmenders_store::RemoteStore;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::auth::{AuthForm, AuthGate, AuthState};
use crate::chat::ChatSession;
use crate::error::AppError;
use crate::mood::MoodJournal;

/// 导航标签页
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Chat,
    MoodCheck,
    Exercises,
    History,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Dashboard,
        Tab::Chat,
        Tab::MoodCheck,
        Tab::Exercises,
        Tab::History,
        Tab::Settings,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Chat => "AI Companion",
            Tab::MoodCheck => "Mood Check-in",
            Tab::Exercises => "Exercises",
            Tab::History => "History",
            Tab::Settings => "Settings",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tab {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "dashboard" | "home" => Ok(Tab::Dashboard),
            "chat" | "aicompanion" => Ok(Tab::Chat),
            "mood" | "moodcheck" | "moodcheckin" => Ok(Tab::MoodCheck),
            "exercises" => Ok(Tab::Exercises),
            "history" => Ok(Tab::History),
            "settings" => Ok(Tab::Settings),
            _ => Err(AppError::UnknownTab(s.to_string())),
        }
    }
}

/// 登录用户的工作区
pub struct Workspace {
    pub chat: ChatSession,
    pub journal: MoodJournal,
}

impl Workspace {
    fn new(user: User, store: Arc<dyn RemoteStore>, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            chat: ChatSession::new(user.clone(), store.clone(), client),
            journal: MoodJournal::new(user, store),
        }
    }

    pub fn user(&self) -> &User {
        self.chat.user()
    }

    /// 并发刷新心情和聊天镜像，失败只记录日志
    pub async fn refresh(&self) {
        let (moods, chats) = tokio::join!(self.journal.refresh(), self.chat.load_history());
        if let Err(e) = moods {
            warn!("Mood refresh failed: {}", e);
        }
        if let Err(e) = chats {
            warn!("Chat refresh failed: {}", e);
        }
    }
}

/// 应用状态
pub struct App {
    store: Arc<dyn RemoteStore>,
    client: Arc<dyn CompletionClient>,
    gate: AuthGate,
    tab: RwLock<Tab>,
    workspace: RwLock<Option<Arc<Workspace>>>,
}

impl App {
    pub fn new(store: Arc<dyn RemoteStore>, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            gate: AuthGate::new(store.clone()),
            store,
            client,
            tab: RwLock::new(Tab::Dashboard),
            workspace: RwLock::new(None),
        }
    }

    pub fn auth(&self) -> &AuthGate {
        &self.gate
    }

    pub fn tab(&self) -> Tab {
        *self.tab.read()
    }

    pub fn workspace(&self) -> Option<Arc<Workspace>> {
        self.workspace.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.gate.user()
    }

    /// 恢复已有会话
    pub async fn initialize(&self) -> AuthState {
        let state = self.gate.initialize().await;
        self.enter(&state).await;
        state
    }

    pub async fn sign_in(&self, form: &AuthForm) -> AuthState {
        let state = self.gate.sign_in(form).await;
        self.enter(&state).await;
        state
    }

    pub async fn register(&self, form: &AuthForm) -> AuthState {
        let state = self.gate.register(form).await;
        self.enter(&state).await;
        state
    }

    /// 退出登录，丢弃工作区并回到首页
    pub async fn sign_out(&self) -> AuthState {
        let state = self.gate.sign_out().await;
        *self.workspace.write() = None;
        *self.tab.write() = Tab::Dashboard;
        state
    }

    /// 切换标签页并刷新数据
    pub async fn navigate(&self, tab: Tab) -> Result<Arc<Workspace>, AppError> {
        let workspace = self
            .workspace()
            .filter(|_| self.gate.is_authenticated())
            .ok_or(AppError::NotAuthenticated)?;

        *self.tab.write() = tab;
        debug!(tab = %tab, "Navigated");

        workspace.refresh().await;
        Ok(workspace)
    }

    /// 登录成功时创建工作区（同一用户保留已有工作区）
    async fn enter(&self, state: &AuthState) {
        let Some(user) = state.user() else {
            *self.workspace.write() = None;
            return;
        };

        let existing = self
            .workspace()
            .filter(|workspace| workspace.user().id == user.id);
        let workspace = match existing {
            Some(workspace) => workspace,
            None => {
                info!(user_id = %user.id, "Opening workspace");
                let workspace = Arc::new(Workspace::new(
                    user.clone(),
                    self.store.clone(),
                    self.client.clone(),
                ));
                *self.workspace.write() = Some(workspace.clone());
                *self.tab.write() = Tab::Dashboard;
                workspace
            }
        };

        workspace.refresh().await;
    }
}
