//! # SupabaseStore Implementation
//!
//! 基于 GoTrue（认证）和 PostgREST（数据表）HTTP 接口的远端存储实现。
//!
//! 使用的数据表：
//! ```text
//! profiles       (id, email, name)
//! mood_entries   (id, user_id, mood, note, created_at)
//! chat_messages  (id, user_id, role, content, created_at)
//! ```

mod wire;

use async_trait::async_trait;
use chrono::Utc;
use mindmenders_core::{
    ChatMessage, ChatRole, MoodEntry, MoodType, NewChatMessage, NewMoodEntry, User,
    DEFAULT_DISPLAY_NAME,
};
use parking_lot::RwLock;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{StoreError, StoreResult};
use crate::session::{AuthSession, SessionCache};
use crate::store::{
    Registration, RemoteStore, LOGIN_PASSWORD_REQUIRED, REGISTER_PASSWORD_REQUIRED,
    REGISTRATION_INCOMPLETE,
};
use wire::{
    AuthUser, PasswordGrant, ProfileRow, ProfileUpsert, RefreshGrant, SignUpMetadata,
    SignUpRequest, SignUpResponse, TokenResponse,
};

/// Supabase 远端存储
pub struct SupabaseStore {
    base_url: String,
    anon_key: String,
    http_client: Client,
    /// 内存中的当前会话
    session: RwLock<Option<AuthSession>>,
    /// 会话持久化（可选）
    cache: Option<SessionCache>,
}

impl SupabaseStore {
    /// 创建新的存储客户端（默认 30 秒超时）
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> StoreResult<Self> {
        Self::with_timeout(base_url, anon_key, Duration::from_secs(30))
    }

    /// 使用自定义超时创建
    pub fn with_timeout(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(StoreError::config("Store anon key is empty"));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::config(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key,
            http_client,
            session: RwLock::new(None),
            cache: None,
        })
    }

    /// 启用会话文件缓存，进程重启后可恢复登录状态
    pub fn with_session_cache(mut self, cache: SessionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// 当前内存中的会话
    pub fn session(&self) -> Option<AuthSession> {
        self.session.read().clone()
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// 为请求附加 apikey 和 Authorization 头
    fn authorize(&self, request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    /// 发送请求并把非 2xx 响应转换为错误
    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = wire::error_message(&body);
        if message.contains("Email not confirmed") {
            return Err(StoreError::EmailNotConfirmed);
        }

        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// 认证接口的 4xx 统一视为认证失败
    fn auth_failure(err: StoreError) -> StoreError {
        match err {
            StoreError::Api { status, message } if (400..500).contains(&status) => {
                StoreError::auth(message)
            }
            other => other,
        }
    }

    async fn remember(&self, session: AuthSession) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save_async(&session).await {
                warn!("Failed to persist session: {}", e);
            }
        }
        *self.session.write() = Some(session);
    }

    fn forget(&self) {
        *self.session.write() = None;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear() {
                warn!("Failed to clear session cache: {}", e);
            }
        }
    }

    /// 获取可用会话，必要时从缓存恢复并刷新 token
    async fn fresh_session(&self) -> Option<AuthSession> {
        let current = self.session.read().clone();
        let current = match current {
            Some(session) => session,
            None => match &self.cache {
                Some(cache) => cache.load_async().await?,
                None => return None,
            },
        };

        if !current.is_expired() {
            if self.session.read().is_none() {
                *self.session.write() = Some(current.clone());
            }
            return Some(current);
        }

        debug!("Access token expired, refreshing session");
        match self.refresh(&current).await {
            Ok(session) => {
                self.remember(session.clone()).await;
                Some(session)
            }
            Err(e) => {
                warn!("Session refresh failed: {}", e);
                self.forget();
                None
            }
        }
    }

    async fn refresh(&self, session: &AuthSession) -> StoreResult<AuthSession> {
        let request = self
            .authorize(self.http_client.post(self.auth_url("token")), None)
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant {
                refresh_token: &session.refresh_token,
            });
        let tokens: TokenResponse = self.send_json(request).await?;

        Ok(AuthSession {
            expires_at: tokens.expires_at(Utc::now()),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: session.user.clone(),
        })
    }

    async fn access_token(&self) -> StoreResult<String> {
        self.fresh_session()
            .await
            .map(|session| session.access_token)
            .ok_or(StoreError::NotAuthenticated)
    }

    async fn fetch_profile_name(&self, access_token: &str, user_id: &str) -> StoreResult<Option<String>> {
        let id_filter = format!("eq.{}", user_id);
        let request = self
            .authorize(self.http_client.get(self.rest_url("profiles")), Some(access_token))
            .query(&[("id", id_filter.as_str()), ("select", "*")]);
        let rows: Vec<ProfileRow> = self.send_json(request).await?;

        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.name)
            .filter(|name| !name.trim().is_empty()))
    }

    async fn upsert_profile(&self, access_token: Option<&str>, user_id: &str, email: &str, name: &str) {
        let request = self
            .authorize(self.http_client.post(self.rest_url("profiles")), access_token)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&ProfileUpsert {
                id: user_id,
                email,
                name,
            });

        if let Err(e) = self.send(request).await {
            warn!("Non-critical: profile sync deferred: {}", e);
        }
    }

    /// 用 token 响应构造会话，显示名依次取 profile、注册元数据、默认值
    async fn session_from_tokens(&self, tokens: TokenResponse, email: &str) -> AuthSession {
        let profile_name = match self.fetch_profile_name(&tokens.access_token, &tokens.user.id).await {
            Ok(name) => name,
            Err(e) => {
                warn!("Profile lookup failed: {}", e);
                None
            }
        };
        let name = profile_name
            .or_else(|| tokens.user.metadata_name())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

        AuthSession {
            expires_at: tokens.expires_at(Utc::now()),
            user: user_from(&tokens.user, email, name),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }

    async fn insert<T, B>(&self, table: &str, body: &B) -> StoreResult<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let token = self.access_token().await?;
        let request = self
            .authorize(self.http_client.post(self.rest_url(table)), Some(&token))
            .header("Prefer", "return=representation")
            .json(body);
        let rows: Vec<T> = self.send_json(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::other(format!("Insert into {} returned no rows", table)))
    }

    async fn list<T: DeserializeOwned>(&self, table: &str, user: &User, order: &str) -> StoreResult<Vec<T>> {
        let token = self.access_token().await?;
        let user_filter = format!("eq.{}", user.id);
        let request = self
            .authorize(self.http_client.get(self.rest_url(table)), Some(&token))
            .query(&[
                ("user_id", user_filter.as_str()),
                ("select", "*"),
                ("order", order),
            ]);
        self.send_json(request).await
    }
}

fn user_from(auth_user: &AuthUser, email: &str, name: String) -> User {
    User {
        id: auth_user.id.clone(),
        email: auth_user.email.clone().unwrap_or_else(|| email.to_string()),
        name,
        created_at: auth_user.created_at,
    }
}

#[async_trait]
impl RemoteStore for SupabaseStore {
    #[instrument(skip(self, password))]
    async fn authenticate(&self, email: &str, password: &str) -> StoreResult<User> {
        if password.is_empty() {
            return Err(StoreError::validation(LOGIN_PASSWORD_REQUIRED));
        }

        let request = self
            .authorize(self.http_client.post(self.auth_url("token")), None)
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password });
        let tokens: TokenResponse = self
            .send_json(request)
            .await
            .map_err(Self::auth_failure)?;

        let session = self.session_from_tokens(tokens, email).await;
        let user = session.user.clone();
        self.remember(session).await;

        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    async fn register(&self, name: &str, email: &str, password: &str) -> StoreResult<Registration> {
        if password.is_empty() {
            return Err(StoreError::validation(REGISTER_PASSWORD_REQUIRED));
        }

        let request = self
            .authorize(self.http_client.post(self.auth_url("signup")), None)
            .json(&SignUpRequest {
                email,
                password,
                data: SignUpMetadata { full_name: name },
            });
        let value: serde_json::Value = self
            .send_json(request)
            .await
            .map_err(Self::auth_failure)?;

        let response = SignUpResponse::parse(value).map_err(|e| {
            warn!("Sign-up response carried no user: {}", e);
            StoreError::auth(REGISTRATION_INCOMPLETE)
        })?;

        match response {
            SignUpResponse::Session(tokens) => {
                self.upsert_profile(Some(&tokens.access_token), &tokens.user.id, email, name)
                    .await;
                let session = AuthSession {
                    expires_at: tokens.expires_at(Utc::now()),
                    user: user_from(&tokens.user, email, name.to_string()),
                    access_token: tokens.access_token,
                    refresh_token: tokens.refresh_token,
                };
                let user = session.user.clone();
                self.remember(session).await;

                info!(user_id = %user.id, "Registered and signed in");
                Ok(Registration::SignedIn(user))
            }
            SignUpResponse::Pending(auth_user) => {
                self.upsert_profile(None, &auth_user.id, email, name).await;

                info!(user_id = %auth_user.id, "Registered, awaiting email confirmation");
                Ok(Registration::ConfirmationPending {
                    email: auth_user.email.unwrap_or_else(|| email.to_string()),
                })
            }
        }
    }

    async fn current_session(&self) -> StoreResult<Option<User>> {
        let Some(session) = self.fresh_session().await else {
            return Ok(None);
        };

        // 刷新显示名，失败时沿用缓存中的用户信息
        let mut user = session.user.clone();
        match self.fetch_profile_name(&session.access_token, &user.id).await {
            Ok(Some(name)) => user.name = name,
            Ok(None) => {}
            Err(e) => debug!("Profile refresh skipped: {}", e),
        }

        Ok(Some(user))
    }

    async fn sign_out(&self) -> StoreResult<()> {
        let session = self.session.read().clone();
        let session = match session {
            Some(session) => Some(session),
            None => match &self.cache {
                Some(cache) => cache.load_async().await,
                None => None,
            },
        };
        self.forget();

        if let Some(session) = session {
            let request = self.authorize(
                self.http_client.post(self.auth_url("logout")),
                Some(&session.access_token),
            );
            // 本地会话已清除，服务端注销失败只记录
            if let Err(e) = self.send(request).await {
                warn!("Remote logout failed: {}", e);
            }
        }

        info!("Signed out");
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn list_moods(&self, user: &User) -> StoreResult<Vec<MoodEntry>> {
        self.list("mood_entries", user, "created_at.desc").await
    }

    #[instrument(skip(self, user, note), fields(user_id = %user.id))]
    async fn create_mood(&self, user: &User, mood: MoodType, note: &str) -> StoreResult<MoodEntry> {
        let body = NewMoodEntry::new(user.id.clone(), mood, Some(note.to_string()));
        self.insert("mood_entries", &body).await
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn list_chats(&self, user: &User) -> StoreResult<Vec<ChatMessage>> {
        self.list("chat_messages", user, "created_at.asc").await
    }

    #[instrument(skip(self, user, content), fields(user_id = %user.id))]
    async fn create_chat(&self, user: &User, role: ChatRole, content: &str) -> StoreResult<ChatMessage> {
        let body = NewChatMessage::new(user.id.clone(), role, content);
        self.insert("chat_messages", &body).await
    }
}
