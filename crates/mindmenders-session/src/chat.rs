//! # Chat Session
//!
//! 一个聊天轮次的流程：
//!
//! ```text
//! 输入校验 ─▶ 危机检测 ─▶ 乐观追加用户消息 ─▶ 保存用户消息
//!                                              │
//!            追加 AI 回复 ◀─ 保存 AI 回复 ◀─ 调用补全客户端
//! ```
//!
//! 第 3 到 5 步任何一步失败，都会追加一条本地兜底回复（不保存），
//! 错误只记录日志，不向调用方传播。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mindmenders_core::{
    detect_crisis, ChatMessage, ChatRole, HistoryTurn, User, CHAT_FALLBACK_REPLY,
    COMPLETION_APOLOGY, HISTORY_WINDOW,
};
use mindmenders_llm::CompletionClient;
use mindmenders_observability::chat_turn_span;
use mindmenders_store::RemoteStore;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Instrument};

use crate::error::SessionResult;

/// 本地消息与远端存储的同步状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// 已追加到本地，等待保存
    Pending,
    /// 已保存，id 和时间戳来自存储
    Synced,
    /// 保存失败，只存在于本地
    LocalOnly,
}

/// 聊天记录中的一条消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub message: ChatMessage,
    pub sync: SyncState,
}

impl TranscriptEntry {
    fn new(message: ChatMessage, sync: SyncState) -> Self {
        Self { message, sync }
    }
}

/// 推送给界面的事件，每次追加立即发送
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Appended(TranscriptEntry),
    /// 本地条目被存储记录替换（或标记为 LocalOnly）
    Reconciled {
        local_id: String,
        entry: TranscriptEntry,
    },
    /// AI 正在回复
    Typing(bool),
    /// 危机提示已显示
    CrisisNotice,
}

/// `send` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// 空输入或上一轮尚未结束，未做任何事
    Ignored,
    /// 用户消息和 AI 回复都已保存
    Completed,
    /// 追加了兜底回复
    Fallback,
}

/// 退出作用域时清除忙碌标志
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 单个用户的聊天会话
pub struct ChatSession {
    user: User,
    store: Arc<dyn RemoteStore>,
    client: Arc<dyn CompletionClient>,
    transcript: RwLock<Vec<TranscriptEntry>>,
    busy: AtomicBool,
    crisis_notice: AtomicBool,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ChatEvent>>>,
}

impl ChatSession {
    pub fn new(user: User, store: Arc<dyn RemoteStore>, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            user,
            store,
            client,
            transcript: RwLock::new(Vec::new()),
            busy: AtomicBool::new(false),
            crisis_notice: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// 订阅聊天事件
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ChatEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// 当前聊天记录的快照
    pub fn messages(&self) -> Vec<TranscriptEntry> {
        self.transcript.read().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn crisis_notice_active(&self) -> bool {
        self.crisis_notice.load(Ordering::Acquire)
    }

    pub fn dismiss_crisis_notice(&self) {
        self.crisis_notice.store(false, Ordering::Release);
    }

    /// 从存储加载聊天历史，替换本地镜像，返回消息数
    pub async fn load_history(&self) -> SessionResult<usize> {
        let messages = self.store.list_chats(&self.user).await?;
        let count = messages.len();

        let mut transcript = self.transcript.write();
        // 未同步的本地条目保留在末尾
        let unsynced: Vec<TranscriptEntry> = transcript
            .iter()
            .filter(|entry| entry.sync != SyncState::Synced)
            .cloned()
            .collect();
        *transcript = messages
            .into_iter()
            .map(|message| TranscriptEntry::new(message, SyncState::Synced))
            .collect();
        transcript.extend(unsynced);
        drop(transcript);

        debug!(user_id = %self.user.id, count, "Chat history loaded");
        Ok(count)
    }

    /// 发送一条用户消息并等待回复
    pub async fn send(&self, text: &str) -> TurnOutcome {
        if text.trim().is_empty() {
            return TurnOutcome::Ignored;
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Chat turn already in flight, ignoring input");
            return TurnOutcome::Ignored;
        }
        let _busy = BusyGuard(&self.busy);

        if detect_crisis(text) {
            warn!(user_id = %self.user.id, "Crisis language detected, showing support notice");
            self.crisis_notice.store(true, Ordering::Release);
            self.emit(ChatEvent::CrisisNotice);
        }

        // 历史取自本轮用户消息追加之前
        let history = self.recent_history();

        self.emit(ChatEvent::Typing(true));
        let outcome = self
            .run_turn(text, &history)
            .instrument(chat_turn_span(&self.user.id))
            .await;
        self.emit(ChatEvent::Typing(false));

        outcome
    }

    async fn run_turn(&self, text: &str, history: &[HistoryTurn]) -> TurnOutcome {
        let local = ChatMessage::local(self.user.id.clone(), ChatRole::User, text);
        let local_id = local.id.clone();
        self.append(TranscriptEntry::new(local, SyncState::Pending));

        match self.store.create_chat(&self.user, ChatRole::User, text).await {
            Ok(saved) => self.reconcile(&local_id, saved),
            Err(e) => {
                warn!("Failed to save user message: {}", e);
                self.mark_local_only(&local_id);
                return self.fallback(CHAT_FALLBACK_REPLY);
            }
        }

        let reply = match self.client.complete(history, text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(provider = self.client.provider_id(), "Completion failed: {}", e);
                return self.fallback(COMPLETION_APOLOGY);
            }
        };

        match self.store.create_chat(&self.user, ChatRole::Ai, &reply).await {
            Ok(saved) => {
                self.append(TranscriptEntry::new(saved, SyncState::Synced));
                info!(history_len = history.len(), "Chat turn completed");
                TurnOutcome::Completed
            }
            Err(e) => {
                warn!("Failed to save AI reply: {}", e);
                self.fallback(CHAT_FALLBACK_REPLY)
            }
        }
    }

    fn recent_history(&self) -> Vec<HistoryTurn> {
        let transcript = self.transcript.read();
        let start = transcript.len().saturating_sub(HISTORY_WINDOW);
        transcript[start..]
            .iter()
            .map(|entry| entry.message.to_turn())
            .collect()
    }

    fn fallback(&self, reply: &str) -> TurnOutcome {
        let message = ChatMessage::local(self.user.id.clone(), ChatRole::Ai, reply);
        self.append(TranscriptEntry::new(message, SyncState::LocalOnly));
        TurnOutcome::Fallback
    }

    fn append(&self, entry: TranscriptEntry) {
        {
            let mut transcript = self.transcript.write();
            if !transcript.iter().any(|e| e.message.id == entry.message.id) {
                transcript.push(entry.clone());
            }
        }
        self.emit(ChatEvent::Appended(entry));
    }

    fn reconcile(&self, local_id: &str, saved: ChatMessage) {
        self.replace(local_id, TranscriptEntry::new(saved, SyncState::Synced));
    }

    fn mark_local_only(&self, local_id: &str) {
        let entry = self
            .transcript
            .read()
            .iter()
            .find(|entry| entry.message.id == local_id)
            .map(|entry| TranscriptEntry::new(entry.message.clone(), SyncState::LocalOnly));

        if let Some(entry) = entry {
            self.replace(local_id, entry);
        }
    }

    fn replace(&self, local_id: &str, entry: TranscriptEntry) {
        {
            let mut transcript = self.transcript.write();
            // 轮次进行中重新加载的历史可能已包含存储记录
            transcript.retain(|e| e.message.id == local_id || e.message.id != entry.message.id);
            match transcript.iter_mut().find(|e| e.message.id == local_id) {
                Some(slot) => *slot = entry.clone(),
                None => transcript.push(entry.clone()),
            }
        }
        self.emit(ChatEvent::Reconciled {
            local_id: local_id.to_string(),
            entry,
        });
    }

    fn emit(&self, event: ChatEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
