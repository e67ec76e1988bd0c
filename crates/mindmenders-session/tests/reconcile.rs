//! Store writes that commit before they answer, so a concurrent reload
//! sees the row while the local entry is still pending.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mindmenders_core::{ChatMessage, ChatRole, MoodEntry, MoodType, User};
use mindmenders_llm::testing::ScriptedClient;
use mindmenders_session::{ChatSession, MoodJournal, SyncState, TurnOutcome};
use mindmenders_store::{MemoryStore, Registration, RemoteStore, StoreResult};
use tokio_test::assert_ok;

const WRITE_LATENCY: Duration = Duration::from_millis(50);

struct LateAcks {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl RemoteStore for LateAcks {
    async fn authenticate(&self, email: &str, password: &str) -> StoreResult<User> {
        self.inner.authenticate(email, password).await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> StoreResult<Registration> {
        self.inner.register(name, email, password).await
    }

    async fn current_session(&self) -> StoreResult<Option<User>> {
        self.inner.current_session().await
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.inner.sign_out().await
    }

    async fn list_moods(&self, user: &User) -> StoreResult<Vec<MoodEntry>> {
        self.inner.list_moods(user).await
    }

    async fn create_mood(&self, user: &User, mood: MoodType, note: &str) -> StoreResult<MoodEntry> {
        let saved = self.inner.create_mood(user, mood, note).await;
        tokio::time::sleep(WRITE_LATENCY).await;
        saved
    }

    async fn list_chats(&self, user: &User) -> StoreResult<Vec<ChatMessage>> {
        self.inner.list_chats(user).await
    }

    async fn create_chat(&self, user: &User, role: ChatRole, content: &str) -> StoreResult<ChatMessage> {
        let saved = self.inner.create_chat(user, role, content).await;
        tokio::time::sleep(WRITE_LATENCY).await;
        saved
    }
}

fn late_store() -> (Arc<MemoryStore>, Arc<LateAcks>, User) {
    let (store, user) = MemoryStore::signed_in("Sam Rivera", "sam@example.com");
    let store = Arc::new(store);
    let late = Arc::new(LateAcks { inner: store.clone() });
    (store, late, user)
}

fn assert_unique<'a>(ids: impl Iterator<Item = &'a str>) {
    let mut ids: Vec<&str> = ids.collect();
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total, "duplicate ids in mirror");
}

#[tokio::test]
async fn mood_refresh_during_save_keeps_one_copy() {
    let (_store, late, user) = late_store();
    let journal = MoodJournal::new(user, late);

    let (saved, refreshed) = tokio::join!(
        journal.record(MoodType::Calm, Some("tea")),
        journal.refresh()
    );
    let saved = assert_ok!(saved);
    assert_eq!(assert_ok!(refreshed), 1);

    let entries = journal.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0], saved);
    assert_unique(entries.iter().map(|e| e.id.as_str()));
}

#[tokio::test]
async fn history_reload_during_turn_keeps_one_copy() {
    let (store, late, user) = late_store();
    let chat = ChatSession::new(user.clone(), late, Arc::new(ScriptedClient::new().with_reply("ok")));

    let (outcome, loaded) = tokio::join!(chat.send("hello"), chat.load_history());
    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(assert_ok!(loaded), 1);

    let messages = chat.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message.content, "hello");
    assert_eq!(messages[1].message.content, "ok");
    assert!(messages.iter().all(|entry| entry.sync == SyncState::Synced));
    assert_unique(messages.iter().map(|e| e.message.id.as_str()));
    assert_eq!(store.chats_of(&user.id).len(), 2);
}

#[tokio::test]
async fn second_send_during_turn_is_ignored() {
    let (store, late, user) = late_store();
    let client = Arc::new(ScriptedClient::new().with_reply("first reply").with_reply("second reply"));
    let chat = ChatSession::new(user, late, client.clone());

    let (first, second) = tokio::join!(chat.send("a"), chat.send("b"));
    assert_eq!(first, TurnOutcome::Completed);
    assert_eq!(second, TurnOutcome::Ignored);

    assert_eq!(store.write_count(), 2);
    assert_eq!(client.calls().len(), 1);
    let messages = chat.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message.content, "a");
    assert!(!chat.is_busy());
}
