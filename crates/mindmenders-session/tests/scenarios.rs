//! End-to-end flows through `App` against the in-memory store.

use std::sync::Arc;

use mindmenders_core::{ChatRole, MoodType, COMPLETION_APOLOGY};
use mindmenders_llm::testing::ScriptedClient;
use mindmenders_llm::LLMError;
use mindmenders_session::{
    App, AuthForm, AuthState, MoodCheckIn, SyncState, Tab, TurnOutcome,
};
use mindmenders_store::MemoryStore;
use tokio_test::assert_ok;

async fn signed_in_app(client: ScriptedClient) -> (Arc<MemoryStore>, Arc<ScriptedClient>, App) {
    let store = Arc::new(MemoryStore::new().with_user("Sam Rivera", "sam@example.com", "pw"));
    let client = Arc::new(client);
    let app = App::new(store.clone(), client.clone());

    let state = app.sign_in(&AuthForm::login("sam@example.com", "pw")).await;
    assert!(matches!(state, AuthState::Authenticated(_)));
    (store, client, app)
}

#[tokio::test]
async fn anxious_check_in_tops_history() {
    let (store, _client, app) = signed_in_app(ScriptedClient::new()).await;
    let workspace = assert_ok!(app.navigate(Tab::MoodCheck).await);

    let check_in = MoodCheckIn::new();
    check_in.select(MoodType::Happy);
    assert_ok!(check_in.submit(&workspace.journal).await);
    check_in.select(MoodType::Anxious);
    check_in.set_note("work stress");
    assert_ok!(check_in.submit(&workspace.journal).await);

    let workspace = assert_ok!(app.navigate(Tab::History).await);
    let entries = workspace.journal.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].mood, MoodType::Anxious);
    assert_eq!(entries[0].note, "work stress");
    assert_eq!(entries[1].note, "");
    assert_eq!(store.write_count(), 2);
}

#[tokio::test]
async fn crisis_message_goes_through_pipeline() {
    let (store, client, app) =
        signed_in_app(ScriptedClient::new().with_reply("I'm really glad you told me.")).await;
    let workspace = assert_ok!(app.navigate(Tab::Chat).await);

    let outcome = workspace.chat.send("I want to kill myself").await;

    assert_eq!(outcome, TurnOutcome::Completed);
    assert!(workspace.chat.crisis_notice_active());
    assert_eq!(client.calls()[0].prompt, "I want to kill myself");

    let user = app.user().unwrap();
    let saved = store.chats_of(&user.id);
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].role, ChatRole::User);
    assert_eq!(saved[1].role, ChatRole::Ai);
}

#[tokio::test]
async fn completion_failure_adds_single_fallback() {
    let (_store, _client, app) = signed_in_app(
        ScriptedClient::new()
            .with_reply("Hello Sam.")
            .with_error(LLMError::RateLimited { retry_after: 60 }),
    )
    .await;
    let workspace = assert_ok!(app.navigate(Tab::Chat).await);

    assert_eq!(workspace.chat.send("hi").await, TurnOutcome::Completed);
    assert_eq!(workspace.chat.send("are you there?").await, TurnOutcome::Fallback);

    let messages = workspace.chat.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2].message.content, "are you there?");
    assert_eq!(messages[2].sync, SyncState::Synced);
    assert_eq!(messages[3].message.content, COMPLETION_APOLOGY);
    assert!(!workspace.chat.is_busy());

    // 重新加载后只剩已保存的三条
    let workspace = assert_ok!(app.navigate(Tab::Chat).await);
    assert_eq!(workspace.chat.messages().len(), 3);
}

#[tokio::test]
async fn registration_without_session_waits_for_confirmation() {
    let store = Arc::new(MemoryStore::new().requiring_confirmation());
    let app = App::new(store.clone(), Arc::new(ScriptedClient::new()));

    let state = app
        .register(&AuthForm::registration("Ana Lee", "ana@example.com", "pw"))
        .await;
    assert_eq!(
        state,
        AuthState::PendingConfirmation {
            email: "ana@example.com".to_string()
        }
    );
    assert!(app.user().is_none());

    assert!(store.confirm_email("ana@example.com"));
    let state = app.sign_in(&AuthForm::login("ana@example.com", "pw")).await;
    assert_eq!(state.user().map(|u| u.first_name()), Some("Ana"));
    assert!(app.workspace().is_some());
}
