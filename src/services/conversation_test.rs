use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

use super::*;
use crate::llm::types::LlmError;

// =========================================================================
// Mocks
// =========================================================================

/// Replies from a script and records every history it was sent.
struct MockChat {
    replies: Mutex<Vec<Result<String, LlmError>>>,
    histories: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChat {
    fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self { replies: Mutex::new(replies), histories: Mutex::new(Vec::new()) }
    }

    fn calls(&self) -> usize {
        self.histories.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl CompletionChat for MockChat {
    async fn complete(&self, history: &[ChatMessage]) -> Result<String, LlmError> {
        self.histories.lock().unwrap().push(history.to_vec());
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() { Ok("ok".into()) } else { replies.remove(0) }
    }
}

/// Holds each request open until the test releases it.
struct GatedChat {
    reply: String,
    started: Notify,
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedChat {
    fn new(reply: &str) -> Self {
        Self { reply: reply.into(), started: Notify::new(), gate: Notify::new(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait::async_trait]
impl CompletionChat for GatedChat {
    async fn complete(&self, _history: &[ChatMessage]) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.gate.notified().await;
        Ok(self.reply.clone())
    }
}

/// Never answers the first request; later ones reply "ok".
struct StallFirstChat {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl CompletionChat for StallFirstChat {
    async fn complete(&self, _history: &[ChatMessage]) -> Result<String, LlmError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        Ok("ok".into())
    }
}

fn texts(store: &ConversationStore) -> Vec<(TurnRole, String)> {
    store
        .turns()
        .into_iter()
        .map(|t| (t.role, t.text))
        .collect()
}

// =========================================================================
// Initial state / reset
// =========================================================================

#[test]
fn new_store_has_only_greeting() {
    let store = ConversationStore::new(Arc::new(MockChat::new(vec![])));
    let snapshot = store.snapshot();
    assert_eq!(snapshot.turns.len(), 1);
    assert_eq!(snapshot.turns[0].role, TurnRole::Assistant);
    assert_eq!(snapshot.turns[0].text, GREETING);
    assert!(!snapshot.pending);
    assert_eq!(snapshot.last_error, None);
}

#[tokio::test]
async fn reset_restores_initial_state_after_error() {
    let chat = Arc::new(MockChat::new(vec![Ok("Great goal!".into()), Err(LlmError::ApiRequest("down".into()))]));
    let store = ConversationStore::new(chat);
    store.append("I want to lose fat").await;
    store.append("and gain muscle").await;
    assert!(store.last_error().is_some());
    assert_eq!(store.turns().len(), 4);

    store.reset();
    let snapshot = store.snapshot();
    assert_eq!(snapshot.turns.len(), 1);
    assert_eq!(snapshot.turns[0].text, GREETING);
    assert!(!snapshot.pending);
    assert_eq!(snapshot.last_error, None);
}

// =========================================================================
// append
// =========================================================================

#[tokio::test]
async fn append_then_reply_in_order() {
    let chat = Arc::new(MockChat::new(vec![Ok("Great goal!".into())]));
    let store = ConversationStore::new(chat.clone());
    assert!(store.append("  I want to lose fat ").await);
    assert_eq!(
        texts(&store),
        vec![
            (TurnRole::Assistant, GREETING.to_string()),
            (TurnRole::User, "I want to lose fat".to_string()),
            (TurnRole::Assistant, "Great goal!".to_string()),
        ]
    );
    assert!(!store.is_pending());
    assert_eq!(store.last_error(), None);
}

#[tokio::test]
async fn history_excludes_greeting_and_maps_roles() {
    let chat = Arc::new(MockChat::new(vec![Ok("Great goal!".into()), Ok("Try intervals.".into())]));
    let store = ConversationStore::new(chat.clone());
    store.append("I want to lose fat").await;
    store.append("What cardio?").await;

    let histories = chat.histories.lock().unwrap();
    assert_eq!(histories[0], vec![ChatMessage::new(Role::User, "I want to lose fat")]);
    assert_eq!(
        histories[1],
        vec![
            ChatMessage::new(Role::User, "I want to lose fat"),
            ChatMessage::new(Role::Assistant, "Great goal!"),
            ChatMessage::new(Role::User, "What cardio?"),
        ]
    );
}

#[tokio::test]
async fn blank_text_is_noop() {
    let chat = Arc::new(MockChat::new(vec![]));
    let store = ConversationStore::new(chat.clone());
    assert!(!store.append("   \n").await);
    assert_eq!(store.turns().len(), 1);
    assert_eq!(chat.calls(), 0);
}

#[tokio::test]
async fn failure_records_error_without_assistant_turn() {
    let chat = Arc::new(MockChat::new(vec![Err(LlmError::ApiRequest("connection reset".into()))]));
    let store = ConversationStore::new(chat);
    assert!(store.append("hello").await);

    let snapshot = store.snapshot();
    assert!(!snapshot.pending);
    let error = snapshot.last_error.expect("error recorded");
    assert!(!error.is_empty());
    assert!(!error.contains("connection reset"), "transport detail leaked: {error}");
    assert_eq!(snapshot.turns.len(), 2);
    assert_eq!(snapshot.turns[1].role, TurnRole::User);
}

#[tokio::test]
async fn provider_error_message_is_surfaced() {
    let chat = Arc::new(MockChat::new(vec![Err(LlmError::ApiResponse {
        status: 400,
        message: Some("This model's maximum context length is 4096 tokens.".into()),
    })]));
    let store = ConversationStore::new(chat);
    store.append("hello").await;
    assert_eq!(store.last_error().as_deref(), Some("This model's maximum context length is 4096 tokens."));
}

#[tokio::test]
async fn success_clears_previous_error() {
    let chat = Arc::new(MockChat::new(vec![Err(LlmError::ApiParse("eof".into())), Ok("Back online".into())]));
    let store = ConversationStore::new(chat);
    store.append("one").await;
    assert_eq!(store.last_error().as_deref(), Some(GENERIC_ERROR_MESSAGE));
    store.append("two").await;
    assert_eq!(store.last_error(), None);
    assert_eq!(store.turns().last().map(|t| t.text.clone()).as_deref(), Some("Back online"));
}

#[tokio::test]
async fn clear_error_only_clears_error() {
    let chat = Arc::new(MockChat::new(vec![Err(LlmError::ApiRequest("x".into()))]));
    let store = ConversationStore::new(chat);
    store.append("hello").await;
    let before = store.turns();
    store.clear_error();
    assert_eq!(store.last_error(), None);
    assert_eq!(store.turns(), before);
}

#[tokio::test]
async fn turn_ids_are_unique() {
    let store = ConversationStore::new(Arc::new(MockChat::new(vec![])));
    store.append("a").await;
    store.append("b").await;
    let turns = store.turns();
    let mut ids: Vec<_> = turns.iter().map(|t| t.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), turns.len());
}

// =========================================================================
// single flight
// =========================================================================

#[tokio::test]
async fn append_while_pending_is_noop() {
    let chat = Arc::new(GatedChat::new("Great goal!"));
    let store = ConversationStore::new(chat.clone());

    let first = store.append("I want to lose fat");
    let second = async {
        chat.started.notified().await;
        let before = store.snapshot();
        let accepted = store.append("are you there?").await;
        let after = store.snapshot();
        chat.gate.notify_one();
        (before, accepted, after)
    };
    let (first_accepted, (before, accepted, after)) = tokio::join!(first, second);

    assert!(first_accepted);
    assert!(before.pending);
    assert!(!accepted);
    assert_eq!(after, before);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 1);

    assert!(!store.is_pending());
    assert_eq!(store.turns().len(), 3);
}

#[tokio::test]
async fn reply_after_reset_is_applied_to_fresh_transcript() {
    let chat = Arc::new(GatedChat::new("late reply"));
    let store = ConversationStore::new(chat.clone());

    let first = store.append("hello");
    let resetter = async {
        chat.started.notified().await;
        store.reset();
        assert!(!store.is_pending());
        chat.gate.notify_one();
    };
    tokio::join!(first, resetter);

    assert_eq!(
        texts(&store),
        vec![(TurnRole::Assistant, GREETING.to_string()), (TurnRole::Assistant, "late reply".to_string())]
    );
    assert!(!store.is_pending());
}

#[tokio::test]
async fn abandoned_append_leaves_store_idle() {
    let chat = Arc::new(StallFirstChat { calls: AtomicUsize::new(0) });
    let store = ConversationStore::new(chat.clone());

    let abandoned = tokio::time::timeout(std::time::Duration::from_millis(20), store.append("hello")).await;
    assert!(abandoned.is_err(), "first append should still be waiting");
    assert!(!store.is_pending());

    assert!(store.append("hello again").await);
    assert_eq!(
        texts(&store),
        vec![
            (TurnRole::Assistant, GREETING.to_string()),
            (TurnRole::User, "hello".to_string()),
            (TurnRole::User, "hello again".to_string()),
            (TurnRole::Assistant, "ok".to_string()),
        ]
    );
    assert_eq!(chat.calls.load(Ordering::SeqCst), 2);
}
