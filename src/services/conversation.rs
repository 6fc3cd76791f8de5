//! Conversation store — the chat widget's single-session transcript.
//!
//! DESIGN
//! ======
//! The store owns the ordered turns plus pending/error status behind a
//! `std::sync::Mutex`, so the shell can share it by reference while a reply is
//! outstanding. The lock is never held across the completion await.
//!
//! Turn 0 is always the seeded greeting and is never sent to the completion
//! service. At most one request is in flight per store: `append` while pending
//! is a no-op. There is no cancellation; a reply that lands after `reset` is
//! still applied to the transcript as it stands then, but it only clears the
//! pending flag if it belongs to the request currently marked in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::llm::CompletionChat;
use crate::llm::types::{ChatMessage, GENERIC_ERROR_MESSAGE, Role};

pub const GREETING: &str = "Hi! I'm your AI fitness coach 💪 Ask me anything about workouts, nutrition, \
or staying motivated.";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

impl From<TurnRole> for Role {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Self::User,
            TurnRole::Assistant => Self::Assistant,
        }
    }
}

/// One message in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub role: TurnRole,
    pub text: String,
    pub timestamp: OffsetDateTime,
}

impl ConversationTurn {
    fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), role, text: text.into(), timestamp: OffsetDateTime::now_utc() }
    }

    fn greeting() -> Self {
        Self::new(TurnRole::Assistant, GREETING)
    }
}

/// Point-in-time copy of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSnapshot {
    pub turns: Vec<ConversationTurn>,
    pub pending: bool,
    pub last_error: Option<String>,
}

struct SessionState {
    turns: Vec<ConversationTurn>,
    /// Sequence number of the outstanding request, if any.
    in_flight: Option<u64>,
    next_seq: u64,
    last_error: Option<String>,
}

impl SessionState {
    fn new() -> Self {
        Self { turns: vec![ConversationTurn::greeting()], in_flight: None, next_seq: 0, last_error: None }
    }

    /// Everything after the greeting, as wire messages.
    fn history(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .skip(1)
            .map(|turn| ChatMessage::new(turn.role.into(), turn.text.clone()))
            .collect()
    }
}

fn lock_session(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks request `seq` as in flight until it settles. Dropping it unsettled
/// (the append future was abandoned) clears the pending flag, unless a newer
/// request owns it by then.
struct PendingReply<'a> {
    state: &'a Mutex<SessionState>,
    seq: u64,
    settled: bool,
}

impl PendingReply<'_> {
    fn settle(mut self, state: &mut SessionState) {
        self.settled = true;
        if state.in_flight == Some(self.seq) {
            state.in_flight = None;
        }
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!(seq = self.seq, "chat: reply abandoned before completion");
        let mut state = lock_session(self.state);
        if state.in_flight == Some(self.seq) {
            state.in_flight = None;
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct ConversationStore {
    chat: Arc<dyn CompletionChat>,
    state: Mutex<SessionState>,
}

impl ConversationStore {
    /// New session seeded with the greeting turn.
    #[must_use]
    pub fn new(chat: Arc<dyn CompletionChat>) -> Self {
        Self { chat, state: Mutex::new(SessionState::new()) }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_session(&self.state)
    }

    /// Append a user turn and request the assistant's reply.
    ///
    /// Returns `false` without touching state when `user_text` is blank or a
    /// request is already pending. If the returned future is dropped before
    /// the reply arrives, the user turn stays and the store is idle again.
    pub async fn append(&self, user_text: &str) -> bool {
        let text = user_text.trim();
        if text.is_empty() {
            return false;
        }

        let (seq, history) = {
            let mut state = self.lock();
            if state.in_flight.is_some() {
                return false;
            }
            state.turns.push(ConversationTurn::new(TurnRole::User, text));
            let seq = state.next_seq;
            state.next_seq += 1;
            state.in_flight = Some(seq);
            state.last_error = None;
            (seq, state.history())
        };
        let pending = PendingReply { state: &self.state, seq, settled: false };
        info!(seq, turns = history.len(), "chat: requesting reply");

        let result = self.chat.complete(&history).await;

        let mut state = self.lock();
        pending.settle(&mut state);
        match result {
            Ok(reply) => {
                state.turns.push(ConversationTurn::new(TurnRole::Assistant, reply));
                state.last_error = None;
            }
            Err(e) => {
                warn!(seq, code = e.error_code(), error = %e, "chat: completion failed");
                let message = e.user_message();
                state.last_error =
                    Some(if message.trim().is_empty() { GENERIC_ERROR_MESSAGE.to_string() } else { message });
            }
        }
        true
    }

    pub fn clear_error(&self) {
        self.lock().last_error = None;
    }

    /// Back to a single fresh greeting, idle, no error.
    pub fn reset(&self) {
        let mut state = self.lock();
        // Sequence numbers survive the reset so a late reply can't be mistaken
        // for a newer request.
        let next_seq = state.next_seq;
        *state = SessionState { next_seq, ..SessionState::new() };
    }

    #[must_use]
    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.lock().turns.clone()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> ConversationSnapshot {
        let state = self.lock();
        ConversationSnapshot {
            turns: state.turns.clone(),
            pending: state.in_flight.is_some(),
            last_error: state.last_error.clone(),
        }
    }
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;
