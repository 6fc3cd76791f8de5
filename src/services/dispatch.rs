//! Lead dispatch with bounded retry.
//!
//! DESIGN
//! ======
//! Validation runs first and never touches the network or the retry budget.
//! A valid lead is delivered through `NotifyTransport` up to
//! `RetryPolicy::max_attempts` times, strictly sequentially. An attempt counts
//! as delivered only when the transport succeeds AND the endpoint's body says
//! `success: true`; the first such attempt ends the loop. Failed attempt `k`
//! is followed by a `base_delay * k` wait through the injected `Delay`, so
//! tests drive the loop without real timers. An error that reports itself as
//! not retryable ends the loop at once.
//!
//! Every failure is folded into the returned `DispatchOutcome`; callers never
//! see an error.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ErrorCode;
use crate::lead::{LeadFormData, LeadPayload};
use crate::notify::{NotifyError, NotifyTransport, RetryPolicy};

pub const DEFAULT_SUCCESS_MESSAGE: &str = "✅ Your personalized plan is on its way! Check your inbox.";

// =============================================================================
// DELAY
// =============================================================================

/// Suspension point between retry attempts.
#[async_trait::async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real timer backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait::async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// The single user-facing result of a lead submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub success: bool,
    pub message: String,
}

impl DispatchOutcome {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn NotifyTransport>,
    delay: Arc<dyn Delay>,
    policy: RetryPolicy,
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(transport: Arc<dyn NotifyTransport>, delay: Arc<dyn Delay>, policy: RetryPolicy) -> Self {
        Self { transport, delay, policy }
    }

    /// Validate `form` and deliver it, retrying transport failures.
    pub async fn send(&self, form: &LeadFormData) -> DispatchOutcome {
        let payload = match form.validate() {
            Ok(payload) => payload,
            Err(e) => {
                info!(code = e.error_code(), "dispatch: lead rejected by validation");
                return DispatchOutcome::failure(format!("❌ {e}"));
            }
        };
        self.deliver_with_retry(&payload).await
    }

    async fn deliver_with_retry(&self, payload: &LeadPayload) -> DispatchOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.attempt(payload).await {
                Ok(message) => {
                    info!(attempt, goal = %payload.fitness_goal, "dispatch: lead delivered");
                    return DispatchOutcome::success(message);
                }
                Err(e) if !e.retryable() => {
                    warn!(attempt, code = e.error_code(), error = %e, "dispatch: non-retryable failure");
                    return DispatchOutcome::failure(failed_after(attempt, &e.to_string()));
                }
                Err(e) => {
                    warn!(attempt, max_attempts, code = e.error_code(), error = %e, "dispatch: attempt failed");
                    last_error = e.to_string();
                }
            }
            if let Some(wait) = self.policy.delay_after(attempt) {
                self.delay.sleep(wait).await;
            }
        }

        DispatchOutcome::failure(failed_after(max_attempts, &last_error))
    }

    /// One attempt; `Ok` carries the message to show the visitor.
    async fn attempt(&self, payload: &LeadPayload) -> Result<String, NotifyError> {
        let response = self.transport.deliver(payload).await?;
        if !response.success {
            return Err(NotifyError::Rejected(response.rejection_reason()));
        }
        Ok(response
            .message
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()))
    }
}

fn failed_after(attempts: u32, error: &str) -> String {
    let noun = if attempts == 1 { "attempt" } else { "attempts" };
    format!("Failed after {attempts} {noun}. {error}")
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
