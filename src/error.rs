//! Shared error classification.
//!
//! Every error type in the crate exposes a stable code for structured logs
//! and a retryable flag. `NotificationDispatcher` stops its retry loop on the
//! first error that is not retryable.

pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
