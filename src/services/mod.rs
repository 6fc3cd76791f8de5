//! Domain services driven by the landing-page shell.
//!
//! ARCHITECTURE
//! ============
//! Services own the two stateful flows, lead submission and coaching chat,
//! behind the transport seams in `notify` and `llm`, so the shell only
//! renders state and forwards user input.

pub mod conversation;
pub mod dispatch;
pub mod submission;
