//! Shell state owned by the root composition.
//!
//! DESIGN
//! ======
//! Page-wide UI flags (dark mode, sticky footer) and the transient outcome
//! banner live in one `ShellState` value created by `main` and passed down by
//! reference. Nothing here is global. Banner expiry takes an explicit `now`
//! so the timing rules are testable without a clock.

use std::time::{Duration, Instant};

use crate::config::parse_or;
use crate::services::dispatch::DispatchOutcome;

pub const DEFAULT_GENERATING_DELAY_MS: u64 = 3000;
pub const DEFAULT_BANNER_TTL_MS: u64 = 5000;

// =============================================================================
// TIMINGS
// =============================================================================

/// UX timings for the lead flow. Not part of the dispatch contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellTimings {
    /// How long the "generating your plan" state is shown before the outcome.
    pub generating_delay: Duration,
    /// How long an outcome banner stays up unless dismissed.
    pub banner_ttl: Duration,
}

impl Default for ShellTimings {
    fn default() -> Self {
        Self {
            generating_delay: Duration::from_millis(DEFAULT_GENERATING_DELAY_MS),
            banner_ttl: Duration::from_millis(DEFAULT_BANNER_TTL_MS),
        }
    }
}

impl ShellTimings {
    /// - `SHELL_GENERATING_DELAY_MS`: default 3000
    /// - `SHELL_BANNER_TTL_MS`: default 5000
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(crate::config::env_lookup)
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            generating_delay: Duration::from_millis(parse_or(
                &lookup,
                "SHELL_GENERATING_DELAY_MS",
                DEFAULT_GENERATING_DELAY_MS,
            )),
            banner_ttl: Duration::from_millis(parse_or(&lookup, "SHELL_BANNER_TTL_MS", DEFAULT_BANNER_TTL_MS)),
        }
    }
}

// =============================================================================
// BANNER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub success: bool,
    pub message: String,
    pub expires_at: Instant,
}

// =============================================================================
// SHELL STATE
// =============================================================================

#[derive(Debug)]
pub struct ShellState {
    pub timings: ShellTimings,
    dark_mode: bool,
    sticky_footer_visible: bool,
    banner: Option<Banner>,
}

impl ShellState {
    #[must_use]
    pub fn new(timings: ShellTimings) -> Self {
        Self { timings, dark_mode: false, sticky_footer_visible: true, banner: None }
    }

    #[must_use]
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// Flip dark mode and return the new value.
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    #[must_use]
    pub fn sticky_footer_visible(&self) -> bool {
        self.sticky_footer_visible
    }

    pub fn set_sticky_footer(&mut self, visible: bool) {
        self.sticky_footer_visible = visible;
    }

    /// Show `outcome` as the banner, replacing any current one.
    pub fn show(&mut self, outcome: &DispatchOutcome, now: Instant) -> &Banner {
        self.banner.insert(Banner {
            success: outcome.success,
            message: outcome.message.clone(),
            expires_at: now + self.timings.banner_ttl,
        })
    }

    /// The current banner, without checking expiry.
    #[must_use]
    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.banner = None;
    }

    /// Drop the banner if it has expired by `now`; returns the live banner.
    pub fn expire(&mut self, now: Instant) -> Option<&Banner> {
        if self.banner.as_ref().is_some_and(|b| now >= b.expires_at) {
            self.banner = None;
        }
        self.banner.as_ref()
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
