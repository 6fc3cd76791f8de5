//! Helpers shared by the per-component `from_env` configs.
//!
//! Every config struct parses through a lookup closure so tests can supply
//! variables without touching the process environment.

/// Process environment as a lookup closure.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse an optional variable, falling back to `default` when absent or malformed.
pub fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
