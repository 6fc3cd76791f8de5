use std::collections::HashMap;

use super::*;

fn load(pairs: &[(&str, &str)]) -> Result<NotifyConfig, NotifyError> {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    NotifyConfig::from_lookup(|key| env.get(key).cloned())
}

#[test]
fn defaults_with_only_url() {
    let cfg = load(&[("NOTIFY_URL", "https://fn.example.test/send-plan")]).unwrap();
    assert_eq!(cfg.url, "https://fn.example.test/send-plan");
    assert_eq!(cfg.bearer_token, None);
    assert_eq!(cfg.retry, RetryPolicy::default());
    assert_eq!(cfg.request_timeout, Duration::from_secs(DEFAULT_NOTIFY_REQUEST_TIMEOUT_SECS));
    assert_eq!(cfg.connect_timeout, Duration::from_secs(DEFAULT_NOTIFY_CONNECT_TIMEOUT_SECS));
}

#[test]
fn missing_url_errors() {
    assert!(matches!(load(&[]), Err(NotifyError::MissingUrl)));
    assert!(matches!(load(&[("NOTIFY_URL", "  ")]), Err(NotifyError::MissingUrl)));
}

#[test]
fn non_http_url_errors() {
    assert!(matches!(load(&[("NOTIFY_URL", "ftp://x")]), Err(NotifyError::ConfigParse(_))));
}

#[test]
fn overrides_are_parsed() {
    let cfg = load(&[
        ("NOTIFY_URL", "http://localhost:54321/functions/v1/send-plan"),
        ("NOTIFY_BEARER_TOKEN", "anon-key"),
        ("NOTIFY_MAX_ATTEMPTS", "5"),
        ("NOTIFY_BASE_DELAY_MS", "250"),
    ])
    .unwrap();
    assert_eq!(cfg.bearer_token.as_deref(), Some("anon-key"));
    assert_eq!(cfg.retry, RetryPolicy { max_attempts: 5, base_delay: Duration::from_millis(250) });
}

#[test]
fn zero_attempts_clamped_to_one() {
    let cfg = load(&[("NOTIFY_URL", "https://x.test"), ("NOTIFY_MAX_ATTEMPTS", "0")]).unwrap();
    assert_eq!(cfg.retry.max_attempts, 1);
}

#[test]
fn blank_bearer_is_none() {
    let cfg = load(&[("NOTIFY_URL", "https://x.test"), ("NOTIFY_BEARER_TOKEN", " ")]).unwrap();
    assert_eq!(cfg.bearer_token, None);
}

#[test]
fn default_policy_delays_grow_linearly() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_after(1), Some(Duration::from_millis(1000)));
    assert_eq!(policy.delay_after(2), Some(Duration::from_millis(2000)));
    assert_eq!(policy.delay_after(3), None);
}
