//! Per-check retry state machine.
//!
//! A remote check moves `Attempt -> Wait -> Retry -> Attempt ...` until it
//! reaches `Resolve`. Only transient failures leave `Attempt` for `Wait`.

use std::time::Duration;

use crate::core::constants::details;
use crate::core::types::LinkStatus;
use crate::validation::probe::{LinkProbe, ProbeError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckState {
    /// Issue request number `n` (1-based)
    Attempt(u32),
    /// Back off after a transient failure of attempt `attempt`
    Wait { attempt: u32, delay: Duration },
    /// Backoff elapsed; the next attempt follows `attempt`
    Retry(u32),
    /// Final status
    Resolve(LinkStatus),
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each later one
    pub base_delay: Duration,
    /// Status codes that count as reachable besides 2xx/3xx
    pub allowed_status_codes: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_millis(500),
            allowed_status_codes: Vec::new(),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Transition out of `Attempt(attempt)` given its result.
    pub fn after_attempt(
        &self,
        attempt: u32,
        result: std::result::Result<u16, ProbeError>,
    ) -> CheckState {
        match result {
            Ok(code) => CheckState::Resolve(self.classify_status(code)),
            Err(err) if err.is_transient() && attempt <= self.max_retries => CheckState::Wait {
                attempt,
                delay: self.backoff(attempt),
            },
            Err(err) => CheckState::Resolve(classify_error(err)),
        }
    }

    pub fn classify_status(&self, code: u16) -> LinkStatus {
        if self.allowed_status_codes.contains(&code) || (200..400).contains(&code) {
            LinkStatus::Ok
        } else {
            LinkStatus::Broken(format!("HTTP {code}"))
        }
    }
}

fn classify_error(err: ProbeError) -> LinkStatus {
    match err {
        ProbeError::Timeout => LinkStatus::Broken(details::TIMEOUT.to_string()),
        ProbeError::ConnectionReset(reason) | ProbeError::Network(reason) => {
            LinkStatus::Error(reason)
        }
    }
}

/// Drive the state machine for one remote URL.
pub async fn run_remote_check(probe: &dyn LinkProbe, url: &str, policy: &RetryPolicy) -> LinkStatus {
    let mut state = CheckState::Attempt(1);
    loop {
        state = match state {
            CheckState::Attempt(attempt) => {
                let result = probe.probe_remote(url).await;
                if let Err(ref err) = result {
                    log::debug!("{url}: attempt {attempt} failed: {err}");
                }
                policy.after_attempt(attempt, result)
            }
            CheckState::Wait { attempt, delay } => {
                tokio::time::sleep(delay).await;
                CheckState::Retry(attempt)
            }
            CheckState::Retry(attempt) => CheckState::Attempt(attempt + 1),
            CheckState::Resolve(status) => return status,
        };
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    /// Replays a fixed sequence of results, one per request.
    struct ScriptedProbe {
        script: Mutex<Vec<std::result::Result<u16, ProbeError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedProbe {
        fn new(mut script: Vec<std::result::Result<u16, ProbeError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LinkProbe for ScriptedProbe {
        async fn probe_remote(&self, _url: &str) -> std::result::Result<u16, ProbeError> {
            *self.calls.lock().unwrap() += 1;
            self.script.lock().unwrap().pop().expect("script exhausted")
        }

        async fn probe_local(&self, _path: &Path) -> bool {
            unreachable!("remote checks never touch the filesystem")
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            allowed_status_codes: Vec::new(),
        }
    }

    #[test]
    fn test_after_attempt__transitions() {
        let policy = fast_policy();

        assert_eq!(policy.after_attempt(1, Ok(200)), CheckState::Resolve(LinkStatus::Ok));
        assert_eq!(
            policy.after_attempt(1, Err(ProbeError::Timeout)),
            CheckState::Wait {
                attempt: 1,
                delay: Duration::from_millis(1)
            }
        );
        assert_eq!(
            policy.after_attempt(2, Err(ProbeError::Timeout)),
            CheckState::Resolve(LinkStatus::Broken("timeout".to_string()))
        );
        assert_eq!(
            policy.after_attempt(1, Err(ProbeError::Network("dns error".into()))),
            CheckState::Resolve(LinkStatus::Error("dns error".to_string()))
        );
    }

    #[test]
    fn test_classify_status() {
        let policy = RetryPolicy {
            allowed_status_codes: vec![403],
            ..fast_policy()
        };

        assert_eq!(policy.classify_status(200), LinkStatus::Ok);
        assert_eq!(policy.classify_status(301), LinkStatus::Ok);
        assert_eq!(policy.classify_status(403), LinkStatus::Ok);
        assert_eq!(policy.classify_status(404), LinkStatus::Broken("HTTP 404".to_string()));
        assert_eq!(policy.classify_status(503), LinkStatus::Broken("HTTP 503".to_string()));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            ..fast_policy()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_run_remote_check__retries_transient_once() {
        let probe = ScriptedProbe::new(vec![
            Err(ProbeError::ConnectionReset("connection reset by peer".into())),
            Ok(200),
        ]);

        let status = run_remote_check(&probe, "https://example.com/", &fast_policy()).await;

        assert_eq!(status, LinkStatus::Ok);
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test]
    async fn test_run_remote_check__gives_up_after_retry() {
        let probe = ScriptedProbe::new(vec![Err(ProbeError::Timeout), Err(ProbeError::Timeout)]);

        let status = run_remote_check(&probe, "https://example.com/", &fast_policy()).await;

        assert_eq!(status, LinkStatus::Broken("timeout".to_string()));
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test]
    async fn test_run_remote_check__no_retry_for_dns_failure() {
        let probe = ScriptedProbe::new(vec![Err(ProbeError::Network("dns error".into()))]);

        let status = run_remote_check(&probe, "https://nope.invalid/", &fast_policy()).await;

        assert_eq!(status, LinkStatus::Error("dns error".to_string()));
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_run_remote_check__no_retry_for_http_errors() {
        let probe = ScriptedProbe::new(vec![Ok(500)]);

        let status = run_remote_check(&probe, "https://example.com/", &fast_policy()).await;

        assert_eq!(status, LinkStatus::Broken("HTTP 500".to_string()));
        assert_eq!(probe.calls(), 1);
    }
}
