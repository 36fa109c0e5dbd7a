//! Bounded retry with exponential backoff.
//!
//! Cross-cutting wrapper for every model-gateway call (research, debate
//! turns, synthesis). The dominant failure mode upstream is
//! rate-limiting, so the delay grows exponentially between attempts,
//! and when the upstream error text carries a suggested wait (Gemini's
//! `retryDelay` or an HTTP `retry-after`), the wrapper honors it plus a
//! safety margin, taking the larger of the two.
//!
//! Exhausted retries resolve to `None` — nothing ever panics or
//! propagates an error past this boundary. Callers substitute their
//! fixed fallback text and keep the run moving.

use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Backoff policy for one class of gateway call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = retries + 1).
    pub retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth factor between attempts.
    pub multiplier: f64,
    /// Upper bound on any single computed delay.
    pub max_delay: Duration,
    /// Margin added on top of an upstream-suggested wait.
    pub suggested_delay_margin: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 4,
            base_delay: Duration::from_secs(15),
            multiplier: 2.0,
            max_delay: Duration::from_secs(240),
            suggested_delay_margin: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Default policy with a different base delay. Research starts at
    /// 20s, debate turns at 15s, synthesis at 30s.
    pub fn with_base_delay(base_delay: Duration) -> Self {
        Self {
            base_delay,
            ..Self::default()
        }
    }

    /// Total attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Exponential delay for a given zero-indexed attempt.
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis(scaled as u64).min(self.max_delay)
    }

    /// Delay before the next attempt, honoring any upstream hint.
    pub fn delay_for(&self, attempt: u32, error_text: &str) -> Duration {
        let computed = self.compute_delay(attempt);
        match parse_suggested_delay(error_text) {
            Some(suggested) => computed.max(suggested + self.suggested_delay_margin),
            None => computed,
        }
    }
}

fn retry_delay_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Gemini embeds `"retryDelay": "22s"` in 429 bodies; proxies may
        // surface a `retry-after: 30` header in the error text instead.
        Regex::new(r#"(?i)(?:retryDelay\D*(\d+)s|retry-after\D*?(\d+))"#)
            .expect("retry delay pattern is valid")
    })
}

/// Parse an upstream-suggested wait out of an error message.
pub fn parse_suggested_delay(error_text: &str) -> Option<Duration> {
    let caps = retry_delay_pattern().captures(error_text)?;
    let secs = caps
        .get(1)
        .or_else(|| caps.get(2))?
        .as_str()
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_secs(secs))
}

/// Attempt `op` up to `retries + 1` times.
///
/// Returns the first success, or `None` after exhausting attempts.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    for attempt in 0..policy.max_attempts() {
        match op().await {
            Ok(value) => return Some(value),
            Err(e) => {
                if attempt == policy.retries {
                    warn!(
                        attempts = policy.max_attempts(),
                        error = %e,
                        "max retries reached, giving up"
                    );
                    return None;
                }

                let delay = policy.delay_for(attempt, &e.to_string());
                warn!(
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    None
}
