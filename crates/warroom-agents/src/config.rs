//! Engine configuration — gateway endpoint, pacing, and retry policy.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use deliberation::RetryPolicy;
use serde::Deserialize;

/// Top-level engine configuration.
///
/// Built from environment variables (`WARROOM_GATEWAY_URL`,
/// `WARROOM_GATEWAY_KEY`), optionally overridden by a TOML file and
/// then by CLI flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Model gateway endpoint (the edge function URL).
    pub gateway_url: String,
    /// Credential sent as both `apikey` and bearer token.
    pub gateway_key: String,
    /// Maximum persona cycles per debate.
    pub max_rounds: u32,
    /// Fixed inter-turn cooldown to respect upstream rate limits.
    pub cooldown_secs: u64,
    /// Per-call HTTP timeout.
    pub request_timeout_secs: u64,
    /// Retries after the first attempt, per gateway call.
    pub retries: u32,
    /// First-retry backoff for research calls.
    pub research_base_delay_secs: u64,
    /// First-retry backoff for debate turns.
    pub debate_base_delay_secs: u64,
    /// First-retry backoff for synthesis (the most important call).
    pub synthesis_base_delay_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gateway_url: std::env::var("WARROOM_GATEWAY_URL").unwrap_or_default(),
            gateway_key: std::env::var("WARROOM_GATEWAY_KEY").unwrap_or_default(),
            max_rounds: 5,
            cooldown_secs: 8,
            request_timeout_secs: 45,
            retries: 4,
            research_base_delay_secs: 20,
            debate_base_delay_secs: 15,
            synthesis_base_delay_secs: 30,
        }
    }
}

impl EngineConfig {
    /// Load a config file on top of the env-derived defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn research_policy(&self) -> RetryPolicy {
        self.policy(self.research_base_delay_secs)
    }

    pub fn debate_policy(&self) -> RetryPolicy {
        self.policy(self.debate_base_delay_secs)
    }

    pub fn synthesis_policy(&self) -> RetryPolicy {
        self.policy(self.synthesis_base_delay_secs)
    }

    fn policy(&self, base_delay_secs: u64) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            base_delay: Duration::from_secs(base_delay_secs),
            ..RetryPolicy::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}
