//! Model gateway client — the HTTP boundary to the generation backend.
//!
//! The gateway owns provider selection, prompt wording, and key
//! management; this side only ships the engagement data, the serialized
//! history, and the control fields, and gets text back. Any non-2xx
//! response is surfaced as a plain error so the retry wrapper treats it
//! as transient.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use deliberation::{AgentRole, Directive, Transcript, WireTurn};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::intake::IntakeData;

/// The three gateway actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Research,
    Debate,
    Synthesis,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Research => write!(f, "research"),
            Self::Debate => write!(f, "debate"),
            Self::Synthesis => write!(f, "synthesis"),
        }
    }
}

/// Request body for the gateway edge function.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<AgentRole>,
    /// Per-action subset of the intake fields.
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<WireTurn>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_arbiter_command: Option<String>,
}

impl GatewayRequest {
    /// Research request: one-liner, industry, and competitors only.
    pub fn research(intake: &IntakeData) -> Self {
        Self {
            action: Action::Research,
            role: None,
            data: serde_json::json!({
                "companyOneLiner": intake.company_one_liner,
                "industry": intake.industry,
                "competitors": intake.competitors,
            }),
            research: None,
            history: None,
            round: None,
            last_arbiter_command: None,
        }
    }

    /// Debate-turn request for one persona.
    pub fn debate(
        role: AgentRole,
        intake: &IntakeData,
        research: &str,
        transcript: &Transcript,
        round: u32,
        last_directive: Option<Directive>,
    ) -> Self {
        Self {
            action: Action::Debate,
            role: Some(role),
            data: serde_json::json!({
                "companyOneLiner": intake.company_one_liner,
                "coreProblem": intake.core_problem,
            }),
            research: Some(research.to_string()),
            history: Some(transcript.wire_history()),
            round: Some(round),
            last_arbiter_command: last_directive.map(|d| d.as_wire_str().to_string()),
        }
    }

    /// Synthesis request carries the full intake record.
    pub fn synthesis(intake: &IntakeData, research: &str, transcript: &Transcript) -> Self {
        Self {
            action: Action::Synthesis,
            role: None,
            data: serde_json::to_value(intake).unwrap_or_default(),
            research: Some(research.to_string()),
            history: Some(transcript.wire_history()),
            round: None,
            last_arbiter_command: None,
        }
    }
}

/// Success body: `{ "text": "…" }`.
#[derive(Debug, Deserialize)]
struct GatewayResponse {
    #[serde(default)]
    text: String,
}

/// The generation boundary, mockable for tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Generate text for one request, or fail retryably.
    async fn generate(&self, request: GatewayRequest) -> Result<String>;
}

/// HTTP implementation on `reqwest`.
#[derive(Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpGateway {
    /// Build the client. A missing endpoint is a configuration failure
    /// and fails here, before any debate starts.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        if config.gateway_url.is_empty() {
            bail!("no gateway URL configured (set WARROOM_GATEWAY_URL)");
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            url: config.gateway_url.clone(),
            api_key: config.gateway_key.clone(),
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn generate(&self, request: GatewayRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("gateway request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("gateway error {status}: {body}");
        }

        let body: GatewayResponse = response
            .json()
            .await
            .context("gateway returned malformed JSON")?;
        Ok(body.text)
    }
}
