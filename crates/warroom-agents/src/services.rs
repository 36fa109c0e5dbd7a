//! Persona services — the gateway calls behind research, debate turns,
//! and synthesis, each wrapped in bounded retry.
//!
//! All three degrade instead of failing: when retries are exhausted the
//! service substitutes a fixed fallback text and the run keeps moving.
//! A degraded arbiter turn carries no directive, so the debate simply
//! advances to the next round.

use std::sync::Arc;

use deliberation::{
    parse_directive, with_retry, AgentRole, Directive, EngineEvent, SharedEventBus, Transcript,
    Turn,
};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::gateway::{Gateway, GatewayRequest};
use crate::intake::{EngagementContext, IntakeData};

/// Shown in place of the research brief when the gateway stays down.
pub const RESEARCH_FALLBACK: &str =
    "Market intelligence unavailable due to connection limits. Proceeding with internal logic models.";

/// Shown in place of a persona turn when the gateway stays down.
pub const TURN_FALLBACK: &str =
    "Signal lost due to high network traffic. Proceeding to next phase...";

/// Shown in place of the final report when the gateway stays down.
pub const SYNTHESIS_FALLBACK: &str =
    "Final report generation failed due to API limits. Please review the debate logs above manually.";

/// Gateway-backed persona services for one engagement.
pub struct PersonaServices {
    gateway: Arc<dyn Gateway>,
    config: EngineConfig,
    events: SharedEventBus,
}

impl PersonaServices {
    pub fn new(gateway: Arc<dyn Gateway>, config: EngineConfig, events: SharedEventBus) -> Self {
        Self {
            gateway,
            config,
            events,
        }
    }

    /// Produce the market research brief. Never fails — returns the
    /// fallback text after exhausting retries.
    pub async fn run_research(&self, intake: &IntakeData) -> String {
        let policy = self.config.research_policy();
        let result = with_retry(&policy, || {
            self.gateway.generate(GatewayRequest::research(intake))
        })
        .await;

        match result {
            Some(text) => {
                info!(chars = text.len(), "research brief ready");
                text
            }
            None => {
                warn!("research degraded to fallback");
                RESEARCH_FALLBACK.to_string()
            }
        }
    }

    /// Produce one persona's turn for the current round.
    ///
    /// Arbiter output is scanned for a bracket directive, which is
    /// stripped from the stored text and attached to the turn. Returns
    /// the turn plus whether it degraded to fallback text.
    pub async fn produce_turn(
        &self,
        role: AgentRole,
        context: &EngagementContext,
        transcript: &Transcript,
        round: u32,
        last_directive: Option<Directive>,
    ) -> (Turn, bool) {
        self.events
            .publish(EngineEvent::AgentThinking { agent: role, round });

        let policy = self.config.debate_policy();
        let result = with_retry(&policy, || {
            self.gateway.generate(GatewayRequest::debate(
                role,
                &context.intake,
                &context.research,
                transcript,
                round,
                last_directive,
            ))
        })
        .await;

        match result {
            Some(text) if role == AgentRole::Arbiter => {
                let (clean, directive) = parse_directive(&text);
                (Turn::arbiter(clean, round, directive), false)
            }
            Some(text) => (Turn::new(role, text, round), false),
            None => {
                warn!(agent = %role, round, "turn degraded to fallback");
                self.events
                    .publish(EngineEvent::TurnDegraded { agent: role, round });
                let turn = if role == AgentRole::Arbiter {
                    // No directive on a degraded verdict; the debate
                    // advances as if the arbiter said continue.
                    Turn::arbiter(TURN_FALLBACK.to_string(), round, Directive::Continue)
                } else {
                    Turn::new(role, TURN_FALLBACK, round)
                };
                (turn, true)
            }
        }
    }

    /// Produce the final synthesis report from the full transcript.
    pub async fn run_synthesis(
        &self,
        context: &EngagementContext,
        transcript: &Transcript,
    ) -> String {
        let policy = self.config.synthesis_policy();
        let result = with_retry(&policy, || {
            self.gateway.generate(GatewayRequest::synthesis(
                &context.intake,
                &context.research,
                transcript,
            ))
        })
        .await;

        match result {
            Some(text) => text,
            None => {
                warn!("synthesis degraded to fallback");
                SYNTHESIS_FALLBACK.to_string()
            }
        }
    }
}
