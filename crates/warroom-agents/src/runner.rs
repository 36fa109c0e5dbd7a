//! Debate runner — executes one full debate against the gateway.
//!
//! The orchestrator in `deliberation` is pure control flow; this runner
//! supplies the side effects around it: producing each persona's turn
//! through the gateway services, pacing turns with a fixed cooldown,
//! publishing progress events, and honoring cancellation. Cancellation
//! is checked between turns and raced against the in-flight generation;
//! a result that arrives after cancellation is discarded.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use deliberation::{
    DebateConfig, DebateOrchestrator, DebateOutcome, EngineEvent, NextAction, SharedEventBus,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::EngineConfig;
use crate::intake::EngagementContext;
use crate::services::PersonaServices;

/// Drives one debate from first architect turn to termination.
pub struct DebateRunner {
    services: Arc<PersonaServices>,
    events: SharedEventBus,
    max_rounds: u32,
    cooldown: Duration,
}

impl DebateRunner {
    pub fn new(
        services: Arc<PersonaServices>,
        config: &EngineConfig,
        events: SharedEventBus,
    ) -> Self {
        Self {
            services,
            events,
            max_rounds: config.max_rounds,
            cooldown: config.cooldown(),
        }
    }

    /// Run the debate to termination and return the outcome.
    ///
    /// Always terminates: the session's cycle budget caps the run even
    /// under perpetual vetoes, and cancellation short-circuits it.
    pub async fn run(
        &self,
        context: &EngagementContext,
        cancel: &CancellationToken,
    ) -> Result<DebateOutcome> {
        let mut orchestrator = DebateOrchestrator::with_config(DebateConfig {
            max_rounds: self.max_rounds,
        });

        loop {
            let role = match orchestrator.next_action() {
                NextAction::Await(role) => role,
                NextAction::Synthesize => break,
            };

            if cancel.is_cancelled() {
                orchestrator.cancel("run cancelled")?;
                break;
            }

            let round = orchestrator.current_round();
            let last_directive = orchestrator.last_directive();

            let produced = tokio::select! {
                _ = cancel.cancelled() => None,
                produced = self.services.produce_turn(
                    role,
                    context,
                    orchestrator.transcript(),
                    round,
                    last_directive,
                ) => Some(produced),
            };
            let Some((turn, _degraded)) = produced else {
                orchestrator.cancel("run cancelled")?;
                break;
            };

            self.events
                .publish(EngineEvent::TurnCompleted { turn: turn.clone() });
            let next = orchestrator.submit_turn(turn)?;

            if matches!(next, NextAction::Await(_)) {
                self.events.publish(EngineEvent::Cooldown {
                    seconds: self.cooldown.as_secs(),
                });
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.cooldown) => {}
                }
            }
        }

        let outcome = orchestrator
            .outcome()
            .context("debate loop exited without a terminal outcome")?;
        info!(
            consensus = outcome.consensus_reached,
            cancelled = outcome.cancelled,
            rounds = outcome.rounds_completed,
            turns = outcome.turn_count,
            "debate terminated"
        );
        self.events.publish(EngineEvent::DebateTerminated {
            consensus: outcome.consensus_reached,
            rounds: outcome.rounds_completed,
            turns: outcome.turn_count,
        });
        Ok(outcome)
    }
}
