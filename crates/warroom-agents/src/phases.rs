//! Macro phase controller — sequences one engagement end to end.
//!
//! ```text
//! Welcome ──▶ Intake ──▶ Research ──▶ Debate ──▶ Synthesis ──▶ Complete
//!                            │            │
//!                            └────────────┴── (cancelled) ──▶ Complete
//! ```
//!
//! The controller is thin on purpose: phase ordering and the one
//! synthesis invocation live here, while all turn-level sequencing is
//! owned by the debate orchestrator. Cancelled runs skip synthesis.

use std::sync::Arc;

use anyhow::Result;
use deliberation::{DebateOutcome, EngineEvent, SharedEventBus};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::EngineConfig;
use crate::gateway::Gateway;
use crate::intake::{EngagementContext, IntakeData};
use crate::runner::DebateRunner;
use crate::services::PersonaServices;

/// Macro phases of one engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    Welcome,
    Intake,
    Research,
    Debate,
    Synthesis,
    Complete,
}

impl EnginePhase {
    pub fn is_terminal(self) -> bool {
        self == Self::Complete
    }

    /// Phases reachable from this one. Every non-terminal phase can
    /// also jump straight to `Complete` on cancellation.
    pub fn valid_transitions(self) -> &'static [EnginePhase] {
        match self {
            Self::Welcome => &[Self::Intake, Self::Complete],
            Self::Intake => &[Self::Research, Self::Complete],
            Self::Research => &[Self::Debate, Self::Complete],
            Self::Debate => &[Self::Synthesis, Self::Complete],
            Self::Synthesis => &[Self::Complete],
            Self::Complete => &[],
        }
    }
}

impl std::fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::Intake => "intake",
            Self::Research => "research",
            Self::Debate => "debate",
            Self::Synthesis => "synthesis",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Invalid phase transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid phase transition: {from} -> {to}")]
pub struct PhaseError {
    pub from: EnginePhase,
    pub to: EnginePhase,
}

/// Transition-checked phase tracker.
#[derive(Debug)]
pub struct PhaseController {
    phase: EnginePhase,
    events: SharedEventBus,
}

impl PhaseController {
    pub fn new(events: SharedEventBus) -> Self {
        Self {
            phase: EnginePhase::Welcome,
            events,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Advance to the next phase, publishing the change.
    pub fn advance(&mut self, to: EnginePhase) -> Result<(), PhaseError> {
        if !self.phase.valid_transitions().contains(&to) {
            return Err(PhaseError {
                from: self.phase,
                to,
            });
        }
        info!(from = %self.phase, to = %to, "phase transition");
        self.phase = to;
        self.events.publish(EngineEvent::PhaseStarted {
            phase: to.to_string(),
        });
        Ok(())
    }
}

/// Result of one full engagement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementReport {
    /// The research brief the debate argued over.
    pub research: String,
    /// Terminal debate snapshot.
    pub outcome: DebateOutcome,
    /// Final synthesis text, absent for cancelled runs.
    pub report: Option<String>,
}

/// The engagement engine: research, debate, synthesis in order.
pub struct Engine {
    services: Arc<PersonaServices>,
    runner: DebateRunner,
    events: SharedEventBus,
}

impl Engine {
    pub fn new(gateway: Arc<dyn Gateway>, config: EngineConfig, events: SharedEventBus) -> Self {
        let services = Arc::new(PersonaServices::new(
            gateway,
            config.clone(),
            events.clone(),
        ));
        let runner = DebateRunner::new(services.clone(), &config, events.clone());
        Self {
            services,
            runner,
            events,
        }
    }

    /// Run one engagement to completion.
    pub async fn run(
        &self,
        intake: IntakeData,
        cancel: &CancellationToken,
    ) -> Result<EngagementReport> {
        let mut controller = PhaseController::new(self.events.clone());
        controller.advance(EnginePhase::Intake)?;
        info!(problem = %intake.core_problem, "engagement started");

        controller.advance(EnginePhase::Research)?;
        let research = if cancel.is_cancelled() {
            String::new()
        } else {
            self.services.run_research(&intake).await
        };
        let context = EngagementContext::new(intake, research);

        controller.advance(EnginePhase::Debate)?;
        let outcome = self.runner.run(&context, cancel).await?;

        let report = if outcome.cancelled {
            controller.advance(EnginePhase::Complete)?;
            None
        } else {
            controller.advance(EnginePhase::Synthesis)?;
            let report = self.services.run_synthesis(&context, &outcome.transcript).await;
            self.events.publish(EngineEvent::SynthesisReady {
                report: report.clone(),
            });
            controller.advance(EnginePhase::Complete)?;
            Some(report)
        };

        Ok(EngagementReport {
            research: context.research,
            outcome,
            report,
        })
    }
}
