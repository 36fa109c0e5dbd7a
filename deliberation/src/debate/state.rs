//! Debate state machine — persona phases, transitions, and session tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::directive::Directive;

/// One of the three fixed debate personas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Builds the strategic case.
    Architect,
    /// Attacks the case, hunting for the flaw that kills it.
    Destroyer,
    /// Referees the exchange and issues the per-round directive.
    Arbiter,
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Architect => write!(f, "architect"),
            Self::Destroyer => write!(f, "destroyer"),
            Self::Arbiter => write!(f, "arbiter"),
        }
    }
}

/// Phase of a debate session.
///
/// Every run starts at `ArchitectTurn` with round 1 and ends at
/// `Terminated` — by consensus, by an exhausted cycle budget, or by
/// cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebatePhase {
    /// Architect is producing its argument.
    ArchitectTurn,
    /// Destroyer is attacking the architect's last point.
    DestroyerTurn,
    /// Arbiter is critiquing the exchange and issuing a directive.
    ArbiterTurn,
    /// Debate over — the only path into synthesis.
    Terminated,
}

impl DebatePhase {
    /// Whether this is a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Valid transitions from this phase.
    ///
    /// Any non-terminal phase may also transition to `Terminated`
    /// (cancellation), so `Terminated` appears in every row.
    pub fn valid_transitions(self) -> &'static [DebatePhase] {
        match self {
            Self::ArchitectTurn => &[Self::DestroyerTurn, Self::Terminated],
            Self::DestroyerTurn => &[Self::ArbiterTurn, Self::Terminated],
            Self::ArbiterTurn => &[Self::ArchitectTurn, Self::Terminated],
            Self::Terminated => &[],
        }
    }

    /// The persona expected to speak in this phase, if any.
    pub fn speaking_agent(self) -> Option<AgentRole> {
        match self {
            Self::ArchitectTurn => Some(AgentRole::Architect),
            Self::DestroyerTurn => Some(AgentRole::Destroyer),
            Self::ArbiterTurn => Some(AgentRole::Arbiter),
            Self::Terminated => None,
        }
    }
}

impl std::fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArchitectTurn => write!(f, "architect_turn"),
            Self::DestroyerTurn => write!(f, "destroyer_turn"),
            Self::ArbiterTurn => write!(f, "arbiter_turn"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// A recorded phase transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateTransition {
    /// Previous phase.
    pub from: DebatePhase,
    /// New phase.
    pub to: DebatePhase,
    /// Round number at the time of the transition.
    pub round: u32,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
    /// Reason for the transition.
    pub reason: String,
}

/// Error for invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition {from} → {to}: {reason}")]
pub struct TransitionError {
    pub from: DebatePhase,
    pub to: DebatePhase,
    pub reason: String,
}

/// Mutable control state for one debate run.
///
/// This is the single source of truth the orchestrator consults — the
/// transcript cannot stand in for it, because a vetoed round appends
/// turns without advancing `current_round`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSession {
    /// Unique session identifier.
    pub id: String,
    /// Current phase.
    pub phase: DebatePhase,
    /// Current round number (1-indexed; never decreases).
    pub current_round: u32,
    /// Maximum full Architect→Destroyer→Arbiter cycles.
    pub max_rounds: u32,
    /// Completed cycles, vetoed ones included. This, not the round
    /// number, is what bounds the run: a veto repeats the round but
    /// still spends budget, so repeated vetoes cannot loop forever.
    pub cycles_completed: u32,
    /// The last directive the arbiter issued.
    pub last_directive: Option<Directive>,
    /// False exactly once — when the run terminates.
    pub active: bool,
    /// Transition history for audit and replay.
    pub transitions: Vec<DebateTransition>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl DebateSession {
    /// Create a new session starting at `ArchitectTurn`, round 1.
    pub fn new(id: &str, max_rounds: u32) -> Self {
        Self {
            id: id.to_string(),
            phase: DebatePhase::ArchitectTurn,
            current_round: 1,
            max_rounds,
            cycles_completed: 0,
            last_directive: None,
            active: true,
            transitions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Transition to a new phase with a reason.
    pub fn transition(&mut self, to: DebatePhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.phase,
                to,
                reason: format!(
                    "not a valid transition (allowed: {:?})",
                    self.phase.valid_transitions()
                ),
            });
        }

        tracing::debug!(
            session = %self.id,
            from = %self.phase,
            to = %to,
            round = self.current_round,
            "Debate transition"
        );

        self.transitions.push(DebateTransition {
            from: self.phase,
            to,
            round: self.current_round,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;

        if to == DebatePhase::Terminated {
            self.active = false;
        }

        Ok(())
    }

    /// Apply the arbiter's directive and close the current cycle.
    ///
    /// Must be called in `ArbiterTurn`. Decides the next phase:
    /// - `Consensus` → `Terminated`
    /// - cycle budget spent → `Terminated` regardless of directive
    /// - `Veto` → `ArchitectTurn`, same round
    /// - `MeceCheck` / `Continue` → `ArchitectTurn`, next round
    pub fn apply_arbiter_directive(
        &mut self,
        directive: Directive,
    ) -> Result<DebatePhase, TransitionError> {
        if self.phase != DebatePhase::ArbiterTurn {
            return Err(TransitionError {
                from: self.phase,
                to: DebatePhase::ArchitectTurn,
                reason: "directives only apply in arbiter_turn".to_string(),
            });
        }

        self.cycles_completed += 1;
        self.last_directive = Some(directive);

        if directive == Directive::Consensus {
            self.transition(DebatePhase::Terminated, "consensus granted")?;
            return Ok(self.phase);
        }

        if self.cycles_completed >= self.max_rounds {
            self.transition(
                DebatePhase::Terminated,
                &format!("cycle budget spent ({} cycles)", self.cycles_completed),
            )?;
            return Ok(self.phase);
        }

        match directive {
            Directive::Veto => {
                // Round is NOT incremented — the cycle repeats and the
                // next architect turn sees the veto.
                self.transition(DebatePhase::ArchitectTurn, "vetoed, repeating round")?;
            }
            Directive::MeceCheck | Directive::Continue => {
                self.current_round += 1;
                self.transition(DebatePhase::ArchitectTurn, "round advanced")?;
            }
            Directive::Consensus => unreachable!("handled above"),
        }

        Ok(self.phase)
    }

    /// Cancel the run from any non-terminal phase.
    pub fn cancel(&mut self, reason: &str) -> Result<(), TransitionError> {
        self.transition(DebatePhase::Terminated, reason)
    }

    /// Whether the debate has ended.
    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] round {}/{} | {} cycles | session={}",
            self.phase, self.current_round, self.max_rounds, self.cycles_completed, self.id
        )
    }
}
