//! Debate orchestrator — drives the Architect→Destroyer→Arbiter rotation.
//!
//! Ties together the session state machine, the transcript store, and
//! the directive protocol. The orchestrator is pure control flow: the
//! caller produces turns (via the model gateway or a test script) and
//! submits them; the orchestrator appends, applies directives, and says
//! what happens next.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::directive::Directive;
use super::state::{AgentRole, DebatePhase, DebateSession};
use super::transcript::{Transcript, Turn};

/// Configuration for one debate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    /// Maximum full persona cycles before the safety cap fires.
    pub max_rounds: u32,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self { max_rounds: 5 }
    }
}

/// What the orchestrator expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Waiting for the named persona's turn.
    Await(AgentRole),
    /// Debate terminated — invoke synthesis with the full transcript.
    Synthesize,
}

impl std::fmt::Display for NextAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Await(role) => write!(f, "await_{role}"),
            Self::Synthesize => write!(f, "synthesize"),
        }
    }
}

/// Error from the debate orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DebateError {
    #[error("transition failed: {0}")]
    TransitionFailed(String),
    #[error("debate already complete")]
    AlreadyComplete,
    #[error("expected {expected} to speak, got {actual}")]
    WrongAgent { expected: AgentRole, actual: AgentRole },
    #[error("turn is for round {actual}, current round is {expected}")]
    RoundMismatch { expected: u32, actual: u32 },
}

/// Terminal snapshot of a completed debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateOutcome {
    /// Whether the arbiter explicitly granted consensus.
    pub consensus_reached: bool,
    /// Whether the run was cancelled before reaching a verdict.
    pub cancelled: bool,
    /// Round number at termination.
    pub rounds_completed: u32,
    /// Total persona cycles executed (vetoed ones included).
    pub cycles_completed: u32,
    /// Number of turns in the transcript.
    pub turn_count: usize,
    /// The full transcript, for synthesis and display.
    pub transcript: Transcript,
    /// The session snapshot at completion.
    pub session: DebateSession,
}

/// The debate orchestrator.
///
/// Usage:
/// 1. Create with `new()` or `with_config()`
/// 2. Check `expected_agent()` and produce that persona's turn
/// 3. Call `submit_turn()`; repeat while it returns `Await(..)`
/// 4. On `Synthesize`, call `outcome()` and hand the transcript off
///
/// The orchestrator is the transcript's single writer — the UI layer
/// reads snapshots and never mutates (no locking needed).
pub struct DebateOrchestrator {
    session: DebateSession,
    transcript: Transcript,
    cancelled: bool,
}

impl DebateOrchestrator {
    /// Create an orchestrator with default config and a fresh id.
    pub fn new() -> Self {
        Self::with_config(DebateConfig::default())
    }

    /// Create an orchestrator with custom config.
    pub fn with_config(config: DebateConfig) -> Self {
        let id = format!("war-{}", Uuid::new_v4());
        Self {
            session: DebateSession::new(&id, config.max_rounds),
            transcript: Transcript::new(),
            cancelled: false,
        }
    }

    /// The persona expected to speak now, or `None` once terminated.
    pub fn expected_agent(&self) -> Option<AgentRole> {
        self.session.phase.speaking_agent()
    }

    /// Submit a completed turn.
    ///
    /// Validates the speaker and round, appends the turn to the
    /// transcript, applies the arbiter directive when applicable, and
    /// returns what the caller should do next. Appending happens before
    /// the transition, so a turn is never lost to a transition error.
    pub fn submit_turn(&mut self, turn: Turn) -> Result<NextAction, DebateError> {
        let expected = self
            .expected_agent()
            .ok_or(DebateError::AlreadyComplete)?;
        if turn.agent != expected {
            return Err(DebateError::WrongAgent {
                expected,
                actual: turn.agent,
            });
        }
        if turn.round != self.session.current_round {
            return Err(DebateError::RoundMismatch {
                expected: self.session.current_round,
                actual: turn.round,
            });
        }

        let directive = turn.directive.unwrap_or(Directive::Continue);
        self.transcript.append(turn);

        match expected {
            AgentRole::Architect => {
                self.session
                    .transition(DebatePhase::DestroyerTurn, "architect turn complete")
                    .map_err(|e| DebateError::TransitionFailed(e.to_string()))?;
            }
            AgentRole::Destroyer => {
                self.session
                    .transition(DebatePhase::ArbiterTurn, "destroyer turn complete")
                    .map_err(|e| DebateError::TransitionFailed(e.to_string()))?;
            }
            AgentRole::Arbiter => {
                self.session
                    .apply_arbiter_directive(directive)
                    .map_err(|e| DebateError::TransitionFailed(e.to_string()))?;
            }
        }

        Ok(self.next_action())
    }

    /// What the orchestrator expects next.
    pub fn next_action(&self) -> NextAction {
        match self.expected_agent() {
            Some(role) => NextAction::Await(role),
            None => NextAction::Synthesize,
        }
    }

    /// Cancel the run. Any in-flight generation result is discarded by
    /// the caller; no further turns will be accepted.
    pub fn cancel(&mut self, reason: &str) -> Result<(), DebateError> {
        if self.session.is_complete() {
            return Err(DebateError::AlreadyComplete);
        }
        self.cancelled = true;
        self.session
            .cancel(reason)
            .map_err(|e| DebateError::TransitionFailed(e.to_string()))
    }

    /// Whether the debate has terminated.
    pub fn is_complete(&self) -> bool {
        self.session.is_complete()
    }

    /// Whether the run is still active.
    pub fn is_active(&self) -> bool {
        self.session.active
    }

    /// Current round number.
    pub fn current_round(&self) -> u32 {
        self.session.current_round
    }

    /// The last directive the arbiter issued, if any.
    pub fn last_directive(&self) -> Option<Directive> {
        self.session.last_directive
    }

    /// Read-only transcript snapshot.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Read-only session state.
    pub fn session(&self) -> &DebateSession {
        &self.session
    }

    /// Terminal snapshot (only available after completion).
    pub fn outcome(&self) -> Option<DebateOutcome> {
        if !self.session.is_complete() {
            return None;
        }
        Some(DebateOutcome {
            consensus_reached: self.session.last_directive == Some(Directive::Consensus)
                && !self.cancelled,
            cancelled: self.cancelled,
            rounds_completed: self.session.current_round,
            cycles_completed: self.session.cycles_completed,
            turn_count: self.transcript.len(),
            transcript: self.transcript.clone(),
            session: self.session.clone(),
        })
    }
}

impl Default for DebateOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(agent: AgentRole, round: u32) -> Turn {
        Turn::new(agent, format!("{agent} says things"), round)
    }

    fn arbiter_turn(round: u32, directive: Directive) -> Turn {
        Turn::arbiter("critique", round, directive)
    }

    /// Run one full cycle ending with the given directive.
    fn run_cycle(orch: &mut DebateOrchestrator, directive: Directive) -> NextAction {
        let round = orch.current_round();
        orch.submit_turn(turn(AgentRole::Architect, round)).unwrap();
        orch.submit_turn(turn(AgentRole::Destroyer, round)).unwrap();
        orch.submit_turn(arbiter_turn(round, directive)).unwrap()
    }

    #[test]
    fn test_initial_expectation() {
        let orch = DebateOrchestrator::new();
        assert_eq!(orch.expected_agent(), Some(AgentRole::Architect));
        assert_eq!(orch.current_round(), 1);
        assert!(orch.outcome().is_none());
    }

    #[test]
    fn test_rotation_order() {
        let mut orch = DebateOrchestrator::new();
        let next = orch.submit_turn(turn(AgentRole::Architect, 1)).unwrap();
        assert_eq!(next, NextAction::Await(AgentRole::Destroyer));
        let next = orch.submit_turn(turn(AgentRole::Destroyer, 1)).unwrap();
        assert_eq!(next, NextAction::Await(AgentRole::Arbiter));
    }

    #[test]
    fn test_consensus_at_round_three_yields_nine_turns() {
        let mut orch = DebateOrchestrator::new();
        assert_eq!(
            run_cycle(&mut orch, Directive::Continue),
            NextAction::Await(AgentRole::Architect)
        );
        assert_eq!(
            run_cycle(&mut orch, Directive::Continue),
            NextAction::Await(AgentRole::Architect)
        );
        assert_eq!(run_cycle(&mut orch, Directive::Consensus), NextAction::Synthesize);

        let outcome = orch.outcome().unwrap();
        assert!(outcome.consensus_reached);
        assert!(!outcome.cancelled);
        assert_eq!(outcome.rounds_completed, 3);
        assert_eq!(outcome.turn_count, 9);
    }

    #[test]
    fn test_safety_cap_with_perpetual_continue() {
        let mut orch = DebateOrchestrator::new();
        let mut turns = 0usize;
        loop {
            let next = run_cycle(&mut orch, Directive::Continue);
            turns += 3;
            if next == NextAction::Synthesize {
                break;
            }
            assert!(turns < 3 * 5, "run must terminate within the cap");
        }

        let outcome = orch.outcome().unwrap();
        assert!(!outcome.consensus_reached);
        assert!(!outcome.session.active);
        assert_eq!(outcome.turn_count, 15);
        assert_eq!(outcome.rounds_completed, 5);
    }

    #[test]
    fn test_veto_repeats_round() {
        let mut orch = DebateOrchestrator::new();
        let next = run_cycle(&mut orch, Directive::Veto);
        assert_eq!(next, NextAction::Await(AgentRole::Architect));
        assert_eq!(orch.current_round(), 1);
        assert_eq!(orch.last_directive(), Some(Directive::Veto));

        // The repeated cycle appends fresh turns for the same round.
        run_cycle(&mut orch, Directive::Continue);
        assert_eq!(orch.current_round(), 2);
        assert_eq!(orch.transcript().len(), 6);
    }

    #[test]
    fn test_bounded_termination_under_perpetual_veto() {
        let mut orch = DebateOrchestrator::new();
        let mut turns = 0usize;
        loop {
            let next = run_cycle(&mut orch, Directive::Veto);
            turns += 3;
            assert!(turns <= 3 * 5);
            if next == NextAction::Synthesize {
                break;
            }
        }
        let outcome = orch.outcome().unwrap();
        assert_eq!(outcome.rounds_completed, 1);
        assert_eq!(outcome.cycles_completed, 5);
        assert!(!outcome.consensus_reached);
    }

    #[test]
    fn test_mece_check_advances_round() {
        let mut orch = DebateOrchestrator::new();
        run_cycle(&mut orch, Directive::MeceCheck);
        assert_eq!(orch.current_round(), 2);
        assert_eq!(orch.last_directive(), Some(Directive::MeceCheck));
    }

    #[test]
    fn test_wrong_agent_rejected() {
        let mut orch = DebateOrchestrator::new();
        let err = orch.submit_turn(turn(AgentRole::Destroyer, 1)).unwrap_err();
        assert_eq!(
            err,
            DebateError::WrongAgent {
                expected: AgentRole::Architect,
                actual: AgentRole::Destroyer,
            }
        );
        // Rejected turns are not appended.
        assert!(orch.transcript().is_empty());
    }

    #[test]
    fn test_round_mismatch_rejected() {
        let mut orch = DebateOrchestrator::new();
        let err = orch.submit_turn(turn(AgentRole::Architect, 2)).unwrap_err();
        assert!(matches!(err, DebateError::RoundMismatch { expected: 1, actual: 2 }));
    }

    #[test]
    fn test_submit_after_terminal_rejected() {
        let mut orch = DebateOrchestrator::new();
        run_cycle(&mut orch, Directive::Consensus);
        let err = orch.submit_turn(turn(AgentRole::Architect, 1)).unwrap_err();
        assert_eq!(err, DebateError::AlreadyComplete);
        // Transcript unchanged after termination.
        assert_eq!(orch.transcript().len(), 3);
    }

    #[test]
    fn test_cancel_discards_run() {
        let mut orch = DebateOrchestrator::new();
        orch.submit_turn(turn(AgentRole::Architect, 1)).unwrap();
        orch.cancel("user navigated away").unwrap();

        assert!(!orch.is_active());
        let outcome = orch.outcome().unwrap();
        assert!(outcome.cancelled);
        assert!(!outcome.consensus_reached);
        assert_eq!(outcome.turn_count, 1);

        assert_eq!(orch.cancel("again").unwrap_err(), DebateError::AlreadyComplete);
    }

    #[test]
    fn test_arbiter_turn_without_directive_is_continue() {
        let mut orch = DebateOrchestrator::new();
        orch.submit_turn(turn(AgentRole::Architect, 1)).unwrap();
        orch.submit_turn(turn(AgentRole::Destroyer, 1)).unwrap();

        // A plain arbiter turn (directive None) advances the round.
        let next = orch
            .submit_turn(Turn::new(AgentRole::Arbiter, "no tag emitted", 1))
            .unwrap();
        assert_eq!(next, NextAction::Await(AgentRole::Architect));
        assert_eq!(orch.current_round(), 2);
    }

    #[test]
    fn test_transcript_append_only_across_transitions() {
        let mut orch = DebateOrchestrator::new();
        run_cycle(&mut orch, Directive::Veto);
        let before: Vec<String> = orch
            .transcript()
            .turns()
            .iter()
            .map(|t| t.text.clone())
            .collect();

        run_cycle(&mut orch, Directive::Consensus);

        let after = orch.transcript().turns();
        assert_eq!(after.len(), 6);
        for (i, text) in before.iter().enumerate() {
            assert_eq!(&after[i].text, text);
        }
    }

    #[test]
    fn test_next_action_display() {
        assert_eq!(
            NextAction::Await(AgentRole::Arbiter).to_string(),
            "await_arbiter"
        );
        assert_eq!(NextAction::Synthesize.to_string(), "synthesize");
    }

    #[test]
    fn test_debate_config_default() {
        assert_eq!(DebateConfig::default().max_rounds, 5);
    }
}
