//! End-to-end engine tests against a scripted gateway.
//!
//! The fake gateway answers from a fixed script keyed on action and
//! role, so whole engagements run deterministically with virtual time.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use deliberation::{AgentRole, EventBus};
use tokio_util::sync::CancellationToken;
use warroom_agents::{Action, Engine, EngineConfig, Gateway, GatewayRequest, IntakeData};

/// Scripted gateway: fixed research/synthesis text, arbiter verdicts
/// consumed in order (the last one repeats), counters on everything.
struct ScriptedGateway {
    verdicts: Vec<&'static str>,
    fail_all: bool,
    calls: AtomicU32,
    research_calls: AtomicU32,
    synthesis_calls: AtomicU32,
    arbiter_calls: AtomicU32,
}

impl ScriptedGateway {
    fn new(verdicts: Vec<&'static str>) -> Self {
        Self {
            verdicts,
            fail_all: false,
            calls: AtomicU32::new(0),
            research_calls: AtomicU32::new(0),
            synthesis_calls: AtomicU32::new(0),
            arbiter_calls: AtomicU32::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new(vec![])
        }
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn generate(&self, request: GatewayRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all {
            return Err(anyhow!("429 rate limited; retryDelay: 1s"));
        }
        match request.action {
            Action::Research => {
                self.research_calls.fetch_add(1, Ordering::SeqCst);
                Ok("Market brief: crowded space, weak retention.".to_string())
            }
            Action::Synthesis => {
                self.synthesis_calls.fetch_add(1, Ordering::SeqCst);
                Ok("FINAL REPORT".to_string())
            }
            Action::Debate => {
                if request.role == Some(AgentRole::Arbiter) {
                    let i = self.arbiter_calls.fetch_add(1, Ordering::SeqCst) as usize;
                    let verdict = self.verdicts[i.min(self.verdicts.len() - 1)];
                    Ok(verdict.to_string())
                } else {
                    Ok(format!("Position for round {}.", request.round.unwrap_or(0)))
                }
            }
        }
    }
}

fn fast_config(max_rounds: u32, retries: u32) -> EngineConfig {
    EngineConfig {
        max_rounds,
        cooldown_secs: 1,
        retries,
        research_base_delay_secs: 1,
        debate_base_delay_secs: 1,
        synthesis_base_delay_secs: 1,
        ..EngineConfig::default()
    }
}

fn intake() -> IntakeData {
    IntakeData {
        company_one_liner: "B2B analytics for florists".to_string(),
        core_problem: "churn after month two".to_string(),
        ..IntakeData::default()
    }
}

#[tokio::test(start_paused = true)]
async fn consensus_at_round_three_yields_nine_turns_and_one_synthesis() {
    let gateway = Arc::new(ScriptedGateway::new(vec![
        "Keep going. [CONTINUE]",
        "Closer. [CONTINUE]",
        "Agreed on the wedge. [CONSENSUS GRANTED]",
    ]));

    let engine = Engine::new(gateway.clone(), fast_config(5, 0), EventBus::new().shared());
    let report = engine
        .run(intake(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.outcome.consensus_reached);
    assert_eq!(report.outcome.turn_count, 9);
    assert_eq!(report.outcome.rounds_completed, 3);
    assert_eq!(report.report.as_deref(), Some("FINAL REPORT"));
    assert_eq!(gateway.research_calls.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.synthesis_calls.load(Ordering::SeqCst), 1);

    // Rounds never decrease across the transcript.
    let rounds: Vec<u32> = report
        .outcome
        .transcript
        .turns()
        .iter()
        .map(|t| t.round)
        .collect();
    assert!(rounds.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn perpetual_continue_hits_safety_cap_at_fifteen_turns() {
    let gateway = Arc::new(ScriptedGateway::new(vec!["Not yet. [CONTINUE]"]));

    let engine = Engine::new(gateway.clone(), fast_config(5, 0), EventBus::new().shared());
    let report = engine
        .run(intake(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.outcome.consensus_reached);
    assert_eq!(report.outcome.turn_count, 15);
    assert_eq!(report.outcome.cycles_completed, 5);
    assert!(!report.outcome.session.active);
    // A capped debate is not a cancelled one; synthesis still runs.
    assert_eq!(gateway.synthesis_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn perpetual_veto_still_terminates_within_budget() {
    let gateway = Arc::new(ScriptedGateway::new(vec!["Fatal flaw. [VETO]"]));

    let engine = Engine::new(gateway.clone(), fast_config(3, 0), EventBus::new().shared());
    let report = engine
        .run(intake(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.outcome.consensus_reached);
    assert_eq!(report.outcome.turn_count, 9); // 3 * max_rounds
    // Every vetoed cycle re-ran round one.
    assert_eq!(report.outcome.rounds_completed, 1);
}

#[tokio::test(start_paused = true)]
async fn failing_gateway_retries_exactly_then_degrades() {
    let gateway = Arc::new(ScriptedGateway::failing());
    let retries = 2;

    let engine = Engine::new(
        gateway.clone(),
        fast_config(1, retries),
        EventBus::new().shared(),
    );
    let report = engine
        .run(intake(), &CancellationToken::new())
        .await
        .unwrap();

    // One research + three debate turns + one synthesis, each making
    // retries + 1 attempts before falling back.
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 5 * (retries + 1));
    assert!(!report.outcome.consensus_reached);
    assert_eq!(report.outcome.turn_count, 3);
    assert_eq!(
        report.research,
        "Market intelligence unavailable due to connection limits. Proceeding with internal logic models."
    );
    assert_eq!(
        report.report.as_deref(),
        Some("Final report generation failed due to API limits. Please review the debate logs above manually.")
    );
}

#[tokio::test(start_paused = true)]
async fn arbiter_tags_are_stripped_from_the_transcript() {
    let gateway = Arc::new(ScriptedGateway::new(vec![
        "Both positions hold. [CONSENSUS GRANTED]",
    ]));

    let engine = Engine::new(gateway, fast_config(5, 0), EventBus::new().shared());
    let report = engine
        .run(intake(), &CancellationToken::new())
        .await
        .unwrap();

    let arbiter_turn = report
        .outcome
        .transcript
        .turns()
        .iter()
        .find(|t| t.agent == AgentRole::Arbiter)
        .unwrap();
    assert_eq!(arbiter_turn.text, "Both positions hold.");
    assert!(!arbiter_turn.text.contains('['));
}

#[tokio::test(start_paused = true)]
async fn debate_requests_carry_history_and_last_verdict() {
    // Two cycles: the second architect request must see the first
    // cycle's three turns and the arbiter's last command.
    struct InspectingGateway {
        inner: ScriptedGateway,
        saw_history_with_verdict: AtomicU32,
    }

    #[async_trait]
    impl Gateway for InspectingGateway {
        async fn generate(&self, request: GatewayRequest) -> Result<String> {
            if request.action == Action::Debate
                && request.role == Some(AgentRole::Architect)
                && request.round == Some(2)
            {
                assert_eq!(request.history.as_ref().map(Vec::len), Some(3));
                assert_eq!(request.last_arbiter_command.as_deref(), Some("mece_check"));
                self.saw_history_with_verdict.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.generate(request).await
        }
    }

    let gateway = Arc::new(InspectingGateway {
        inner: ScriptedGateway::new(vec![
            "Overlapping options. [MECE CHECK]",
            "Clean now. [CONSENSUS GRANTED]",
        ]),
        saw_history_with_verdict: AtomicU32::new(0),
    });

    let engine = Engine::new(gateway.clone(), fast_config(5, 0), EventBus::new().shared());
    let report = engine
        .run(intake(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.outcome.consensus_reached);
    assert_eq!(report.outcome.turn_count, 6);
    assert_eq!(gateway.saw_history_with_verdict.load(Ordering::SeqCst), 1);
}
